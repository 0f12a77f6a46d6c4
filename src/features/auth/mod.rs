/// 認証機能モジュール
///
/// IDプロバイダー本体は外部サービスに任せ、このモジュールでは
/// ユーザードキュメントのキーとなるアカウント識別子のみを扱う。
pub mod models;

pub use models::AccountId;
