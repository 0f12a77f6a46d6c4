/// 機能別モジュール
///
/// 各機能モジュールは、その機能に関連するモデル・データ操作・サービス・画面状態を
/// 含む自己完結型のユニットです。
pub mod auth;
pub mod catalog;
pub mod subscriptions;
