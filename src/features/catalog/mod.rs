/// サービスカタログ機能モジュール
///
/// このモジュールは、サービスとプランのカタログに関する機能を提供します：
/// - サービス一覧の取得
/// - サービスごとのプラン一覧の取得
/// - ユーザー独自のサービス・プランの追加
pub mod models;
pub mod repository;

pub use models::{CatalogEntry, Plan, Service};

pub use repository::{add_custom_plan, add_custom_service, get_plans, list_services, load_catalog};
