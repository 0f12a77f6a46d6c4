pub mod features;
pub mod shared;

use features::subscriptions::{EditNotifier, SubscriptionService};
use log::info;
use shared::{HttpDocumentStore, StoreConfig};
use std::sync::Arc;

pub use features::auth::AccountId;
pub use features::catalog::{CatalogEntry, Plan, Service};
pub use features::subscriptions::{
    DashboardViewModel, FetchOutcome, ServiceSummary, SortPolicy, SubscriptionListViewModel,
    SubscriptionRecord, SummaryDisplay,
};
pub use shared::{AppError, AppResult, DocumentStore, InMemoryDocumentStore};

/// 環境変数・ログを初期化し、HTTP版ストアに接続したサービスを返す
///
/// # 戻り値
/// サブスクリプションサービス、または設定不備の場合はエラー
pub fn initialize() -> AppResult<SubscriptionService<HttpDocumentStore>> {
    let result = shared::initialize_application()?;
    connect(result.store_config)
}

/// 設定を指定してHTTP版ストアに接続したサービスを作成する
pub fn connect(config: StoreConfig) -> AppResult<SubscriptionService<HttpDocumentStore>> {
    let store = HttpDocumentStore::new_with_config(config)?;
    info!("ドキュメントストアクライアントを作成しました");
    Ok(SubscriptionService::new(Arc::new(store), EditNotifier::new()))
}
