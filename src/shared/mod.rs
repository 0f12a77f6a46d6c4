/// 共有エラー型とエラーハンドリング
pub mod errors;

/// 共有設定管理
pub mod config;

/// ドキュメントストアの抽象化
pub mod document_store;

/// HTTP版ドキュメントストア
pub mod api_client;

// 便利な再エクスポート
pub use api_client::HttpDocumentStore;
pub use config::{
    get_environment, initialize_application, initialize_logging_system,
    load_environment_variables, Environment, EnvironmentConfig, InitializationResult, StoreConfig,
};
pub use document_store::{DocumentStore, FieldPath, InMemoryDocumentStore};
pub use errors::{AppError, AppResult, ErrorSeverity};
