/// 環境設定
pub mod environment;

/// 起動時初期化
pub mod initialization;

pub use environment::{
    get_environment, initialize_logging_system, load_environment_variables, Environment,
    EnvironmentConfig, StoreConfig, SERVICES_COLLECTION, USERS_COLLECTION,
};
pub use initialization::{initialize_application, log_initialization_complete, InitializationResult};
