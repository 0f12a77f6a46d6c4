use super::environment::{
    get_environment, initialize_logging_system, load_environment_variables, Environment,
    StoreConfig,
};
use crate::shared::errors::AppResult;

/// アプリケーション初期化の結果を表す構造体
#[derive(Debug)]
pub struct InitializationResult {
    /// 実行環境
    pub environment: Environment,
    /// ドキュメントストア接続設定
    pub store_config: StoreConfig,
}

/// アプリケーションの初期化を実行する
///
/// # 処理内容
/// 1. 環境に応じた.envファイルの読み込み
/// 2. ログシステムの初期化
/// 3. ドキュメントストア設定の読み込みと検証
pub fn initialize_application() -> AppResult<InitializationResult> {
    load_environment_variables();
    initialize_logging_system();

    let environment = get_environment();
    let store_config = StoreConfig::from_env().map_err(|e| {
        log::error!("ドキュメントストア設定の読み込みに失敗しました: {e}");
        e
    })?;

    let result = InitializationResult {
        environment,
        store_config,
    };
    log_initialization_complete(&result);
    Ok(result)
}

/// 初期化完了ログを出力する
pub fn log_initialization_complete(result: &InitializationResult) {
    log::info!("=== 初期化完了 ===");
    log::info!("環境: {:?}", result.environment);
    log::info!("ドキュメントストア: {}", result.store_config.base_url);
}
