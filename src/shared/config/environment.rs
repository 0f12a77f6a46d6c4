use crate::shared::errors::{AppError, AppResult};

/// 環境変数取得エラー
#[derive(Debug, Clone)]
pub struct EnvVarError {
    pub var_name: String,
    pub message: String,
}

impl std::fmt::Display for EnvVarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.var_name, self.message)
    }
}

/// 環境変数を取得する
///
/// 起動時の環境変数を優先し、見つからない場合はコンパイル時の値を使用する。
#[macro_export]
macro_rules! get_env_var {
    ($var_name:expr) => {{
        if let Ok(value) = std::env::var($var_name) {
            log::debug!("環境変数 {} を起動時の環境変数から取得しました", $var_name);
            Ok(value)
        } else if let Some(value) = option_env!($var_name) {
            log::debug!("環境変数 {} をコンパイル時の環境変数から取得しました", $var_name);
            Ok(value.to_string())
        } else {
            Err($crate::shared::config::environment::EnvVarError {
                var_name: $var_name.to_string(),
                message: format!(
                    "起動時の環境変数 {} もコンパイル時の環境変数も見つかりませんでした",
                    $var_name
                ),
            })
        }
    }};
}

/// 環境変数を取得する（デフォルト値付き）
#[macro_export]
macro_rules! get_env_var_or_default {
    ($var_name:expr, $default_value:expr) => {{
        $crate::get_env_var!($var_name).unwrap_or_else(|_| {
            log::debug!(
                "環境変数 {} が見つからないため、デフォルト値を使用します: {}",
                $var_name,
                $default_value
            );
            $default_value.to_string()
        })
    }};
}

/// ユーザードキュメントのコレクション名
pub const USERS_COLLECTION: &str = "Users";

/// サービスカタログのコレクション名
pub const SERVICES_COLLECTION: &str = "Services";

/// アプリケーションの実行環境を表す列挙型
#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    /// 開発環境
    Development,
    /// プロダクション環境
    Production,
}

/// 環境設定を管理する構造体
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    /// 実行環境
    pub environment: String,
    /// ログレベル
    pub log_level: String,
}

impl EnvironmentConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Self {
        let environment = get_environment();
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| {
            if environment == Environment::Development {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

        Self {
            environment: format!("{environment:?}").to_lowercase(),
            log_level,
        }
    }

    /// ログレベル文字列を`LevelFilter`に変換する
    pub fn level_filter(&self) -> log::LevelFilter {
        match self.log_level.to_lowercase().as_str() {
            "error" => log::LevelFilter::Error,
            "warn" => log::LevelFilter::Warn,
            "info" => log::LevelFilter::Info,
            "debug" => log::LevelFilter::Debug,
            "trace" => log::LevelFilter::Trace,
            _ => log::LevelFilter::Info,
        }
    }
}

/// 現在の実行環境を判定する
///
/// # 判定ロジック
/// 1. コンパイル時埋め込み環境変数を最優先
/// 2. 実行時環境変数 ENVIRONMENT を確認
/// 3. デバッグビルドの場合は Development
/// 4. リリースビルドの場合は Production
pub fn get_environment() -> Environment {
    if let Some(embedded_env) = option_env!("EMBEDDED_ENVIRONMENT") {
        let env = parse_environment(embedded_env);
        log::debug!("環境判定: コンパイル時埋め込み値を使用 -> {embedded_env} -> {env:?}");
        return env;
    }

    if let Ok(env_var) = std::env::var("ENVIRONMENT") {
        let env = parse_environment(&env_var);
        log::debug!("環境判定: 実行時環境変数を使用 -> {env_var} -> {env:?}");
        return env;
    }

    // フォールバック: ビルド設定に基づく判定
    let env = if cfg!(debug_assertions) {
        Environment::Development
    } else {
        Environment::Production
    };
    log::debug!(
        "環境判定: ビルド設定を使用 -> debug_assertions={} -> {env:?}",
        cfg!(debug_assertions)
    );
    env
}

fn parse_environment(value: &str) -> Environment {
    match value {
        "production" => Environment::Production,
        _ => Environment::Development,
    }
}

/// 環境に応じた.envファイルを読み込む
pub fn load_environment_variables() {
    if let Some(env) = option_env!("EMBEDDED_ENVIRONMENT") {
        log::info!("コンパイル時埋め込み環境設定を使用: {env}");
        return;
    }

    let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
    let env_file = env_file_for(&environment);

    log::info!("環境: {environment}, 読み込み対象: {env_file}");

    match dotenv::from_filename(env_file) {
        Ok(_) => {
            log::info!("{env_file}ファイルを読み込みました");
        }
        Err(_) => {
            // 環境固有のファイルがない場合は、デフォルトの.envを試行
            if env_file != ".env" && dotenv::dotenv().is_ok() {
                log::warn!("{env_file}が見つからないため、デフォルトの.envファイルを読み込みました");
            } else {
                log::warn!("環境変数ファイルが見つかりません。直接設定された環境変数を使用します。");
            }
        }
    }
}

/// 環境名から読み込む.envファイル名を決める
pub fn env_file_for(environment: &str) -> &'static str {
    match environment {
        "production" => ".env.production",
        _ => ".env",
    }
}

/// ログシステムを初期化する
///
/// 二重に初期化された場合は何もしない。
pub fn initialize_logging_system() {
    let env_config = EnvironmentConfig::from_env();

    let result = env_logger::Builder::from_default_env()
        .filter_level(env_config.level_filter())
        .format_timestamp_secs()
        .format_module_path(false)
        .format_target(false)
        .try_init();

    match result {
        Ok(()) => log::info!(
            "ログシステムを初期化しました: level={}, environment={}",
            env_config.log_level,
            env_config.environment
        ),
        Err(_) => log::debug!("ログシステムは既に初期化されています"),
    }
}

/// ドキュメントストア接続設定
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// ドキュメントストアのベースURL
    pub base_url: String,
    /// リクエストのタイムアウト（秒）
    pub timeout_seconds: u64,
    /// 認証トークン（任意）
    pub api_key: Option<String>,
}

impl StoreConfig {
    /// 環境変数からドキュメントストア設定を読み込む
    ///
    /// # エラー
    /// `DOCUMENT_STORE_URL` が未設定、またはタイムアウト値が不正な場合
    pub fn from_env() -> AppResult<Self> {
        log::debug!("StoreConfig::from_env() - 環境変数の読み込みを開始");

        let base_url = crate::get_env_var!("DOCUMENT_STORE_URL").map_err(|e| {
            log::error!("DOCUMENT_STORE_URLの取得に失敗しました: {e}");
            AppError::configuration("DOCUMENT_STORE_URLが設定されていません")
        })?;

        let raw_timeout = crate::get_env_var_or_default!("DOCUMENT_STORE_TIMEOUT_SECONDS", "30");
        let timeout_seconds = raw_timeout.parse().map_err(|_| {
            AppError::configuration(format!(
                "DOCUMENT_STORE_TIMEOUT_SECONDSが数値ではありません: {raw_timeout}"
            ))
        })?;

        let api_key = crate::get_env_var!("DOCUMENT_STORE_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        let config = Self {
            base_url,
            timeout_seconds,
            api_key,
        };
        config.validate()?;

        log::info!(
            "ドキュメントストア設定: base_url={}, timeout={}s, api_key={}",
            config.base_url,
            config.timeout_seconds,
            if config.api_key.is_some() { "設定済み" } else { "未設定" }
        );

        Ok(config)
    }

    /// 設定を検証する
    pub fn validate(&self) -> AppResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(AppError::configuration(
                "ドキュメントストアのベースURLが設定されていません",
            ));
        }

        url::Url::parse(&self.base_url).map_err(|e| {
            AppError::configuration(format!("ドキュメントストアのURLが不正です: {e}"))
        })?;

        if self.timeout_seconds == 0 {
            return Err(AppError::configuration(
                "タイムアウトは0より大きい値である必要があります",
            ));
        }

        Ok(())
    }
}
