use thiserror::Error;

/// アプリケーション全体で使用される統一エラー型
#[derive(Debug, Error)]
pub enum AppError {
    /// 対象ドキュメントが存在しない場合のエラー
    #[error("ドキュメントが見つかりません: {0}")]
    DocumentNotFound(String),

    /// フィールドの欠落・型不一致
    #[error("フィールド形式エラー: {0}")]
    MalformedField(String),

    /// ドキュメントストアとの通信エラー（ネットワーク・認証・権限）
    #[error("通信エラー: {0}")]
    Transport(String),

    /// バリデーション関連のエラー
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// 設定関連のエラー
    #[error("設定エラー: {0}")]
    Configuration(String),

    /// 並行処理関連のエラー
    #[error("並行処理エラー: {0}")]
    Concurrency(String),

    /// 画面の破棄などで処理が中断された
    #[error("処理が中断されました: {0}")]
    Cancelled(String),
}

/// エラーの重要度を表す列挙型
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorSeverity {
    /// 低重要度（ユーザー入力エラーなど）
    Low,
    /// 中重要度（外部サービス一時的エラーなど）
    Medium,
    /// 高重要度（設定エラーなど）
    High,
}

impl AppError {
    /// ユーザーに表示するためのフレンドリーなメッセージを取得
    ///
    /// 取得失敗系はすべて同じ汎用メッセージにまとめる。
    ///
    /// # 戻り値
    /// ユーザーに表示可能なエラーメッセージ
    pub fn user_message(&self) -> &str {
        match self {
            AppError::DocumentNotFound(_)
            | AppError::MalformedField(_)
            | AppError::Transport(_) => "データの取得・保存に失敗しました。しばらくしてから再度お試しください",
            AppError::Validation(msg) => msg,
            AppError::Configuration(_) => "設定エラーが発生しました",
            AppError::Concurrency(_) => "並行処理でエラーが発生しました",
            AppError::Cancelled(_) => "処理が中断されました",
        }
    }

    /// エラーの重要度を取得
    ///
    /// # 戻り値
    /// エラーの重要度レベル
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppError::DocumentNotFound(_) => ErrorSeverity::Medium,
            AppError::MalformedField(_) => ErrorSeverity::Low,
            AppError::Transport(_) => ErrorSeverity::Medium,
            AppError::Validation(_) => ErrorSeverity::Low,
            AppError::Configuration(_) => ErrorSeverity::High,
            AppError::Concurrency(_) => ErrorSeverity::High,
            AppError::Cancelled(_) => ErrorSeverity::Low,
        }
    }

    /// 中断による失敗かどうか
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppError::Cancelled(_))
    }

    /// バリデーションエラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `message` - バリデーションエラーメッセージ
    pub fn validation<S: Into<String>>(message: S) -> Self {
        AppError::Validation(message.into())
    }

    /// ドキュメント未発見エラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `collection` - コレクション名
    /// * `id` - ドキュメントID
    pub fn document_not_found(collection: &str, id: &str) -> Self {
        AppError::DocumentNotFound(format!("{collection}/{id}"))
    }

    /// フィールド形式エラーを作成するヘルパー関数
    pub fn malformed_field<S: Into<String>>(message: S) -> Self {
        AppError::MalformedField(message.into())
    }

    /// 通信エラーを作成するヘルパー関数
    pub fn transport<S: Into<String>>(message: S) -> Self {
        AppError::Transport(message.into())
    }

    /// 設定エラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `message` - 設定エラーメッセージ
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        AppError::Configuration(message.into())
    }

    /// 並行処理エラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `message` - 並行処理エラーメッセージ
    pub fn concurrency<S: Into<String>>(message: S) -> Self {
        AppError::Concurrency(message.into())
    }

    /// 中断エラーを作成するヘルパー関数
    pub fn cancelled<S: Into<String>>(operation: S) -> Self {
        AppError::Cancelled(operation.into())
    }
}

/// reqwest::ErrorからAppErrorへの変換
impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        AppError::Transport(error.to_string())
    }
}

/// Result型のエイリアス（アプリケーション全体で使用）
pub type AppResult<T> = Result<T, AppError>;
