use crate::shared::errors::{AppError, AppResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s/]+@[^@\s/]+\.[^@\s/]+$").expect("メールアドレスの正規表現が不正です")
});

/// 認証済みアカウントの識別子（メールアドレス）
///
/// `Users/{accountId}` ドキュメントのキーとしてそのまま使う。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// メールアドレスからアカウント識別子を作成する
    ///
    /// 前後の空白は取り除く。大文字小文字はIDプロバイダーの値をそのまま保持する。
    pub fn new(email: impl AsRef<str>) -> AppResult<Self> {
        let email = email.as_ref().trim();
        if email.is_empty() {
            return Err(AppError::validation("メールアドレスを入力してください"));
        }
        if !EMAIL_PATTERN.is_match(email) {
            return Err(AppError::validation(format!(
                "メールアドレスの形式が正しくありません: {email}"
            )));
        }
        Ok(Self(email.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AccountId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccountId> for String {
    fn from(value: AccountId) -> Self {
        value.0
    }
}
