/// HTTP版ドキュメントストア
///
/// ホスティングされたドキュメントデータベースのREST APIと通信する。
/// リトライは行わず、1回の失敗をそのまま呼び出し元へ返す。
use crate::shared::config::StoreConfig;
use crate::shared::document_store::{DocumentStore, FieldPath};
use crate::shared::errors::{AppError, AppResult};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// ドキュメント取得レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// ドキュメント一覧取得レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ListDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<DocumentResponse>,
}

/// フィールド書き込み1件
#[derive(Debug, Serialize)]
pub struct FieldWrite {
    pub path: FieldPath,
    pub value: Value,
}

/// 部分更新リクエスト
#[derive(Debug, Default, Serialize)]
pub struct PatchRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub set: Vec<FieldWrite>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub delete: Vec<FieldPath>,
}

/// ストアからのエラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// HTTPステータスとレスポンスボディから通信エラーを作る
pub fn status_error(status: u16, body: &str) -> AppError {
    if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(body) {
        debug!(
            "構造化エラーレスポンスを受信: code={}, message={}",
            error_response.error.code, error_response.error.message
        );
        return AppError::transport(format!(
            "status={status} {} - {}",
            error_response.error.code, error_response.error.message
        ));
    }

    let reason = match status {
        400 => "リクエストの形式が正しくありません",
        401 => "認証に失敗しました。再度ログインしてください",
        403 => "この操作を実行する権限がありません",
        404 => "指定されたドキュメントが見つかりません",
        429 => "リクエストが多すぎます。しばらく待ってから再試行してください",
        500 => "サーバー内部エラーが発生しました",
        503 => "ストアが一時的に利用できません",
        504 => "ストアからの応答がタイムアウトしました",
        _ => "不明なエラーが発生しました",
    };
    warn!("非構造化エラーレスポンス: status={status}, body={body}");
    AppError::transport(format!("status={status} {reason}"))
}

/// URLのパスセグメントを組み立てる
pub fn build_url(base_url: &str, segments: &[&str]) -> String {
    let mut url = base_url.trim_end_matches('/').to_string();
    for segment in segments {
        url.push('/');
        url.push_str(&urlencoding::encode(segment));
    }
    url
}

/// PATCHで行う操作の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOperation {
    Set,
    Delete,
}

/// PATCHのレスポンスがドキュメント未発見を意味するか
///
/// 書き込みはドキュメントを作成するため、404を未発見として扱うのは削除のみ。
pub fn is_missing_document(status: StatusCode, operation: PatchOperation) -> bool {
    status == StatusCode::NOT_FOUND && operation == PatchOperation::Delete
}

/// HTTP版ドキュメントストア
pub struct HttpDocumentStore {
    client: Client,
    config: StoreConfig,
}

impl HttpDocumentStore {
    /// 設定を指定してストアクライアントを作成
    pub fn new_with_config(config: StoreConfig) -> AppResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::configuration(format!("HTTPクライアント初期化失敗: {e}")))?;

        Ok(Self { client, config })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(token) => request.header("Authorization", format!("Bearer {token}")),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, method: &str, url: &str) -> AppResult<Response> {
        debug!("{method}リクエスト送信: url={url}");
        self.authorize(request).send().await.map_err(|e| {
            warn!("{method}リクエスト失敗: url={url}, error={e}");
            AppError::from(e)
        })
    }

    async fn error_from(response: Response) -> AppError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "レスポンス読み取り失敗".to_string());
        status_error(status, &body)
    }

    async fn patch(
        &self,
        collection: &str,
        id: &str,
        operation: PatchOperation,
        body: &PatchRequest,
    ) -> AppResult<()> {
        let url = build_url(&self.config.base_url, &[collection, id]);
        let response = self
            .send(self.client.patch(&url).json(body), "PATCH", &url)
            .await?;

        match response.status() {
            status if status.is_success() => {
                info!("PATCHリクエスト成功: {collection}/{id}");
                Ok(())
            }
            status if is_missing_document(status, operation) => {
                Err(AppError::document_not_found(collection, id))
            }
            _ => Err(Self::error_from(response).await),
        }
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn get_document(&self, collection: &str, id: &str) -> AppResult<Option<Value>> {
        let url = build_url(&self.config.base_url, &[collection, id]);
        let response = self.send(self.client.get(&url), "GET", &url).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let document: DocumentResponse = response.json().await.map_err(|e| {
                    AppError::transport(format!("レスポンス解析エラー: {e}"))
                })?;
                info!("GETリクエスト成功: {collection}/{id}");
                Ok(Some(Value::Object(document.fields)))
            }
            _ => Err(Self::error_from(response).await),
        }
    }

    async fn list_documents(&self, collection: &str) -> AppResult<Vec<(String, Value)>> {
        let url = build_url(&self.config.base_url, &[collection]);
        let response = self.send(self.client.get(&url), "GET", &url).await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let list: ListDocumentsResponse = response
            .json()
            .await
            .map_err(|e| AppError::transport(format!("レスポンス解析エラー: {e}")))?;
        info!("一覧取得成功: {collection}, count={}", list.documents.len());

        Ok(list
            .documents
            .into_iter()
            .map(|document| (document.id, Value::Object(document.fields)))
            .collect())
    }

    async fn set_field(
        &self,
        collection: &str,
        id: &str,
        path: &FieldPath,
        value: Value,
    ) -> AppResult<()> {
        if path.is_empty() {
            return Err(AppError::validation("フィールドパスが空です"));
        }
        let body = PatchRequest {
            set: vec![FieldWrite {
                path: path.clone(),
                value,
            }],
            ..PatchRequest::default()
        };
        self.patch(collection, id, PatchOperation::Set, &body).await
    }

    async fn delete_field(&self, collection: &str, id: &str, path: &FieldPath) -> AppResult<()> {
        if path.is_empty() {
            return Err(AppError::validation("フィールドパスが空です"));
        }
        let body = PatchRequest {
            delete: vec![path.clone()],
            ..PatchRequest::default()
        };
        self.patch(collection, id, PatchOperation::Delete, &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_url_encodes_segments() {
        assert_eq!(
            build_url("https://store.example.com/v1/", &["Users", "user@example.com"]),
            "https://store.example.com/v1/Users/user%40example.com"
        );
        assert_eq!(
            build_url("https://store.example.com", &["Services", "Disney+ Hotstar"]),
            "https://store.example.com/Services/Disney%2B%20Hotstar"
        );
    }

    #[test]
    fn test_patch_request_serialization() {
        let set = PatchRequest {
            set: vec![FieldWrite {
                path: FieldPath::new(["Subscriptions", "Netflix"]),
                value: json!({"PlanName": "Premium"}),
            }],
            ..PatchRequest::default()
        };
        assert_eq!(
            serde_json::to_value(&set).unwrap(),
            json!({"set": [{"path": ["Subscriptions", "Netflix"], "value": {"PlanName": "Premium"}}]})
        );

        let delete = PatchRequest {
            delete: vec![FieldPath::new(["Subscriptions", "Netflix"])],
            ..PatchRequest::default()
        };
        assert_eq!(
            serde_json::to_value(&delete).unwrap(),
            json!({"delete": [["Subscriptions", "Netflix"]]})
        );
    }

    #[test]
    fn test_document_response_defaults() {
        let response: DocumentResponse = serde_json::from_str(r#"{"id": "a@example.com"}"#).unwrap();
        assert!(response.fields.is_empty());

        let list: ListDocumentsResponse = serde_json::from_str("{}").unwrap();
        assert!(list.documents.is_empty());
    }

    #[test]
    fn test_status_error() {
        let structured = status_error(
            403,
            r#"{"error": {"code": "PERMISSION_DENIED", "message": "denied"}}"#,
        );
        assert!(matches!(structured, AppError::Transport(ref m) if m.contains("PERMISSION_DENIED")));

        let plain = status_error(401, "unauthorized");
        assert!(matches!(plain, AppError::Transport(ref m) if m.contains("status=401")));
    }

    #[test]
    fn test_patch_not_found_depends_on_operation() {
        assert!(is_missing_document(StatusCode::NOT_FOUND, PatchOperation::Delete));
        // 書き込みの404は通信エラーとして扱う
        assert!(!is_missing_document(StatusCode::NOT_FOUND, PatchOperation::Set));
        assert!(!is_missing_document(StatusCode::FORBIDDEN, PatchOperation::Delete));
        assert!(matches!(status_error(404, ""), AppError::Transport(ref m) if m.contains("status=404")));
    }

    #[test]
    fn test_new_with_invalid_config() {
        let config = StoreConfig {
            base_url: String::new(),
            timeout_seconds: 30,
            api_key: None,
        };
        assert!(matches!(
            HttpDocumentStore::new_with_config(config),
            Err(AppError::Configuration(_))
        ));
    }
}
