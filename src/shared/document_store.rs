//! リモートドキュメントストアの抽象化
//!
//! ユーザードキュメント・サービスカタログはすべてこのトレイト経由で読み書きする。
//! 本番ではHTTP実装（`api_client::HttpDocumentStore`）、テストとローカル開発では
//! メモリ実装（`InMemoryDocumentStore`）を使う。

use crate::shared::errors::{AppError, AppResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// ドキュメント内のフィールドパス（例: `Subscriptions` → `Netflix`）
///
/// セグメントにドットを含むサービス名も扱えるよう、文字列連結ではなく配列で保持する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// セグメント列からフィールドパスを作成する
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// リモートドキュメントストアのインターフェース
///
/// すべての操作は1回のラウンドトリップで完結し、リトライは行わない。
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// ドキュメントを取得する。存在しない場合は`Ok(None)`
    async fn get_document(&self, collection: &str, id: &str) -> AppResult<Option<Value>>;

    /// コレクション内の全ドキュメントを`(id, 内容)`で取得する
    async fn list_documents(&self, collection: &str) -> AppResult<Vec<(String, Value)>>;

    /// フィールドをマージ書き込みする
    ///
    /// ドキュメントや途中のマップが存在しない場合は作成する。
    async fn set_field(
        &self,
        collection: &str,
        id: &str,
        path: &FieldPath,
        value: Value,
    ) -> AppResult<()>;

    /// フィールドを削除する
    ///
    /// ドキュメントが存在しない場合は`DocumentNotFound`。
    /// フィールドが既に無い場合は成功扱い。
    async fn delete_field(&self, collection: &str, id: &str, path: &FieldPath) -> AppResult<()>;
}

#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    async fn get_document(&self, collection: &str, id: &str) -> AppResult<Option<Value>> {
        (**self).get_document(collection, id).await
    }

    async fn list_documents(&self, collection: &str) -> AppResult<Vec<(String, Value)>> {
        (**self).list_documents(collection).await
    }

    async fn set_field(
        &self,
        collection: &str,
        id: &str,
        path: &FieldPath,
        value: Value,
    ) -> AppResult<()> {
        (**self).set_field(collection, id, path, value).await
    }

    async fn delete_field(&self, collection: &str, id: &str, path: &FieldPath) -> AppResult<()> {
        (**self).delete_field(collection, id, path).await
    }
}

/// JSONオブジェクトの指定パスに値を書き込む（途中のマップは作成・上書きする）
pub fn set_at_path(document: &mut Map<String, Value>, path: &FieldPath, value: Value) -> AppResult<()> {
    let Some((last, parents)) = path.segments().split_last() else {
        return Err(AppError::validation("フィールドパスが空です"));
    };

    let mut current = document;
    for segment in parents {
        let entry = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        current = entry.as_object_mut().ok_or_else(|| {
            AppError::malformed_field(format!("{path} の途中のフィールドがオブジェクトではありません"))
        })?;
    }

    current.insert(last.clone(), value);
    Ok(())
}

/// JSONオブジェクトの指定パスの値を削除する。削除した場合はtrue
pub fn remove_at_path(document: &mut Map<String, Value>, path: &FieldPath) -> bool {
    let Some((last, parents)) = path.segments().split_last() else {
        return false;
    };

    let mut current = document;
    for segment in parents {
        match current.get_mut(segment) {
            Some(Value::Object(map)) => current = map,
            _ => return false,
        }
    }

    current.remove(last).is_some()
}

/// メモリ上のドキュメントストア
///
/// テストとローカル開発用。障害注入と遅延の設定ができる。
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    inner: Arc<InMemoryDocumentStoreInner>,
}

#[derive(Default)]
struct InMemoryDocumentStoreInner {
    collections: RwLock<HashMap<String, HashMap<String, Map<String, Value>>>>,
    pending_failures: AtomicUsize,
    latency_ms: AtomicUsize,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// ドキュメントを丸ごと登録する（テスト用）
    ///
    /// オブジェクト以外の値は`MalformedField`。
    pub fn seed_document(&self, collection: &str, id: &str, document: Value) -> AppResult<()> {
        let Value::Object(map) = document else {
            return Err(AppError::malformed_field(format!(
                "{collection}/{id} のドキュメントはオブジェクトである必要があります"
            )));
        };

        let mut collections = self.write_lock()?;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), map);
        Ok(())
    }

    /// 現在のドキュメント内容を取得する（テスト用）
    pub fn document(&self, collection: &str, id: &str) -> Option<Value> {
        let collections = self.inner.collections.read().ok()?;
        collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|map| Value::Object(map.clone()))
    }

    /// 次のn回の操作を通信エラーにする（テスト用）
    pub fn fail_next_operations(&self, count: usize) {
        self.inner.pending_failures.store(count, Ordering::SeqCst);
    }

    /// 各操作に遅延を入れる（テスト用）
    pub fn set_latency(&self, latency: Duration) {
        self.inner
            .latency_ms
            .store(latency.as_millis() as usize, Ordering::SeqCst);
    }

    async fn simulate_round_trip(&self, operation: &str) -> AppResult<()> {
        let latency_ms = self.inner.latency_ms.load(Ordering::SeqCst);
        if latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(latency_ms as u64)).await;
        }

        let injected = self
            .inner
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            log::debug!("障害注入により{operation}を失敗させます");
            return Err(AppError::transport(format!("{operation}: 接続に失敗しました")));
        }

        Ok(())
    }

    fn write_lock(
        &self,
    ) -> AppResult<std::sync::RwLockWriteGuard<'_, HashMap<String, HashMap<String, Map<String, Value>>>>>
    {
        self.inner
            .collections
            .write()
            .map_err(|e| AppError::concurrency(format!("ストアのロック取得に失敗: {e}")))
    }

    fn read_lock(
        &self,
    ) -> AppResult<std::sync::RwLockReadGuard<'_, HashMap<String, HashMap<String, Map<String, Value>>>>>
    {
        self.inner
            .collections
            .read()
            .map_err(|e| AppError::concurrency(format!("ストアのロック取得に失敗: {e}")))
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get_document(&self, collection: &str, id: &str) -> AppResult<Option<Value>> {
        self.simulate_round_trip("get_document").await?;

        let collections = self.read_lock()?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|map| Value::Object(map.clone())))
    }

    async fn list_documents(&self, collection: &str) -> AppResult<Vec<(String, Value)>> {
        self.simulate_round_trip("list_documents").await?;

        let collections = self.read_lock()?;
        let mut documents: Vec<(String, Value)> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, map)| (id.clone(), Value::Object(map.clone())))
                    .collect()
            })
            .unwrap_or_default();
        documents.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(documents)
    }

    async fn set_field(
        &self,
        collection: &str,
        id: &str,
        path: &FieldPath,
        value: Value,
    ) -> AppResult<()> {
        self.simulate_round_trip("set_field").await?;

        let mut collections = self.write_lock()?;
        let document = collections
            .entry(collection.to_string())
            .or_default()
            .entry(id.to_string())
            .or_default();
        set_at_path(document, path, value)
    }

    async fn delete_field(&self, collection: &str, id: &str, path: &FieldPath) -> AppResult<()> {
        self.simulate_round_trip("delete_field").await?;

        let mut collections = self.write_lock()?;
        let document = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| AppError::document_not_found(collection, id))?;

        if !remove_at_path(document, path) {
            log::debug!("削除対象のフィールドが存在しません: {collection}/{id} {path}");
        }
        Ok(())
    }
}
