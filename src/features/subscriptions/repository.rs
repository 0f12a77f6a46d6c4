use super::decode::{decode_subscriptions, encode_entry};
use super::models::{SubscriptionRecord, SUBSCRIPTIONS_FIELD};
use crate::features::auth::AccountId;
use crate::shared::config::USERS_COLLECTION;
use crate::shared::document_store::{DocumentStore, FieldPath};
use crate::shared::errors::{AppError, AppResult};
use log::{error, info};

/// ユーザードキュメント内のサブスクリプションのフィールドパス
pub fn subscription_path(service_name: &str) -> FieldPath {
    FieldPath::new([SUBSCRIPTIONS_FIELD, service_name])
}

/// ユーザーのサブスクリプション一覧を取得する
///
/// # 引数
/// * `store` - ドキュメントストア
/// * `account` - 所有アカウント
///
/// # 戻り値
/// サブスクリプション一覧、またはドキュメント欠落・形式不正・通信エラー
pub async fn find_all<S>(store: &S, account: &AccountId) -> AppResult<Vec<SubscriptionRecord>>
where
    S: DocumentStore + ?Sized,
{
    info!("サブスクリプション取得開始: account={account}");

    let document = store
        .get_document(USERS_COLLECTION, account.as_str())
        .await
        .map_err(|e| {
            error!("サブスクリプション取得失敗: account={account}, error={e}");
            e
        })?
        .ok_or_else(|| AppError::document_not_found(USERS_COLLECTION, account.as_str()))?;

    let records = decode_subscriptions(&document)?;

    info!(
        "サブスクリプション取得成功: account={account}, count={}",
        records.len()
    );
    Ok(records)
}

/// サブスクリプションを書き込む（同じサービス名があれば上書き）
pub async fn save<S>(store: &S, account: &AccountId, record: &SubscriptionRecord) -> AppResult<()>
where
    S: DocumentStore + ?Sized,
{
    store
        .set_field(
            USERS_COLLECTION,
            account.as_str(),
            &subscription_path(record.service_name()),
            encode_entry(record),
        )
        .await
        .map_err(|e| {
            error!(
                "サブスクリプション書き込み失敗: account={account}, service={}, error={e}",
                record.service_name()
            );
            e
        })
}

/// サブスクリプションを削除する
pub async fn delete<S>(store: &S, account: &AccountId, service_name: &str) -> AppResult<()>
where
    S: DocumentStore + ?Sized,
{
    store
        .delete_field(
            USERS_COLLECTION,
            account.as_str(),
            &subscription_path(service_name),
        )
        .await
        .map_err(|e| {
            error!("サブスクリプション削除失敗: account={account}, service={service_name}, error={e}");
            e
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::document_store::InMemoryDocumentStore;
    use serde_json::json;

    fn account() -> AccountId {
        AccountId::new("user@example.com").unwrap()
    }

    #[tokio::test]
    async fn test_find_all_missing_document() {
        let store = InMemoryDocumentStore::new();
        let result = find_all(&store, &account()).await;
        assert!(matches!(result, Err(AppError::DocumentNotFound(_))));
    }

    #[tokio::test]
    async fn test_find_all_without_subscriptions_field() {
        let store = InMemoryDocumentStore::new();
        store
            .seed_document("Users", "user@example.com", json!({"Name": "User"}))
            .unwrap();
        let result = find_all(&store, &account()).await;
        assert!(matches!(result, Err(AppError::MalformedField(_))));
    }

    #[tokio::test]
    async fn test_save_then_delete() {
        let store = InMemoryDocumentStore::new();
        let record = SubscriptionRecord::new("Netflix", "Premium", 15.99, 4).unwrap();

        save(&store, &account(), &record).await.unwrap();
        assert_eq!(find_all(&store, &account()).await.unwrap(), vec![record]);

        delete(&store, &account(), "Netflix").await.unwrap();
        assert!(find_all(&store, &account()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let store = InMemoryDocumentStore::new();
        store.fail_next_operations(1);
        let result = find_all(&store, &account()).await;
        assert!(matches!(result, Err(AppError::Transport(_))));
    }
}
