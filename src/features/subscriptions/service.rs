use super::events::{EditEvent, EditKind, EditNotifier, EditSubscription};
use super::models::SubscriptionRecord;
use super::repository;
use super::validation::{validate_person_count, validate_plan_name, validate_price, validate_service_name};
use crate::features::auth::AccountId;
use crate::features::catalog::Plan;
use crate::shared::document_store::DocumentStore;
use crate::shared::errors::AppResult;
use log::info;
use std::sync::Arc;

/// サブスクリプションの取得・変更操作
///
/// 各変更操作はストアへの書き込みを1回だけ行い、失敗してもリトライしない。
/// 追加・更新の成功時は変更通知を送る。
pub struct SubscriptionService<S: ?Sized> {
    store: Arc<S>,
    notifier: EditNotifier,
}

impl<S: ?Sized> Clone for SubscriptionService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            notifier: self.notifier.clone(),
        }
    }
}

impl<S> SubscriptionService<S>
where
    S: DocumentStore + ?Sized,
{
    pub fn new(store: Arc<S>, notifier: EditNotifier) -> Self {
        Self { store, notifier }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn notifier(&self) -> &EditNotifier {
        &self.notifier
    }

    /// 変更通知を購読する
    pub fn subscribe_edits(&self, account: AccountId) -> EditSubscription {
        self.notifier.subscribe(account)
    }

    /// ユーザーのサブスクリプション一覧を取得する
    pub async fn fetch_subscriptions(&self, account: &AccountId) -> AppResult<Vec<SubscriptionRecord>> {
        repository::find_all(self.store.as_ref(), account).await
    }

    /// ユーザーにプランを追加する
    ///
    /// 同じサービス名のサブスクリプションが既にある場合は上書きする。
    ///
    /// # 引数
    /// * `account` - 所有アカウント
    /// * `service_name` - サービス名
    /// * `plan` - 選択したプラン（名前と価格）
    /// * `person_count` - 利用人数
    ///
    /// # 戻り値
    /// 書き込んだサブスクリプション、または失敗時はエラー
    pub async fn add_plan_to_user(
        &self,
        account: &AccountId,
        service_name: &str,
        plan: &Plan,
        person_count: u32,
    ) -> AppResult<SubscriptionRecord> {
        validate_service_name(service_name)?;
        validate_plan_name(&plan.name)?;
        validate_price(plan.price)?;
        validate_person_count(person_count)?;

        let record = SubscriptionRecord::new(service_name, plan.name.clone(), plan.price, person_count)?;
        repository::save(self.store.as_ref(), account, &record).await?;

        info!(
            "プランを追加しました: account={account}, service={service_name}, plan={}",
            plan.name
        );
        self.notifier
            .publish(EditEvent::new(account.clone(), service_name, EditKind::Added));
        Ok(record)
    }

    /// サブスクリプションを更新する
    ///
    /// 成功時は変更通知を送り、一覧画面に再取得させる。
    pub async fn update_subscription(
        &self,
        account: &AccountId,
        record: &SubscriptionRecord,
    ) -> AppResult<()> {
        validate_plan_name(record.plan_name())?;

        repository::save(self.store.as_ref(), account, record).await?;

        info!(
            "サブスクリプションを更新しました: account={account}, service={}",
            record.service_name()
        );
        self.notifier.publish(EditEvent::new(
            account.clone(),
            record.service_name(),
            EditKind::Updated,
        ));
        Ok(())
    }

    /// ユーザーからサブスクリプションを削除する
    pub async fn remove_subscription(
        &self,
        account: &AccountId,
        record: &SubscriptionRecord,
    ) -> AppResult<()> {
        repository::delete(self.store.as_ref(), account, record.service_name()).await?;

        info!(
            "サブスクリプションを削除しました: account={account}, service={}",
            record.service_name()
        );
        Ok(())
    }
}
