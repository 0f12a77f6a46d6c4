use super::events::EditSubscription;
use super::models::{FetchOutcome, SubscriptionRecord, SummaryDisplay};
use super::service::SubscriptionService;
use super::summary::summary_display;
use super::view_model::run_cancellable;
use crate::features::auth::AccountId;
use crate::shared::document_store::DocumentStore;
use crate::shared::errors::{AppError, AppResult};
use log::{debug, warn};
use std::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct DashboardState {
    outcome: FetchOutcome,
    records: Vec<SubscriptionRecord>,
}

/// ダッシュボード（件数・月額・年額）のビューモデル
///
/// 取得中は各値の代わりにローディングを表示し、取得成功のたびに集計し直す。
pub struct DashboardViewModel<S: ?Sized> {
    service: SubscriptionService<S>,
    account: AccountId,
    state: Mutex<DashboardState>,
    edits: Mutex<EditSubscription>,
    cancel: CancellationToken,
}

impl<S> DashboardViewModel<S>
where
    S: DocumentStore + ?Sized,
{
    pub fn new(service: SubscriptionService<S>, account: AccountId) -> Self {
        let edits = service.subscribe_edits(account.clone());
        Self {
            service,
            account,
            state: Mutex::new(DashboardState::default()),
            edits: Mutex::new(edits),
            cancel: CancellationToken::new(),
        }
    }

    /// サブスクリプションを取得して集計し直す
    pub async fn refresh(&self) -> AppResult<()> {
        if self.cancel.is_cancelled() {
            return Err(AppError::cancelled("ダッシュボード集計"));
        }
        self.lock_state()?.outcome = FetchOutcome::Fetching;

        let result = run_cancellable(
            &self.cancel,
            "ダッシュボード集計",
            self.service.fetch_subscriptions(&self.account),
        )
        .await;

        match result {
            Err(e) if e.is_cancelled() => Err(e),
            Ok(records) => {
                let mut state = self.lock_state()?;
                debug!("ダッシュボードを更新します: count={}", records.len());
                state.records = records;
                state.outcome = FetchOutcome::Success;
                Ok(())
            }
            Err(e) => {
                self.lock_state()?.outcome = FetchOutcome::Failure;
                warn!(
                    "ダッシュボードの取得に失敗しました: account={}, severity={:?}, error={e}",
                    self.account,
                    e.severity()
                );
                Err(e)
            }
        }
    }

    /// 変更通知があれば再集計する
    pub async fn refresh_if_edited(&self) -> AppResult<bool> {
        let edited = self
            .edits
            .lock()
            .map_err(|e| AppError::concurrency(format!("変更通知のロック取得に失敗: {e}")))?
            .drain();
        if !edited {
            return Ok(false);
        }
        self.refresh().await?;
        Ok(true)
    }

    /// 現在の表示内容
    pub fn display(&self) -> AppResult<SummaryDisplay> {
        let state = self.lock_state()?;
        Ok(summary_display(state.outcome, &state.records))
    }

    pub fn close(&self) {
        self.cancel.cancel();
    }

    fn lock_state(&self) -> AppResult<MutexGuard<'_, DashboardState>> {
        self.state
            .lock()
            .map_err(|e| AppError::concurrency(format!("ダッシュボード状態のロック取得に失敗: {e}")))
    }
}

impl<S: ?Sized> Drop for DashboardViewModel<S> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::catalog::Plan;
    use crate::features::subscriptions::events::EditNotifier;
    use crate::shared::document_store::InMemoryDocumentStore;
    use serde_json::json;
    use std::sync::Arc;

    fn account() -> AccountId {
        AccountId::new("user@example.com").unwrap()
    }

    fn setup() -> (DashboardViewModel<InMemoryDocumentStore>, SubscriptionService<InMemoryDocumentStore>, Arc<InMemoryDocumentStore>) {
        let store = Arc::new(InMemoryDocumentStore::new());
        store
            .seed_document("Users", "user@example.com", json!({"Subscriptions": {}}))
            .unwrap();
        let service = SubscriptionService::new(Arc::clone(&store), EditNotifier::new());
        let dashboard = DashboardViewModel::new(service.clone(), account());
        (dashboard, service, store)
    }

    #[tokio::test]
    async fn test_loading_then_ready() {
        let (dashboard, _service, _store) = setup();
        assert_eq!(dashboard.display().unwrap(), SummaryDisplay::Loading);

        dashboard.refresh().await.unwrap();
        match dashboard.display().unwrap() {
            SummaryDisplay::Ready(summary) => {
                assert_eq!(summary.subscription_count, 0);
                assert_eq!(summary.annual_spend, 0.0);
            }
            other => panic!("想定外の表示: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_recomputed_after_add() {
        let (dashboard, service, _store) = setup();
        dashboard.refresh().await.unwrap();

        let plan = Plan::new("Premium", 15.99).unwrap();
        service
            .add_plan_to_user(&account(), "Netflix", &plan, 4)
            .await
            .unwrap();

        assert!(dashboard.refresh_if_edited().await.unwrap());
        match dashboard.display().unwrap() {
            SummaryDisplay::Ready(summary) => {
                assert_eq!(summary.subscription_count, 1);
                assert!((summary.annual_spend - 15.99 * 12.0).abs() < 1e-9);
            }
            other => panic!("想定外の表示: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failure_display() {
        let (dashboard, _service, store) = setup();
        store.fail_next_operations(1);
        assert!(dashboard.refresh().await.is_err());
        assert_eq!(dashboard.display().unwrap(), SummaryDisplay::Failed);

        dashboard.close();
        assert!(matches!(dashboard.refresh().await, Err(AppError::Cancelled(_))));
    }
}
