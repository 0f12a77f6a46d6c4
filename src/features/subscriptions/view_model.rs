//! サブスクリプション一覧画面の状態管理
//!
//! 取得済みリスト（ストアの最新内容）と表示リスト（並び替え・絞り込み・楽観的削除を反映）を
//! 分けて保持し、取得成功のたびに表示リストを作り直す。
//! 画面の破棄後に届いた結果は反映しない。

use super::events::EditSubscription;
use super::models::{FetchOutcome, SortPolicy, SubscriptionRecord, SummaryDisplay};
use super::service::SubscriptionService;
use super::sort::{filter_by_name, project};
use super::summary::summary_display;
use crate::features::auth::AccountId;
use crate::shared::document_store::DocumentStore;
use crate::shared::errors::{AppError, AppResult};
use log::{debug, warn};
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

/// 処理をキャンセルトークンと競わせる
///
/// トークンが先にキャンセルされた場合は`AppError::Cancelled`を返す。
pub(crate) async fn run_cancellable<F, T>(
    cancel: &CancellationToken,
    operation: &str,
    future: F,
) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::cancelled(operation)),
        result = future => result,
    };

    if cancel.is_cancelled() {
        return Err(AppError::cancelled(operation));
    }
    result
}

#[derive(Debug, Default)]
struct ListState {
    outcome: FetchOutcome,
    fetched: Vec<SubscriptionRecord>,
    displayed: Vec<SubscriptionRecord>,
    sort_policy: SortPolicy,
    filter: String,
    /// 楽観的に削除済みで、次の取得までは表示しないサービス名
    removed: HashSet<String>,
    /// 直近の失敗時にトースト表示するメッセージ
    toast: Option<String>,
}

impl ListState {
    fn rebuild_displayed(&mut self) {
        let visible: Vec<SubscriptionRecord> = self
            .fetched
            .iter()
            .filter(|record| !self.removed.contains(record.service_name()))
            .cloned()
            .collect();
        self.displayed = project(&filter_by_name(&visible, &self.filter), self.sort_policy);
    }
}

/// サブスクリプション一覧画面のビューモデル
pub struct SubscriptionListViewModel<S: ?Sized> {
    service: SubscriptionService<S>,
    account: AccountId,
    state: Mutex<ListState>,
    edits: Mutex<EditSubscription>,
    cancel: CancellationToken,
}

impl<S> SubscriptionListViewModel<S>
where
    S: DocumentStore + ?Sized,
{
    /// ビューモデルを作成し、アカウントの変更通知の購読を開始する
    pub fn new(service: SubscriptionService<S>, account: AccountId) -> Self {
        let edits = service.subscribe_edits(account.clone());
        Self {
            service,
            account,
            state: Mutex::new(ListState::default()),
            edits: Mutex::new(edits),
            cancel: CancellationToken::new(),
        }
    }

    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// 画面表示時の初回取得
    pub async fn mount(&self) -> AppResult<()> {
        debug!("一覧画面を表示します: account={}", self.account);
        self.refresh().await
    }

    /// サブスクリプションを再取得する
    ///
    /// 成功時は取得済みリストを丸ごと置き換え、楽観的削除を破棄したうえで
    /// 現在の並び順・絞り込みで表示リストを作り直す。
    /// 失敗時は取得済みリストを変更しない。
    pub async fn refresh(&self) -> AppResult<()> {
        self.ensure_live("サブスクリプション取得")?;
        self.lock_state()?.outcome = FetchOutcome::Fetching;
        debug!("状態遷移: Fetching account={}", self.account);

        let result = run_cancellable(
            &self.cancel,
            "サブスクリプション取得",
            self.service.fetch_subscriptions(&self.account),
        )
        .await;

        match result {
            Err(e) if e.is_cancelled() => {
                debug!("画面破棄済みのため取得結果を破棄します: account={}", self.account);
                Err(e)
            }
            Ok(records) => {
                let mut state = self.lock_state()?;
                state.fetched = records;
                state.removed.clear();
                state.rebuild_displayed();
                state.outcome = FetchOutcome::Success;
                state.toast = None;
                debug!(
                    "状態遷移: Success account={}, count={}",
                    self.account,
                    state.fetched.len()
                );
                Ok(())
            }
            Err(e) => {
                let mut state = self.lock_state()?;
                state.outcome = FetchOutcome::Failure;
                state.toast = Some(e.user_message().to_string());
                warn!(
                    "状態遷移: Failure account={}, severity={:?}, error={e}",
                    self.account,
                    e.severity()
                );
                Err(e)
            }
        }
    }

    /// 並び順を変更する
    pub fn apply_sort(&self, policy: SortPolicy) -> AppResult<()> {
        let mut state = self.lock_state()?;
        state.sort_policy = policy;
        state.rebuild_displayed();
        Ok(())
    }

    /// 絞り込み条件を変更する（空文字で解除）
    pub fn set_filter(&self, query: &str) -> AppResult<()> {
        let mut state = self.lock_state()?;
        state.filter = query.to_string();
        state.rebuild_displayed();
        Ok(())
    }

    /// サブスクリプションを削除する
    ///
    /// 表示リストからは即座に取り除き、ストアへの削除が失敗した場合は元に戻す。
    /// 取得済みリストは次の取得まで変更しない。
    pub async fn remove(&self, record: &SubscriptionRecord) -> AppResult<()> {
        self.ensure_live("サブスクリプション削除")?;
        let service_name = record.service_name().to_string();

        {
            let mut state = self.lock_state()?;
            state.removed.insert(service_name.clone());
            state
                .displayed
                .retain(|displayed| displayed.service_name() != service_name);
        }

        let result = run_cancellable(
            &self.cancel,
            "サブスクリプション削除",
            self.service.remove_subscription(&self.account, record),
        )
        .await;

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.is_cancelled() => Err(e),
            Err(e) => {
                let mut state = self.lock_state()?;
                if state.removed.remove(&service_name) {
                    state.rebuild_displayed();
                }
                state.toast = Some(e.user_message().to_string());
                warn!("削除に失敗したため表示を元に戻しました: service={service_name}, error={e}");
                Err(e)
            }
        }
    }

    /// サブスクリプションを更新する
    ///
    /// 表示への反映は変更通知による再取得で行う。
    pub async fn update(&self, record: &SubscriptionRecord) -> AppResult<()> {
        self.ensure_live("サブスクリプション更新")?;
        run_cancellable(
            &self.cancel,
            "サブスクリプション更新",
            self.service.update_subscription(&self.account, record),
        )
        .await
    }

    /// 溜まっている変更通知を確認し、自アカウントの変更があれば1回だけ再取得する
    ///
    /// # 戻り値
    /// 再取得した場合はtrue
    pub async fn refresh_if_edited(&self) -> AppResult<bool> {
        let edited = self
            .edits
            .lock()
            .map_err(|e| AppError::concurrency(format!("変更通知のロック取得に失敗: {e}")))?
            .drain();
        if !edited {
            return Ok(false);
        }

        debug!("変更通知を受信したため再取得します: account={}", self.account);
        self.refresh().await?;
        Ok(true)
    }

    /// 画面が破棄されるまで変更通知を待ち、届くたびに再取得する
    ///
    /// `refresh_if_edited`とは別に専用の購読を持つため、両者を併用しても互いを待たない。
    /// 再取得の失敗は記録して待機を続ける。
    pub async fn watch_edits(&self) -> AppResult<()> {
        let mut edits = self.service.subscribe_edits(self.account.clone());
        loop {
            let edited = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(()),
                edited = edits.next_edit() => edited,
            };
            if !edited {
                debug!("変更通知チャネルが閉じられました: account={}", self.account);
                return Ok(());
            }

            match self.refresh().await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => return Ok(()),
                Err(e) => warn!("変更通知による再取得に失敗しました: {e}"),
            }
        }
    }

    pub fn outcome(&self) -> AppResult<FetchOutcome> {
        Ok(self.lock_state()?.outcome)
    }

    pub fn sort_policy(&self) -> AppResult<SortPolicy> {
        Ok(self.lock_state()?.sort_policy)
    }

    /// 表示リストのコピー
    pub fn displayed(&self) -> AppResult<Vec<SubscriptionRecord>> {
        Ok(self.lock_state()?.displayed.clone())
    }

    /// 取得済みリストのコピー
    pub fn fetched(&self) -> AppResult<Vec<SubscriptionRecord>> {
        Ok(self.lock_state()?.fetched.clone())
    }

    /// 直近の失敗のトーストメッセージ（次の取得成功で消える）
    pub fn toast_message(&self) -> AppResult<Option<String>> {
        Ok(self.lock_state()?.toast.clone())
    }

    /// 取得済みリストの集計表示
    pub fn summary(&self) -> AppResult<SummaryDisplay> {
        let state = self.lock_state()?;
        Ok(summary_display(state.outcome, &state.fetched))
    }

    /// 画面を破棄する。実行中の処理の結果は反映されなくなる
    pub fn close(&self) {
        debug!("一覧画面を破棄します: account={}", self.account);
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn ensure_live(&self, operation: &str) -> AppResult<()> {
        if self.is_closed() {
            return Err(AppError::cancelled(operation));
        }
        Ok(())
    }

    fn lock_state(&self) -> AppResult<MutexGuard<'_, ListState>> {
        self.state
            .lock()
            .map_err(|e| AppError::concurrency(format!("画面状態のロック取得に失敗: {e}")))
    }
}

impl<S: ?Sized> Drop for SubscriptionListViewModel<S> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
