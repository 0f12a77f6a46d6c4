use crate::features::auth::AccountId;
use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

/// 受信側が追いつけない場合に保持しておくイベント数
const DEFAULT_CAPACITY: usize = 64;

/// サブスクリプション変更の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EditKind {
    Added,
    Updated,
}

/// サブスクリプション変更通知
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditEvent {
    pub account: AccountId,
    pub service_name: String,
    pub kind: EditKind,
    pub occurred_at: DateTime<Utc>,
}

impl EditEvent {
    pub fn new(account: AccountId, service_name: impl Into<String>, kind: EditKind) -> Self {
        Self {
            account,
            service_name: service_name.into(),
            kind,
            occurred_at: Utc::now(),
        }
    }
}

/// サブスクリプション変更の通知チャネル
///
/// 購読中の画面はそれぞれ独立に通知を受け取り、再取得する。
#[derive(Debug, Clone)]
pub struct EditNotifier {
    sender: broadcast::Sender<EditEvent>,
}

impl Default for EditNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl EditNotifier {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// 変更を通知する
    ///
    /// # 戻り値
    /// 通知を受け取った購読者の数（購読者がいない場合は0）
    pub fn publish(&self, event: EditEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => {
                debug!("変更通知を送信しました: receivers={receivers}");
                receivers
            }
            Err(_) => {
                debug!("変更通知の購読者がいません");
                0
            }
        }
    }

    /// 変更通知を購読する
    pub fn subscribe(&self, account: AccountId) -> EditSubscription {
        EditSubscription {
            account,
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// 1アカウント分の変更通知の購読
#[derive(Debug)]
pub struct EditSubscription {
    account: AccountId,
    receiver: broadcast::Receiver<EditEvent>,
}

impl EditSubscription {
    /// 溜まっている通知をすべて取り出し、自アカウントの変更があったか返す
    ///
    /// 取りこぼし（Lagged）は変更ありとみなす。
    pub fn drain(&mut self) -> bool {
        let mut edited = false;
        loop {
            match self.receiver.try_recv() {
                Ok(event) => edited |= event.account == self.account,
                Err(TryRecvError::Lagged(skipped)) => {
                    debug!("変更通知を{skipped}件取りこぼしました");
                    edited = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        edited
    }

    /// 自アカウントの変更通知を待つ
    ///
    /// # 戻り値
    /// 変更があればtrue、送信側がすべて破棄された場合はfalse
    pub async fn next_edit(&mut self) -> bool {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.account == self.account => return true,
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    debug!("変更通知を{skipped}件取りこぼしました");
                    return true;
                }
                Err(RecvError::Closed) => return false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(email: &str) -> AccountId {
        AccountId::new(email).unwrap()
    }

    #[test]
    fn test_publish_without_subscribers() {
        let notifier = EditNotifier::new();
        let event = EditEvent::new(account("a@example.com"), "Netflix", EditKind::Updated);
        assert_eq!(notifier.publish(event), 0);
    }

    #[test]
    fn test_drain_filters_by_account() {
        let notifier = EditNotifier::new();
        let mut mine = notifier.subscribe(account("a@example.com"));
        let mut other = notifier.subscribe(account("b@example.com"));
        assert_eq!(notifier.subscriber_count(), 2);

        notifier.publish(EditEvent::new(account("a@example.com"), "Netflix", EditKind::Updated));

        assert!(mine.drain());
        // 一度取り出したら次は空
        assert!(!mine.drain());
        assert!(!other.drain());
    }

    #[test]
    fn test_lagged_counts_as_edit() {
        let notifier = EditNotifier::with_capacity(1);
        let mut sub = notifier.subscribe(account("a@example.com"));

        for _ in 0..3 {
            notifier.publish(EditEvent::new(account("b@example.com"), "X", EditKind::Added));
        }
        assert!(sub.drain());
    }

    #[tokio::test]
    async fn test_next_edit_skips_other_accounts() {
        let notifier = EditNotifier::new();
        let mut sub = notifier.subscribe(account("a@example.com"));

        notifier.publish(EditEvent::new(account("b@example.com"), "X", EditKind::Updated));
        notifier.publish(EditEvent::new(account("a@example.com"), "Y", EditKind::Updated));
        assert!(sub.next_edit().await);

        drop(notifier);
        assert!(!sub.next_edit().await);
    }
}
