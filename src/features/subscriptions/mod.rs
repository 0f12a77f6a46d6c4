/// サブスクリプション機能モジュール
///
/// このモジュールは、ユーザーのサブスクリプション管理に関連するすべての機能を提供します：
/// - ユーザードキュメントからのサブスクリプション取得と検証
/// - 件数・月額・年額の集計
/// - 並び替え・絞り込み
/// - プランの追加、サブスクリプションの更新・削除
/// - 一覧画面・ダッシュボードの状態管理
pub mod dashboard;
pub mod decode;
pub mod events;
pub mod models;
pub mod repository;
pub mod service;
pub mod sort;
pub mod summary;
pub mod validation;
pub mod view_model;

// 公開インターフェース
pub use dashboard::DashboardViewModel;
pub use events::{EditEvent, EditKind, EditNotifier, EditSubscription};
pub use models::{FetchOutcome, ServiceSummary, SortPolicy, SubscriptionRecord, SummaryDisplay};
pub use service::SubscriptionService;
pub use sort::{filter_by_name, project};
pub use summary::aggregate;
pub use validation::{parse_person_count, parse_price};
pub use view_model::SubscriptionListViewModel;
