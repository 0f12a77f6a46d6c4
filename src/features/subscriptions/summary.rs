use super::models::{FetchOutcome, ServiceSummary, SubscriptionRecord, SummaryDisplay};

/// 取得済みサブスクリプションから集計値を計算する
///
/// 月額合計はプラン価格（1人あたりではない）の合計、年額合計はその12倍。
pub fn aggregate(records: &[SubscriptionRecord]) -> ServiceSummary {
    let monthly_spend: f64 = records.iter().map(SubscriptionRecord::plan_price).sum();
    let monthly_per_person: f64 = records.iter().map(SubscriptionRecord::per_person_cost).sum();

    ServiceSummary {
        subscription_count: records.len(),
        monthly_spend,
        annual_spend: monthly_spend * 12.0,
        monthly_per_person,
    }
}

/// 取得状態に応じたダッシュボードの表示内容を決める
pub fn summary_display(outcome: FetchOutcome, records: &[SubscriptionRecord]) -> SummaryDisplay {
    match outcome {
        FetchOutcome::Idle | FetchOutcome::Fetching => SummaryDisplay::Loading,
        FetchOutcome::Success => SummaryDisplay::Ready(aggregate(records)),
        FetchOutcome::Failure => SummaryDisplay::Failed,
    }
}
