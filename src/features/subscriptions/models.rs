use super::validation::normalize_price;
use crate::shared::errors::{AppError, AppResult};
use serde::Serialize;
use std::num::NonZeroU32;

/// ユーザードキュメント内のサブスクリプションマップのフィールド名
pub const SUBSCRIPTIONS_FIELD: &str = "Subscriptions";
/// プラン名のフィールド名
pub const PLAN_NAME_FIELD: &str = "PlanName";
/// 価格のフィールド名
pub const PRICE_FIELD: &str = "Price";
/// 利用人数のフィールド名
pub const PERSON_COUNT_FIELD: &str = "PersonCount";

/// ユーザーのサブスクリプション1件
///
/// 利用人数は常に1以上、価格は常に0以上の有限値。
/// コンストラクタでのみ生成できるため、1人あたり料金の計算で0除算は起こらない。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    service_name: String,
    plan_name: String,
    plan_price: f64,
    person_count: NonZeroU32,
}

impl SubscriptionRecord {
    /// サブスクリプションを作成する
    ///
    /// # 引数
    /// * `service_name` - サービス名（ドキュメント内のキー）
    /// * `plan_name` - プラン名
    /// * `plan_price` - プラン全体の価格（1人あたりではない）
    /// * `person_count` - 利用人数
    ///
    /// # 戻り値
    /// 作成されたサブスクリプション、または不変条件を満たさない場合はバリデーションエラー
    pub fn new(
        service_name: impl Into<String>,
        plan_name: impl Into<String>,
        plan_price: f64,
        person_count: u32,
    ) -> AppResult<Self> {
        let service_name = service_name.into();
        if service_name.trim().is_empty() {
            return Err(AppError::validation("サービス名を入力してください"));
        }
        if !plan_price.is_finite() || plan_price < 0.0 {
            return Err(AppError::validation("価格は0以上の数値である必要があります"));
        }
        let person_count = NonZeroU32::new(person_count)
            .ok_or_else(|| AppError::validation("利用人数は1人以上である必要があります"))?;

        Ok(Self {
            service_name,
            plan_name: plan_name.into(),
            plan_price: normalize_price(plan_price),
            person_count,
        })
    }

    /// 同じサービスのまま、プラン・価格・人数を差し替えたサブスクリプションを作成する
    pub fn edited(
        &self,
        plan_name: impl Into<String>,
        plan_price: f64,
        person_count: u32,
    ) -> AppResult<Self> {
        Self::new(self.service_name.clone(), plan_name, plan_price, person_count)
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn plan_name(&self) -> &str {
        &self.plan_name
    }

    pub fn plan_price(&self) -> f64 {
        self.plan_price
    }

    pub fn person_count(&self) -> u32 {
        self.person_count.get()
    }

    /// 1人あたりの料金
    pub fn per_person_cost(&self) -> f64 {
        self.plan_price / f64::from(self.person_count.get())
    }
}

/// サブスクリプション取得の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FetchOutcome {
    /// 未取得、またはリセット直後
    #[default]
    Idle,
    /// 取得中
    Fetching,
    /// 取得成功（空リストを含む）
    Success,
    /// ドキュメント欠落・形式不正・通信エラー
    Failure,
}

impl FetchOutcome {
    /// 結果待ちかどうか（ダッシュボードのローディング表示に使う）
    pub fn is_pending(&self) -> bool {
        matches!(self, FetchOutcome::Idle | FetchOutcome::Fetching)
    }
}

/// 表示リストの並び順
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortPolicy {
    /// ストアが返した順（順序は保証されない）
    #[default]
    Default,
    /// 1人あたり料金の安い順
    PriceAscending,
    /// 1人あたり料金の高い順
    PriceDescending,
    /// サービス名順
    Alphabetical,
}

/// ダッシュボードに表示する集計値
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSummary {
    /// サブスクリプション件数
    pub subscription_count: usize,
    /// 月額合計（プラン価格の合計）
    pub monthly_spend: f64,
    /// 年額合計（月額合計 × 12）
    pub annual_spend: f64,
    /// 1人あたり料金の月額合計
    pub monthly_per_person: f64,
}

/// ダッシュボードの表示状態
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state", content = "summary")]
pub enum SummaryDisplay {
    /// 取得中（各値の代わりにプログレス表示）
    Loading,
    /// 集計済み
    Ready(ServiceSummary),
    /// 取得失敗
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_subscription_record() {
        let record = SubscriptionRecord::new("Netflix", "Premium", 15.99, 4).unwrap();
        assert_eq!(record.service_name(), "Netflix");
        assert_eq!(record.plan_name(), "Premium");
        assert_eq!(record.plan_price(), 15.99);
        assert_eq!(record.person_count(), 4);
        assert!((record.per_person_cost() - 3.9975).abs() < 1e-9);
    }

    #[test]
    fn test_invariants_rejected() {
        // 利用人数0は0除算になるため作成できない
        assert!(SubscriptionRecord::new("Netflix", "Premium", 15.99, 0).is_err());
        assert!(SubscriptionRecord::new("Netflix", "Premium", -1.0, 1).is_err());
        assert!(SubscriptionRecord::new("Netflix", "Premium", f64::NAN, 1).is_err());
        assert!(SubscriptionRecord::new("  ", "Premium", 1.0, 1).is_err());
    }

    #[test]
    fn test_free_plan_allowed() {
        let record = SubscriptionRecord::new("Spotify", "Free", 0.0, 1).unwrap();
        assert_eq!(record.per_person_cost(), 0.0);
    }

    #[test]
    fn test_edited_keeps_service_name() {
        let record = SubscriptionRecord::new("Netflix", "Basic", 7.99, 1).unwrap();
        let edited = record.edited("Premium", 15.99, 2).unwrap();
        assert_eq!(edited.service_name(), "Netflix");
        assert_eq!(edited.plan_name(), "Premium");
        assert_eq!(edited.person_count(), 2);
        assert!(record.edited("Premium", 15.99, 0).is_err());
    }

    #[test]
    fn test_fetch_outcome_pending() {
        assert!(FetchOutcome::Idle.is_pending());
        assert!(FetchOutcome::Fetching.is_pending());
        assert!(!FetchOutcome::Success.is_pending());
        assert!(!FetchOutcome::Failure.is_pending());
    }

    #[test]
    fn test_serialize_for_ui() {
        let record = SubscriptionRecord::new("Netflix", "Premium", 15.99, 4).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["serviceName"], "Netflix");
        assert_eq!(json["personCount"], 4);

        let policy: SortPolicy = serde_json::from_str("\"priceAscending\"").unwrap();
        assert_eq!(policy, SortPolicy::PriceAscending);

        let loading = serde_json::to_value(SummaryDisplay::Loading).unwrap();
        assert_eq!(loading["state"], "loading");
    }
}
