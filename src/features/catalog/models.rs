use crate::features::subscriptions::validation::{normalize_price, validate_plan_name, validate_price};
use crate::shared::errors::AppResult;
use serde::{Deserialize, Serialize};

/// サービスドキュメントの種別フィールド名
pub const TYPE_FIELD: &str = "Type";
/// サービスドキュメントのプランマップのフィールド名
pub const PLANS_FIELD: &str = "Plans";

/// カタログ上のサービス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// サービス名（ドキュメントID）
    pub name: String,
    /// 種別（動画、音楽など）
    pub service_type: String,
}

/// サービスの料金プラン
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub name: String,
    pub price: f64,
}

impl Plan {
    /// 入力値を検証してプランを作成する
    pub fn new(name: impl Into<String>, price: f64) -> AppResult<Self> {
        let name = name.into();
        validate_plan_name(&name)?;
        validate_price(price)?;
        Ok(Self {
            name,
            price: normalize_price(price),
        })
    }
}

/// サービスとそのプラン一覧
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub service: Service,
    pub plans: Vec<Plan>,
}
