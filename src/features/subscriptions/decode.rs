//! ユーザードキュメントとサブスクリプションの相互変換
//!
//! 1件単位の形式不正はその件だけを読み飛ばし、マップ自体が読めない場合のみ失敗とする。

use super::models::{
    SubscriptionRecord, PERSON_COUNT_FIELD, PLAN_NAME_FIELD, PRICE_FIELD, SUBSCRIPTIONS_FIELD,
};
use super::validation::normalize_price;
use crate::shared::errors::{AppError, AppResult};
use log::warn;
use serde_json::{json, Map, Value};

/// ユーザードキュメントからサブスクリプション一覧を取り出す
///
/// # 引数
/// * `document` - `Users/{accountId}` ドキュメントの内容
///
/// # 戻り値
/// ストアが返したマップ順のサブスクリプション一覧。
/// `Subscriptions` が無い、またはマップでない場合は`MalformedField`
pub fn decode_subscriptions(document: &Value) -> AppResult<Vec<SubscriptionRecord>> {
    let subscriptions = document
        .get(SUBSCRIPTIONS_FIELD)
        .ok_or_else(|| AppError::malformed_field(format!("{SUBSCRIPTIONS_FIELD} がありません")))?
        .as_object()
        .ok_or_else(|| {
            AppError::malformed_field(format!("{SUBSCRIPTIONS_FIELD} がマップではありません"))
        })?;

    let records = subscriptions
        .iter()
        .filter_map(|(service_name, details)| match decode_entry(service_name, details) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("サブスクリプションを読み飛ばします: service={service_name}, reason={e}");
                None
            }
        })
        .collect();

    Ok(records)
}

/// サブスクリプション1件を変換する
pub fn decode_entry(service_name: &str, details: &Value) -> AppResult<SubscriptionRecord> {
    let details = details
        .as_object()
        .ok_or_else(|| AppError::malformed_field("詳細がマップではありません"))?;

    let plan_name = details
        .get(PLAN_NAME_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| missing_or_invalid(PLAN_NAME_FIELD))?;

    let price = details
        .get(PRICE_FIELD)
        .and_then(coerce_price)
        .ok_or_else(|| missing_or_invalid(PRICE_FIELD))?;

    let person_count = details
        .get(PERSON_COUNT_FIELD)
        .and_then(coerce_person_count)
        .ok_or_else(|| missing_or_invalid(PERSON_COUNT_FIELD))?;

    SubscriptionRecord::new(service_name, plan_name, price, person_count)
        .map_err(|e| AppError::malformed_field(e.to_string()))
}

/// サブスクリプション1件をドキュメントの値に変換する
pub fn encode_entry(record: &SubscriptionRecord) -> Value {
    json!({
        PLAN_NAME_FIELD: record.plan_name(),
        PRICE_FIELD: record.plan_price(),
        PERSON_COUNT_FIELD: record.person_count(),
    })
}

/// 価格として読める値か判定する（数値のみ。文字列は受け付けない）
pub fn coerce_price(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .filter(|price| price.is_finite())
        .map(normalize_price)
}

/// 利用人数として読める値か判定する
///
/// 整数、または小数部が0の浮動小数点数を受け付ける。
pub fn coerce_person_count(value: &Value) -> Option<u32> {
    if let Some(count) = value.as_u64() {
        return u32::try_from(count).ok();
    }
    if value.is_i64() {
        // 負の整数
        return None;
    }

    let count = value.as_f64()?;
    if count.fract() != 0.0 || count < 0.0 || count > f64::from(u32::MAX) {
        return None;
    }
    Some(count as u32)
}

/// ドキュメントのマップから文字列→数値の組を取り出す（カタログのプラン用）
///
/// 数値でない値は読み飛ばす。
pub fn decode_price_map(map: &Map<String, Value>) -> Vec<(String, f64)> {
    map.iter()
        .filter_map(|(name, value)| match coerce_price(value) {
            Some(price) => Some((name.clone(), price)),
            None => {
                warn!("価格が数値ではないため読み飛ばします: name={name}");
                None
            }
        })
        .collect()
}

fn missing_or_invalid(field: &str) -> AppError {
    AppError::malformed_field(format!("{field} が無いか型が正しくありません"))
}
