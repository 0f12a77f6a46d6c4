use crate::shared::errors::{AppError, AppResult};

/// サービス名・プラン名の最大文字数
pub const MAX_NAME_LENGTH: usize = 100;

/// サービス名のバリデーション
pub fn validate_service_name(name: &str) -> AppResult<()> {
    validate_name(name, "サービス名")
}

/// プラン名のバリデーション
pub fn validate_plan_name(name: &str) -> AppResult<()> {
    validate_name(name, "プラン名")
}

fn validate_name(name: &str, label: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation(format!("{label}を入力してください")));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::validation(format!(
            "{label}は{MAX_NAME_LENGTH}文字以内で入力してください"
        )));
    }
    Ok(())
}

/// 価格のバリデーション
pub fn validate_price(price: f64) -> AppResult<()> {
    if !price.is_finite() {
        return Err(AppError::validation("価格は数値で入力してください"));
    }
    if price < 0.0 {
        return Err(AppError::validation("価格は0以上の数値である必要があります"));
    }
    Ok(())
}

/// -0.0を0.0に揃える
///
/// 並び替えは`f64::total_cmp`で比較するため、符号付きゼロが混ざると無料プラン同士の順序が崩れる。
pub fn normalize_price(price: f64) -> f64 {
    if price == 0.0 {
        0.0
    } else {
        price
    }
}

/// 利用人数のバリデーション
pub fn validate_person_count(person_count: u32) -> AppResult<()> {
    if person_count == 0 {
        return Err(AppError::validation("利用人数は1人以上である必要があります"));
    }
    Ok(())
}

/// 入力欄の文字列を価格に変換する
///
/// # 戻り値
/// 0以上の有限値、または変換できない場合はバリデーションエラー
pub fn parse_price(input: &str) -> AppResult<f64> {
    let price: f64 = input
        .trim()
        .parse()
        .map_err(|_| AppError::validation("価格は数値で入力してください"))?;
    validate_price(price)?;
    Ok(normalize_price(price))
}

/// 入力欄の文字列を利用人数に変換する
///
/// # 戻り値
/// 1以上の整数、または変換できない場合はバリデーションエラー
pub fn parse_person_count(input: &str) -> AppResult<u32> {
    let person_count: u32 = input
        .trim()
        .parse()
        .map_err(|_| AppError::validation("利用人数は整数で入力してください"))?;
    validate_person_count(person_count)?;
    Ok(person_count)
}
