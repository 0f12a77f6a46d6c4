use super::models::{SortPolicy, SubscriptionRecord};
use std::cmp::Ordering;

/// 並び順を適用した表示用リストを作成する
///
/// 元のリストは変更しない。価格順は1人あたり料金で比較し、
/// 同値の場合は元の順序を保つ（安定ソート）。
pub fn project(source: &[SubscriptionRecord], policy: SortPolicy) -> Vec<SubscriptionRecord> {
    let mut projected = source.to_vec();
    match policy {
        SortPolicy::Default => {}
        SortPolicy::PriceAscending => projected.sort_by(compare_per_person_cost),
        SortPolicy::PriceDescending => projected.sort_by(|a, b| compare_per_person_cost(b, a)),
        SortPolicy::Alphabetical => {
            projected.sort_by(|a, b| a.service_name().cmp(b.service_name()))
        }
    }
    projected
}

fn compare_per_person_cost(a: &SubscriptionRecord, b: &SubscriptionRecord) -> Ordering {
    a.per_person_cost().total_cmp(&b.per_person_cost())
}

/// サービス名・プラン名で絞り込む（大文字小文字を区別しない部分一致）
///
/// 空のクエリは全件を返す。
pub fn filter_by_name(source: &[SubscriptionRecord], query: &str) -> Vec<SubscriptionRecord> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return source.to_vec();
    }

    source
        .iter()
        .filter(|record| {
            record.service_name().to_lowercase().contains(&query)
                || record.plan_name().to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn record(name: &str, price: f64, people: u32) -> SubscriptionRecord {
        SubscriptionRecord::new(name, "Plan", price, people).unwrap()
    }

    fn names(records: &[SubscriptionRecord]) -> Vec<&str> {
        records.iter().map(SubscriptionRecord::service_name).collect()
    }

    #[test]
    fn test_price_uses_per_person_cost() {
        // 合計額はNetflixが高いが、1人あたりはSpotifyが安い
        let source = vec![record("Netflix", 15.99, 4), record("Spotify", 9.99, 5)];
        let ascending = project(&source, SortPolicy::PriceAscending);
        assert_eq!(names(&ascending), vec!["Spotify", "Netflix"]);

        let source = vec![record("A", 10.0, 1), record("B", 12.0, 4)];
        assert_eq!(names(&project(&source, SortPolicy::PriceAscending)), vec!["B", "A"]);
        assert_eq!(names(&project(&source, SortPolicy::PriceDescending)), vec!["A", "B"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let source = vec![
            record("C", 5.0, 1),
            record("A", 10.0, 2),
            record("B", 2.5, 1),
            record("D", 5.0, 1),
        ];

        assert_eq!(
            names(&project(&source, SortPolicy::PriceAscending)),
            vec!["B", "C", "A", "D"]
        );
        assert_eq!(
            names(&project(&source, SortPolicy::PriceDescending)),
            vec!["C", "A", "D", "B"]
        );
    }

    #[test]
    fn test_free_plans_tie_regardless_of_zero_sign() {
        let source = vec![record("Free1", -0.0, 1), record("Free2", 0.0, 1), record("Free3", -0.0, 2)];
        assert_eq!(
            names(&project(&source, SortPolicy::PriceAscending)),
            vec!["Free1", "Free2", "Free3"]
        );
        assert_eq!(
            names(&project(&source, SortPolicy::PriceDescending)),
            vec!["Free1", "Free2", "Free3"]
        );
    }

    #[test]
    fn test_alphabetical_is_ordinal() {
        let source = vec![record("spotify", 1.0, 1), record("Netflix", 1.0, 1), record("Hulu", 1.0, 1)];
        // 大文字が小文字より前に来る
        assert_eq!(
            names(&project(&source, SortPolicy::Alphabetical)),
            vec!["Hulu", "Netflix", "spotify"]
        );
    }

    #[test]
    fn test_empty_and_default() {
        assert!(project(&[], SortPolicy::PriceDescending).is_empty());

        let source = vec![record("B", 1.0, 1), record("A", 2.0, 1)];
        assert_eq!(project(&source, SortPolicy::Default), source);
    }

    #[test]
    fn test_filter_by_name() {
        let source = vec![
            SubscriptionRecord::new("Netflix", "Premium", 15.99, 4).unwrap(),
            SubscriptionRecord::new("Spotify", "Family", 9.99, 5).unwrap(),
        ];
        assert_eq!(names(&filter_by_name(&source, "net")), vec!["Netflix"]);
        assert_eq!(names(&filter_by_name(&source, "FAMILY")), vec!["Spotify"]);
        assert_eq!(filter_by_name(&source, "  ").len(), 2);
        assert!(filter_by_name(&source, "hulu").is_empty());
    }

    fn build(prices: &[(u16, u8)]) -> Vec<SubscriptionRecord> {
        prices
            .iter()
            .enumerate()
            .map(|(i, (cents, people))| {
                record(&format!("service-{i:03}"), f64::from(*cents), u32::from(*people) + 1)
            })
            .collect()
    }

    #[quickcheck]
    fn prop_projection_does_not_mutate_source(prices: Vec<(u16, u8)>) -> bool {
        let source = build(&prices);
        let before = source.clone();
        let _ = project(&source, SortPolicy::Alphabetical);
        let _ = project(&source, SortPolicy::PriceDescending);
        source == before
    }

    #[quickcheck]
    fn prop_alphabetical_is_sorted_permutation(prices: Vec<(u16, u8)>) -> bool {
        let source = build(&prices);
        let sorted = project(&source, SortPolicy::Alphabetical);
        sorted.len() == source.len()
            && sorted
                .windows(2)
                .all(|w| w[0].service_name() <= w[1].service_name())
    }

    #[quickcheck]
    fn prop_price_orders_reverse_without_ties(prices: Vec<(u16, u8)>) -> bool {
        let source = build(&prices);
        let mut costs: Vec<f64> = source.iter().map(SubscriptionRecord::per_person_cost).collect();
        costs.sort_by(f64::total_cmp);
        if costs.windows(2).any(|w| w[0] == w[1]) {
            // 同値がある場合は対象外
            return true;
        }

        let mut ascending = project(&source, SortPolicy::PriceAscending);
        ascending.reverse();
        ascending == project(&source, SortPolicy::PriceDescending)
    }
}
