//! Property tests for paginated traversal
//!
//! Walking every page of a listing in either direction yields each row exactly
//! once, even when the store hands rows back in a different physical order on
//! every request and many rows share the same sort value.

use proptest::prelude::*;
use spotmap_core::models::{EntityKind, QueryParams, SortDirection, SortKey, WireLocation};
use spotmap_listing::build;
use spotmap_store::memory::apply_query;
use std::collections::HashMap;

fn rows_strategy() -> impl Strategy<Value = Vec<WireLocation>> {
    proptest::collection::vec(
        (prop::sample::select(vec!["Alpha", "Beta", "Echo"]), prop::option::of(0u8..3)),
        0..40,
    )
    .prop_map(|cells| {
        cells
            .into_iter()
            .enumerate()
            .map(|(i, (name, city))| {
                let row = WireLocation::new(i as i64, name);
                match city {
                    Some(c) => row.with_city(format!("City {}", c)),
                    None => row,
                }
            })
            .collect()
    })
}

fn sort_strategy() -> impl Strategy<Value = (SortKey, SortDirection)> {
    (
        prop::sample::select(vec![SortKey::Name, SortKey::City, SortKey::CreatedAt, SortKey::Id]),
        prop::sample::select(vec![SortDirection::Ascending, SortDirection::Descending]),
    )
}

/// Deterministic reshuffle standing in for a store without a stable physical order
fn reshuffle(rows: &[WireLocation], seed: u64, page: u32) -> Vec<WireLocation> {
    let mut shuffled = rows.to_vec();
    if shuffled.is_empty() {
        return shuffled;
    }
    let rotation = (seed.wrapping_mul(31).wrapping_add(u64::from(page)) as usize) % shuffled.len();
    shuffled.rotate_left(rotation);
    if seed.wrapping_add(u64::from(page)) % 2 == 1 {
        shuffled.reverse();
    }
    shuffled
}

proptest! {
    #[test]
    fn traversal_visits_every_row_once(
        rows in rows_strategy(),
        (sort_key, direction) in sort_strategy(),
        page_size in 1u32..8,
        seed in any::<u64>(),
    ) {
        let base = QueryParams::new(EntityKind::Parking, page_size).sorted_by(sort_key, direction);
        let total = rows.len() as u64;
        let pages = total.div_ceil(u64::from(page_size)).max(1) as u32;

        let mut seen: HashMap<String, usize> = HashMap::new();
        for page in 1..=pages {
            let query = build(&base.clone().at_page(page));
            let result = apply_query(&reshuffle(&rows, seed, page), &query);
            prop_assert_eq!(result.total_count, total);
            for row in result.rows {
                let id = row.id.map(|id| id.to_string()).unwrap_or_default();
                *seen.entry(id).or_default() += 1;
            }
        }

        prop_assert_eq!(seen.len(), rows.len());
        prop_assert!(seen.values().all(|count| *count == 1), "repeated rows: {:?}", seen);
    }

    #[test]
    fn search_results_partition_into_pages(
        rows in rows_strategy(),
        page_size in 1u32..8,
    ) {
        let base = QueryParams::new(EntityKind::Parking, page_size)
            .with_search("a")
            .sorted_by(SortKey::Name, SortDirection::Ascending);
        let first = apply_query(&rows, &build(&base));
        let matching = rows.iter().filter(|r| r.name.to_lowercase().contains('a')
            || r.city.as_deref().is_some_and(|c| c.to_lowercase().contains('a'))).count();
        prop_assert_eq!(first.total_count, matching as u64);
        prop_assert!(first.rows.len() <= page_size as usize);
    }
}
