/// Tier classification and derived preference summaries.
///
/// Everything here is a pure, deterministic function of an item slice.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::constants::{MIN_ITEMS_FOR_TIERS, TIER_FRACTION};
use crate::types::{Item, TierBuckets};

fn sorted_by_rating(items: &[Item]) -> Vec<Item> {
    let mut sorted = items.to_vec();
    sorted.sort_by(|a, b| b.rating.partial_cmp(&a.rating).unwrap_or(std::cmp::Ordering::Equal));
    sorted
}

/// Partition items into preference tiers.
///
/// With fewer than 3 items, or before any comparison has been answered,
/// everything lands in `uncategorized` — there is no signal to tier on.
/// Otherwise the rating-sorted list splits top 25% / middle / bottom 25%
/// (top and bottom hold at least one item each).
pub fn classify(items: &[Item]) -> TierBuckets {
    let sorted = sorted_by_rating(items);

    if items.len() < MIN_ITEMS_FOR_TIERS || !items.iter().any(|i| i.comparisons > 0) {
        return TierBuckets {
            uncategorized: sorted,
            ..TierBuckets::default()
        };
    }

    let n = sorted.len();
    let top = ((n as f64 * TIER_FRACTION).ceil() as usize).max(1);
    let bottom = ((n as f64 * TIER_FRACTION).ceil() as usize).max(1);
    let middle = n - top - bottom;

    let mut sorted = sorted;
    let passes = sorted.split_off(top + middle);
    let likes = sorted.split_off(top);

    TierBuckets {
        loves: sorted,
        likes,
        passes,
        uncategorized: Vec::new(),
    }
}

/// The `n` highest-rated items, best first.
pub fn top_items(items: &[Item], n: usize) -> Vec<Item> {
    let mut sorted = sorted_by_rating(items);
    sorted.truncate(n);
    sorted
}

/// Per-category preference weights, as percentages that sum to ~100.
///
/// Each item contributes its normalized rating, weighted up to 1.5x when it
/// was compared within the last 30 days (fresher signal counts for more).
pub fn category_scores(items: &[Item], now: DateTime<Utc>) -> BTreeMap<String, i64> {
    let mut totals: BTreeMap<String, (f64, usize)> = BTreeMap::new();

    for item in items {
        let recency_boost = match item.last_compared_at {
            Some(t) => {
                let elapsed = (now - t).num_seconds() as f64;
                (1.0 - elapsed / (30.0 * 86_400.0)).max(0.0)
            }
            None => 0.0,
        };
        let weight = 1.0 + recency_boost * 0.5;
        let normalized = ((item.rating - 800.0) / 800.0) * 100.0;

        let entry = totals.entry(item.category.clone()).or_insert((0.0, 0));
        entry.0 += normalized * weight;
        entry.1 += 1;
    }

    let mut scores: BTreeMap<String, i64> = totals
        .into_iter()
        .map(|(category, (sum, count))| (category, (sum / count as f64).round() as i64))
        .collect();

    let total: i64 = scores.values().sum();
    if total > 0 {
        for value in scores.values_mut() {
            *value = ((*value as f64 / total as f64) * 100.0).round() as i64;
        }
    }

    scores
}

/// Items whose rating rose across their last three recorded comparisons,
/// best-rated first. A cheap trend signal for "growing interest".
pub fn rising_items(items: &[Item]) -> Vec<Item> {
    let mut rising: Vec<Item> = items
        .iter()
        .filter(|item| {
            if item.history.len() < 3 {
                return false;
            }
            let recent = &item.history[item.history.len() - 3..];
            match (recent[0].rating_after(item.id), recent[2].rating_after(item.id)) {
                (Some(first), Some(last)) => last > first,
                _ => false,
            }
        })
        .cloned()
        .collect();
    rising.sort_by(|a, b| b.rating.partial_cmp(&a.rating).unwrap_or(std::cmp::Ordering::Equal));
    rising
}
