/// Pair universe generation and adaptive (epsilon-greedy) pair selection.
///
/// Public functions accept `&[Item]` and return owned item pairs. Internal
/// functions use `usize` indices into the slice.
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::constants::{
    DIVERSITY_BONUS, EXPLORATION_RATE, MIN_ITEMS_FOR_DIVERSE_PAIRS, SCORE_BASE,
};
use crate::types::{IndexedPair, Item};

/// All comparison-eligible unordered pairs, deduplicated, no self-pairs.
///
/// Prefers pairs whose category or subcategory differ. The filter is skipped
/// when fewer than 5 items exist, and abandoned when it would leave fewer
/// pairs than `requested` — a starved pool is worse than a same-category
/// question.
pub(crate) fn pair_universe(items: &[Item], requested: usize) -> Vec<IndexedPair> {
    if items.len() < 2 {
        return Vec::new();
    }

    let mut all: Vec<IndexedPair> = Vec::new();
    let mut diverse: Vec<IndexedPair> = Vec::new();

    for i in 0..items.len() {
        for j in (i + 1)..items.len() {
            all.push((i, j));
            if items[i].category != items[j].category
                || items[i].subcategory != items[j].subcategory
            {
                diverse.push((i, j));
            }
        }
    }

    if items.len() < MIN_ITEMS_FOR_DIVERSE_PAIRS || diverse.len() < requested {
        all
    } else {
        diverse
    }
}

/// A candidate pair with its two bandit scores.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScoredPair {
    pub pair: IndexedPair,
    /// Combined uncertainty of both members — what we'd learn about shaky
    /// estimates.
    pub exploration: f64,
    /// Similarity + recency + diversity — how informative the matchup is.
    pub exploitation: f64,
}

/// Recency term: a never-compared pair earns the full base score; otherwise
/// it decays by one point per day since the *most recently* compared member.
fn recency_score(a: &Item, b: &Item, now: DateTime<Utc>) -> f64 {
    let most_recent = match (a.last_compared_at, b.last_compared_at) {
        (None, None) => return SCORE_BASE,
        (Some(t), None) | (None, Some(t)) => t,
        (Some(ta), Some(tb)) => ta.max(tb),
    };
    let days = (now - most_recent).num_seconds() as f64 / 86_400.0;
    SCORE_BASE - days.min(SCORE_BASE)
}

pub(crate) fn score_pair(items: &[Item], pair: IndexedPair, now: DateTime<Utc>) -> ScoredPair {
    let (a, b) = (&items[pair.0], &items[pair.1]);

    let similarity = SCORE_BASE - (a.rating - b.rating).abs();
    let recency = recency_score(a, b, now);
    let diversity = if a.category != b.category {
        DIVERSITY_BONUS
    } else {
        0.0
    };

    ScoredPair {
        pair,
        exploration: a.uncertainty + b.uncertainty,
        exploitation: similarity + recency + diversity,
    }
}

/// Select up to `count` pairs for the next survey round.
///
/// Fewer than 2 items yields an empty list — that is the expected steady
/// state for a new subject, not an error.
pub fn select_pairs(items: &[Item], count: usize, now: DateTime<Utc>) -> Vec<(Item, Item)> {
    let mut rng = rand::rng();
    select_pairs_with(items, count, now, &mut rng)
        .into_iter()
        .map(|(i, j)| (items[i].clone(), items[j].clone()))
        .collect()
}

/// Epsilon-greedy selection over the scored universe.
///
/// Each round either explores (highest combined uncertainty) or exploits
/// (highest similarity + recency + diversity). A consecutive-category guard
/// swaps out picks that would repeat the previous pair's shared category.
/// When the universe is no larger than `count` there is nothing to rank, so
/// the whole universe is returned in randomized order.
pub(crate) fn select_pairs_with(
    items: &[Item],
    count: usize,
    now: DateTime<Utc>,
    rng: &mut impl Rng,
) -> Vec<IndexedPair> {
    let mut universe = pair_universe(items, count);
    if universe.is_empty() {
        return universe;
    }

    if universe.len() <= count {
        universe.shuffle(rng);
        return universe;
    }

    let mut candidates: Vec<ScoredPair> = universe
        .iter()
        .map(|&pair| score_pair(items, pair, now))
        .collect();

    let mut selected: Vec<IndexedPair> = Vec::with_capacity(count);
    let mut last_category: Option<&str> = None;

    while selected.len() < count && !candidates.is_empty() {
        let explore = rng.random::<f64>() < EXPLORATION_RATE;

        // First strict maximum, so ties resolve by insertion order.
        let mut pick = 0;
        for i in 1..candidates.len() {
            let (current, best) = if explore {
                (candidates[i].exploration, candidates[pick].exploration)
            } else {
                (candidates[i].exploitation, candidates[pick].exploitation)
            };
            if current > best {
                pick = i;
            }
        }

        // Avoid asking two same-category questions back to back: if the
        // previous pair was wholly in category C and this one is too, take
        // the first remaining candidate that is not.
        if let Some(category) = last_category {
            let (a, b) = candidates[pick].pair;
            if items[a].category == category && items[b].category == category {
                let alternative = candidates.iter().position(|c| {
                    let (x, y) = c.pair;
                    items[x].category != category || items[y].category != category
                });
                if let Some(alt) = alternative {
                    pick = alt;
                }
            }
        }

        let chosen = candidates.remove(pick);
        let (a, b) = chosen.pair;
        last_category = if items[a].category == items[b].category {
            Some(items[a].category.as_str())
        } else {
            None
        };
        selected.push(chosen.pair);
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewItem;
    use chrono::Duration;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use uuid::Uuid;

    fn item(name: &str, category: &str, subcategory: Option<&str>) -> Item {
        let now = Utc::now();
        let new = NewItem::new(name, category);
        Item {
            id: Uuid::new_v4(),
            name: new.name,
            category: new.category,
            subcategory: subcategory.map(str::to_string),
            details: String::new(),
            notes: String::new(),
            source: Default::default(),
            specifics: Default::default(),
            added_at: now,
            rating: 1200.0,
            comparisons: 0,
            uncertainty: 350.0,
            last_compared_at: None,
            history: Vec::new(),
            gifts: Vec::new(),
        }
    }

    fn items(n: usize) -> Vec<Item> {
        (0..n)
            .map(|i| item(&format!("item-{i}"), &format!("cat-{i}"), None))
            .collect()
    }

    #[test]
    fn test_universe_empty_below_two_items() {
        assert!(pair_universe(&[], 10).is_empty());
        assert!(pair_universe(&items(1), 10).is_empty());
    }

    #[test]
    fn test_universe_has_no_self_pairs_and_no_duplicates() {
        let pool = items(6);
        let universe = pair_universe(&pool, 100);
        for &(a, b) in &universe {
            assert_ne!(a, b);
            assert!(a < b);
        }
        let mut seen = std::collections::HashSet::new();
        for pair in &universe {
            assert!(seen.insert(*pair), "duplicate pair {pair:?}");
        }
    }

    #[test]
    fn test_universe_is_complete_for_small_lists() {
        // 4 items, all same category: diversity filter is skipped entirely.
        let pool: Vec<Item> = (0..4).map(|i| item(&format!("i{i}"), "toys", None)).collect();
        assert_eq!(pair_universe(&pool, 3).len(), 6);
    }

    #[test]
    fn test_universe_filters_same_category_pairs() {
        // 6 items in 2 categories: the 6 within-category pairs are dropped
        // when the cross-category pool covers the request.
        let mut pool: Vec<Item> = (0..3).map(|i| item(&format!("a{i}"), "toys", None)).collect();
        pool.extend((0..3).map(|i| item(&format!("b{i}"), "books", None)));
        let universe = pair_universe(&pool, 5);
        assert_eq!(universe.len(), 9);
        for &(a, b) in &universe {
            assert_ne!(
                (pool[a].category.as_str(), &pool[a].subcategory),
                (pool[b].category.as_str(), &pool[b].subcategory)
            );
        }
    }

    #[test]
    fn test_universe_falls_back_when_diverse_pool_is_too_small() {
        // 5 items, one odd category: only 4 diverse pairs exist, so a
        // request for 8 reverts to the unrestricted 10.
        let mut pool: Vec<Item> = (0..4).map(|i| item(&format!("a{i}"), "toys", None)).collect();
        pool.push(item("b", "books", None));
        assert_eq!(pair_universe(&pool, 8).len(), 10);
        assert_eq!(pair_universe(&pool, 3).len(), 4);
    }

    #[test]
    fn test_subcategory_differences_count_as_diverse() {
        let mut pool: Vec<Item> = (0..5)
            .map(|i| item(&format!("i{i}"), "toys", Some("plush")))
            .collect();
        pool[4].subcategory = Some("building".to_string());
        // Within the 5 same-category items, only pairs touching the odd
        // subcategory survive the filter.
        assert_eq!(pair_universe(&pool, 2).len(), 4);
    }

    #[test]
    fn test_select_returns_whole_universe_when_exhausted() {
        let pool = items(4); // 6 possible pairs
        let mut rng = StdRng::seed_from_u64(7);
        let picked = select_pairs_with(&pool, 10, Utc::now(), &mut rng);
        assert_eq!(picked.len(), 6);
        let mut seen = std::collections::HashSet::new();
        for pair in &picked {
            assert!(seen.insert(*pair));
        }
    }

    #[test]
    fn test_select_respects_count() {
        let pool = items(8); // 28 possible pairs
        let mut rng = StdRng::seed_from_u64(7);
        let picked = select_pairs_with(&pool, 5, Utc::now(), &mut rng);
        assert_eq!(picked.len(), 5);
    }

    #[test]
    fn test_select_empty_for_single_item() {
        assert!(select_pairs(&items(1), 10, Utc::now()).is_empty());
        assert!(select_pairs(&[], 10, Utc::now()).is_empty());
    }

    #[test]
    fn test_similarity_prefers_close_ratings() {
        let now = Utc::now();
        let mut pool = items(3);
        pool[0].rating = 1200.0;
        pool[1].rating = 1210.0;
        pool[2].rating = 1700.0;
        let close = score_pair(&pool, (0, 1), now);
        let far = score_pair(&pool, (0, 2), now);
        assert!(close.exploitation > far.exploitation);
    }

    #[test]
    fn test_recency_decays_with_time_since_comparison() {
        let now = Utc::now();
        let mut pool = items(4);
        pool[0].last_compared_at = Some(now - Duration::days(100));
        pool[1].last_compared_at = Some(now - Duration::days(100));
        pool[2].last_compared_at = Some(now - Duration::days(2000));
        pool[3].last_compared_at = None;

        let never = recency_score(&pool[3], &pool[3], now);
        let recent = recency_score(&pool[0], &pool[1], now);
        let ancient = recency_score(&pool[2], &pool[2], now);
        assert_eq!(never, 1000.0);
        assert!((recent - 900.0).abs() < 1.0);
        // Floors at zero once the window is exhausted.
        assert_eq!(ancient, 0.0);
        // The most recent member drives the pair's score.
        let mixed = recency_score(&pool[0], &pool[2], now);
        assert!((mixed - 900.0).abs() < 1.0);
    }

    #[test]
    fn test_exploration_tracks_uncertainty() {
        let now = Utc::now();
        let mut pool = items(3);
        pool[0].uncertainty = 350.0;
        pool[1].uncertainty = 350.0;
        pool[2].uncertainty = 50.0;
        let shaky = score_pair(&pool, (0, 1), now);
        let settled = score_pair(&pool, (0, 2), now);
        assert!(shaky.exploration > settled.exploration);
    }

    #[test]
    fn test_no_three_consecutive_same_category_picks() {
        // A pool dominated by one category, with cross-category escapes
        // available. The guard must prevent back-to-back picks that are both
        // wholly inside the same category.
        let mut pool: Vec<Item> = (0..6).map(|i| item(&format!("t{i}"), "toys", None)).collect();
        pool.push(item("book", "books", None));
        pool.push(item("song", "music", None));

        // 28 total pairs, 13 cross-category. Requesting 14 forces the
        // unrestricted universe, so same-category candidates are in play.
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = select_pairs_with(&pool, 14, Utc::now(), &mut rng);
            for window in picked.windows(2) {
                let (a, b) = window[0];
                let (c, d) = window[1];
                let first_shared = pool[a].category == pool[b].category;
                let both_again = first_shared
                    && pool[c].category == pool[a].category
                    && pool[d].category == pool[a].category;
                // A repeat is only legitimate if no alternative existed at
                // pick time; with 13 cross-category pairs available it never
                // is here.
                assert!(!both_again, "seed {seed}: consecutive picks stuck in one category");
            }
        }
    }
}
