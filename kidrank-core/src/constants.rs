/// Starting rating assigned to every new item.
/// 1200 is the conventional neutral anchor; all movement is relative to it.
pub const BASE_RATING: f64 = 1200.0;

/// Flat bonus applied to the starting rating of items flagged age-appropriate
/// at creation time.
pub const AGE_APPROPRIATE_BONUS: f64 = 25.0;

/// Starting uncertainty for an item with zero comparisons.
///
/// Uncertainty shrinks with the square root of the comparison count
/// (Glicko-inspired), so an item needs roughly 4 comparisons to halve it
/// and is never fully "settled" — preferences drift, especially for kids.
pub const INITIAL_UNCERTAINTY: f64 = 350.0;

/// Probability that a selection round explores (picks the most uncertain
/// pair) instead of exploiting (picks the most informative pair).
pub const EXPLORATION_RATE: f64 = 0.2;

/// Exploitation bonus for pairs whose two items sit in different categories.
pub const DIVERSITY_BONUS: f64 = 300.0;

/// Base value for the similarity term (`1000 - |rating difference|`) and the
/// ceiling of the recency term. A never-compared pair earns the full recency
/// score; it decays by one point per day since the most recent comparison of
/// either member.
pub const SCORE_BASE: f64 = 1000.0;

/// Below this many items the pair universe skips the diversity filter —
/// with so few items, excluding same-category pairs starves the pool.
pub const MIN_ITEMS_FOR_DIVERSE_PAIRS: usize = 5;

/// Minimum item count before tier classification produces anything other
/// than `uncategorized`.
pub const MIN_ITEMS_FOR_TIERS: usize = 3;

/// Fraction of the (rating-sorted) list placed in the top and bottom tiers.
pub const TIER_FRACTION: f64 = 0.25;

/// A saved survey session older than this is discarded on resume.
pub const SESSION_MAX_AGE_DAYS: i64 = 7;

/// How many times a read-modify-write is retried after a version conflict
/// before giving up with a write failure.
pub const MAX_SAVE_ATTEMPTS: usize = 3;
