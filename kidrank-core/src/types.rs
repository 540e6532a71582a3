/// Data shapes shared across the engine.
///
/// Items are identified by store-assigned `Uuid`s; subjects are opaque
/// caller-provided strings. All optional fields have documented defaults and
/// are normalized at the store boundary (`PreferenceEngine::add_item`).
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::INITIAL_UNCERTAINTY;

/// Where an item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[default]
    Manual,
    Survey,
    Suggestion,
}

/// One ranked entity (an interest) belonging to a subject.
///
/// `rating` is only ever mutated by the rating update rule, and
/// `uncertainty` is always `round(350 / sqrt(comparisons + 1))` — callers
/// never set either directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    /// Coarse grouping; participates in pair diversity. Defaults to "general".
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub source: Source,
    /// Free-form key-value details (platform, brand, ...).
    #[serde(default)]
    pub specifics: BTreeMap<String, String>,
    pub added_at: DateTime<Utc>,
    pub rating: f64,
    pub comparisons: u32,
    pub uncertainty: f64,
    #[serde(default)]
    pub last_compared_at: Option<DateTime<Utc>>,
    /// Append-only audit trail; not consulted by the ranking math.
    #[serde(default)]
    pub history: Vec<ComparisonRecord>,
    #[serde(default)]
    pub gifts: Vec<GiftRecord>,
}

impl Item {
    /// Confidence in this item's rating as a 0-100 percentage.
    /// The inverse of uncertainty: a fresh item (uncertainty 350) reads 0,
    /// a heavily compared one approaches 100.
    pub fn confidence(&self) -> f64 {
        (100.0 - self.uncertainty / (INITIAL_UNCERTAINTY / 100.0)).clamp(0.0, 100.0)
    }
}

/// Input for creating an item. Empty `category` falls back to "general".
#[derive(Debug, Clone, Default)]
pub struct NewItem {
    pub name: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub details: String,
    pub notes: String,
    pub source: Source,
    pub specifics: BTreeMap<String, String>,
    /// Grants a small starting-rating bonus when set.
    pub age_appropriate: bool,
}

impl NewItem {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        NewItem {
            name: name.into(),
            category: category.into(),
            ..NewItem::default()
        }
    }
}

/// Partial update for an item's descriptive fields. Rating state
/// (`rating`, `comparisons`, `uncertainty`, `history`) is never patchable.
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub details: Option<String>,
    pub notes: Option<String>,
    pub specifics: Option<BTreeMap<String, String>>,
}

/// Immutable record of a single comparison, appended to both participants'
/// histories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRecord {
    pub winner_id: Uuid,
    pub loser_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub winner_rating_before: f64,
    pub winner_rating_after: f64,
    pub loser_rating_before: f64,
    pub loser_rating_after: f64,
    pub winner_k: f64,
    pub loser_k: f64,
}

impl ComparisonRecord {
    /// The post-comparison rating this record assigned to `id`, if `id`
    /// participated.
    pub fn rating_after(&self, id: Uuid) -> Option<f64> {
        if self.winner_id == id {
            Some(self.winner_rating_after)
        } else if self.loser_id == id {
            Some(self.loser_rating_after)
        } else {
            None
        }
    }
}

/// A gift tied to an item, with an optional 1-5 reaction score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftRecord {
    pub id: Uuid,
    pub name: String,
    pub given_at: DateTime<Utc>,
    #[serde(default)]
    pub giver: Option<String>,
    #[serde(default)]
    pub occasion: Option<String>,
    #[serde(default)]
    pub reaction: Option<u8>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Input for recording a gift. `given_at` defaults to now.
#[derive(Debug, Clone, Default)]
pub struct NewGift {
    pub name: String,
    pub given_at: Option<DateTime<Utc>>,
    pub giver: Option<String>,
    pub occasion: Option<String>,
    pub reaction: Option<u8>,
    pub notes: Option<String>,
}

/// Preference tiers. A percentile partition of the rating-sorted item list;
/// `uncategorized` holds everything when there is too little data to tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierBuckets {
    pub loves: Vec<Item>,
    pub likes: Vec<Item>,
    pub passes: Vec<Item>,
    pub uncategorized: Vec<Item>,
}

impl TierBuckets {
    pub fn is_empty(&self) -> bool {
        self.loves.is_empty()
            && self.likes.is_empty()
            && self.passes.is_empty()
            && self.uncategorized.is_empty()
    }
}

/// Internal index pair into an item slice. Always stored with the lower
/// index first so (A,B) and (B,A) are the same pair.
pub(crate) type IndexedPair = (usize, usize);
