/// kidrank-core: Pairwise preference ranking engine.
///
/// Sparse "A over B" choices → Elo-style ratings with uncertainty → tiered
/// preferences, plus an adaptive selector that decides which pair to ask
/// about next. No filesystem, no network — bring your own store.
///
/// Subjects are identified by caller-provided opaque strings; items get
/// store-assigned `Uuid`s. All persistence goes through the [`ItemStore`]
/// trait, whose versioned save contract keeps concurrent comparison writes
/// from losing updates.
///
/// # Quick start
///
/// ```rust
/// use kidrank_core::{MemoryStore, NewItem, PreferenceEngine};
///
/// let engine = PreferenceEngine::new(MemoryStore::new());
/// let trains = engine.add_item("mia", NewItem::new("Trains", "vehicles")).unwrap();
/// let dinos = engine.add_item("mia", NewItem::new("Dinosaurs", "animals")).unwrap();
/// engine.add_item("mia", NewItem::new("Painting", "arts")).unwrap();
///
/// // Which comparisons are worth asking next?
/// let pairs = engine.generate_survey_pairs("mia", 2).unwrap();
/// assert!(!pairs.is_empty());
///
/// // Record an outcome and read back the tiers.
/// engine.record_comparison("mia", dinos.id, trains.id).unwrap();
/// let buckets = engine.classified("mia").unwrap();
/// assert_eq!(buckets.loves[0].name, "Dinosaurs");
/// ```

pub mod constants;
pub mod engine;
pub mod error;
pub mod pairing;
pub mod rating;
pub mod session;
pub mod store;
pub mod tiers;
pub mod types;

// Re-export primary public API at crate root.
pub use engine::PreferenceEngine;
pub use error::{EngineError, Result};
pub use pairing::select_pairs;
pub use session::{SavedSession, SurveySession};
pub use store::{ItemStore, MemoryStore, Profile, Versioned};
pub use tiers::{category_scores, classify, rising_items, top_items};
pub use types::{
    ComparisonRecord, GiftRecord, Item, ItemPatch, NewGift, NewItem, Source, TierBuckets,
};
