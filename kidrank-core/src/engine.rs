/// Engine facade: every operation a consumer needs, layered over an
/// `ItemStore`.
///
/// Reads are single loads. Mutations go through a read-modify-write loop
/// that retries on version conflict with fresh reads, so two devices
/// submitting comparisons for the same subject cannot overwrite each other.
use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::constants::{AGE_APPROPRIATE_BONUS, BASE_RATING, MAX_SAVE_ATTEMPTS};
use crate::error::{EngineError, Result};
use crate::pairing;
use crate::rating;
use crate::session::{SavedSession, SurveySession};
use crate::store::{ItemStore, Profile, Versioned};
use crate::tiers;
use crate::types::{
    ComparisonRecord, GiftRecord, Item, ItemPatch, NewGift, NewItem, TierBuckets,
};

pub struct PreferenceEngine<S> {
    store: S,
    max_save_attempts: usize,
}

impl<S: ItemStore> PreferenceEngine<S> {
    pub fn new(store: S) -> Self {
        PreferenceEngine {
            store,
            max_save_attempts: MAX_SAVE_ATTEMPTS,
        }
    }

    /// Run `apply` against a freshly loaded profile and persist the result,
    /// retrying on version conflict. `apply` must be safe to re-run — it is
    /// re-evaluated against the newest read on every attempt.
    fn modify<T>(&self, subject_id: &str, apply: impl Fn(&mut Profile) -> Result<T>) -> Result<T> {
        for attempt in 1..=self.max_save_attempts {
            let Versioned { mut value, version } = self.store.load(subject_id)?;
            let out = apply(&mut value)?;
            value.updated_at = Some(Utc::now());
            match self.store.save(subject_id, value, version) {
                Ok(()) => return Ok(out),
                Err(EngineError::StoreConflict) => {
                    warn!(subject_id, attempt, "write conflict, retrying with fresh read");
                    continue;
                }
                Err(other) => return Err(other),
            }
        }
        Err(EngineError::WriteFailed {
            attempts: self.max_save_attempts,
        })
    }

    pub fn items(&self, subject_id: &str) -> Result<Vec<Item>> {
        Ok(self.store.load(subject_id)?.value.items)
    }

    pub fn profile(&self, subject_id: &str) -> Result<Profile> {
        Ok(self.store.load(subject_id)?.value)
    }

    /// Create an item at the base rating (+ bonus when age-appropriate) with
    /// full starting uncertainty. Defaults are normalized here: an empty
    /// category becomes "general".
    pub fn add_item(&self, subject_id: &str, new: NewItem) -> Result<Item> {
        let id = Uuid::new_v4();
        let item = self.modify(subject_id, |profile| {
            let rating = if new.age_appropriate {
                BASE_RATING + AGE_APPROPRIATE_BONUS
            } else {
                BASE_RATING
            };
            let item = Item {
                id,
                name: new.name.clone(),
                category: if new.category.is_empty() {
                    "general".to_string()
                } else {
                    new.category.clone()
                },
                subcategory: new.subcategory.clone(),
                details: new.details.clone(),
                notes: new.notes.clone(),
                source: new.source,
                specifics: new.specifics.clone(),
                added_at: Utc::now(),
                rating,
                comparisons: 0,
                uncertainty: rating::uncertainty_for(0),
                last_compared_at: None,
                history: Vec::new(),
                gifts: Vec::new(),
            };
            profile.items.push(item.clone());
            Ok(item)
        })?;
        info!(subject_id, item_id = %id, name = %item.name, "item added");
        Ok(item)
    }

    /// Patch descriptive fields. Rating state and history pass through
    /// untouched regardless of what the patch carries.
    pub fn update_item(&self, subject_id: &str, item_id: Uuid, patch: ItemPatch) -> Result<Item> {
        self.modify(subject_id, |profile| {
            let item = profile
                .items
                .iter_mut()
                .find(|i| i.id == item_id)
                .ok_or(EngineError::ItemNotFound(item_id))?;
            if let Some(name) = &patch.name {
                item.name = name.clone();
            }
            if let Some(category) = &patch.category {
                item.category = category.clone();
            }
            if let Some(subcategory) = &patch.subcategory {
                item.subcategory = Some(subcategory.clone());
            }
            if let Some(details) = &patch.details {
                item.details = details.clone();
            }
            if let Some(notes) = &patch.notes {
                item.notes = notes.clone();
            }
            if let Some(specifics) = &patch.specifics {
                item.specifics = specifics.clone();
            }
            Ok(item.clone())
        })
    }

    pub fn remove_item(&self, subject_id: &str, item_id: Uuid) -> Result<()> {
        self.modify(subject_id, |profile| {
            let before = profile.items.len();
            profile.items.retain(|i| i.id != item_id);
            if profile.items.len() == before {
                return Err(EngineError::ItemNotFound(item_id));
            }
            Ok(())
        })
    }

    pub fn record_gift(&self, subject_id: &str, item_id: Uuid, gift: NewGift) -> Result<GiftRecord> {
        let id = Uuid::new_v4();
        self.modify(subject_id, |profile| {
            let item = profile
                .items
                .iter_mut()
                .find(|i| i.id == item_id)
                .ok_or(EngineError::ItemNotFound(item_id))?;
            let record = GiftRecord {
                id,
                name: gift.name.clone(),
                given_at: gift.given_at.unwrap_or_else(Utc::now),
                giver: gift.giver.clone(),
                occasion: gift.occasion.clone(),
                reaction: gift.reaction,
                notes: gift.notes.clone(),
            };
            item.gifts.push(record.clone());
            Ok(record)
        })
    }

    /// Apply one comparison outcome: update both ratings, bump both
    /// comparison counts, append the record to both histories. Both items
    /// persist atomically or not at all. Repeated submissions of the same
    /// pair are independent data points.
    pub fn record_comparison(
        &self,
        subject_id: &str,
        winner_id: Uuid,
        loser_id: Uuid,
    ) -> Result<ComparisonRecord> {
        if winner_id == loser_id {
            return Err(EngineError::SelfComparison(winner_id));
        }

        let record = self.modify(subject_id, |profile| {
            let winner_idx = profile
                .items
                .iter()
                .position(|i| i.id == winner_id)
                .ok_or(EngineError::ItemNotFound(winner_id))?;
            let loser_idx = profile
                .items
                .iter()
                .position(|i| i.id == loser_id)
                .ok_or(EngineError::ItemNotFound(loser_id))?;

            let winner = &profile.items[winner_idx];
            let loser = &profile.items[loser_idx];
            let update = rating::update(
                winner.rating,
                winner.comparisons,
                loser.rating,
                loser.comparisons,
            );

            let now = Utc::now();
            let record = ComparisonRecord {
                winner_id,
                loser_id,
                recorded_at: now,
                winner_rating_before: winner.rating,
                winner_rating_after: update.winner_rating,
                loser_rating_before: loser.rating,
                loser_rating_after: update.loser_rating,
                winner_k: update.winner_k,
                loser_k: update.loser_k,
            };

            let winner = &mut profile.items[winner_idx];
            winner.rating = update.winner_rating;
            winner.uncertainty = update.winner_uncertainty;
            winner.comparisons += 1;
            winner.last_compared_at = Some(now);
            winner.history.push(record.clone());

            let loser = &mut profile.items[loser_idx];
            loser.rating = update.loser_rating;
            loser.uncertainty = update.loser_uncertainty;
            loser.comparisons += 1;
            loser.last_compared_at = Some(now);
            loser.history.push(record.clone());

            Ok(record)
        })?;

        info!(
            subject_id,
            winner = %winner_id,
            loser = %loser_id,
            winner_rating = record.winner_rating_after,
            loser_rating = record.loser_rating_after,
            "comparison recorded"
        );
        Ok(record)
    }

    pub fn classified(&self, subject_id: &str) -> Result<TierBuckets> {
        Ok(tiers::classify(&self.items(subject_id)?))
    }

    pub fn top_items(&self, subject_id: &str, n: usize) -> Result<Vec<Item>> {
        Ok(tiers::top_items(&self.items(subject_id)?, n))
    }

    pub fn category_scores(&self, subject_id: &str) -> Result<BTreeMap<String, i64>> {
        Ok(tiers::category_scores(&self.items(subject_id)?, Utc::now()))
    }

    pub fn rising_items(&self, subject_id: &str) -> Result<Vec<Item>> {
        Ok(tiers::rising_items(&self.items(subject_id)?))
    }

    /// Pick the next `count` comparison questions. An empty result means
    /// there is not enough data to compare yet — an expected state for new
    /// subjects, not an error.
    pub fn generate_survey_pairs(&self, subject_id: &str, count: usize) -> Result<Vec<(Item, Item)>> {
        let items = self.items(subject_id)?;
        let pairs = pairing::select_pairs(&items, count, Utc::now());
        debug!(subject_id, requested = count, selected = pairs.len(), "survey pairs generated");
        Ok(pairs)
    }

    pub fn start_session(&self, subject_id: &str, count: usize) -> Result<SurveySession> {
        let pairs = self.generate_survey_pairs(subject_id, count)?;
        Ok(SurveySession {
            subject_id: subject_id.to_string(),
            pairs: pairs.iter().map(|(a, b)| (a.id, b.id)).collect(),
            current_index: 0,
            results: Vec::new(),
            created_at: Utc::now(),
        })
    }

    /// Answer the current question: `winner_id` must be one member of the
    /// current pair; the other member is the loser. Advances the session.
    pub fn answer(&self, session: &mut SurveySession, winner_id: Uuid) -> Result<ComparisonRecord> {
        let (a, b) = session.current_pair().ok_or(EngineError::SessionComplete)?;
        let loser_id = if winner_id == a {
            b
        } else if winner_id == b {
            a
        } else {
            return Err(EngineError::NotInCurrentPair(winner_id));
        };

        let record = self.record_comparison(&session.subject_id, winner_id, loser_id)?;
        session.results.push(record.clone());
        session.current_index += 1;
        Ok(record)
    }

    /// Rebuild a session from an untrusted saved blob, revalidating shape
    /// and staleness against the subject's current items.
    pub fn resume_session(&self, blob: &str) -> Result<SurveySession> {
        let saved = SavedSession::from_json(blob)?;
        let items = self.items(&saved.subject_id)?;
        saved.resume(&items, Utc::now())
    }

    /// Mark the survey finished and discard the session. Stamps the
    /// profile's `last_survey_at`.
    pub fn complete_session(&self, session: SurveySession) -> Result<()> {
        self.modify(&session.subject_id, |profile| {
            profile.last_survey_at = Some(Utc::now());
            Ok(())
        })
    }
}
