/// Resumable survey sessions.
///
/// A session references items by id only — item state is always re-resolved
/// from the store, never embedded. The saved form is a JSON blob the engine
/// treats as untrusted input: shape and staleness are revalidated on resume.
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::SESSION_MAX_AGE_DAYS;
use crate::error::{EngineError, Result};
use crate::pairing;
use crate::types::{ComparisonRecord, Item};

/// An in-progress survey: a bounded sequence of pair questions.
#[derive(Debug, Clone)]
pub struct SurveySession {
    pub subject_id: String,
    pub pairs: Vec<(Uuid, Uuid)>,
    pub current_index: usize,
    pub results: Vec<ComparisonRecord>,
    pub created_at: DateTime<Utc>,
}

impl SurveySession {
    /// The pair currently awaiting an answer, or `None` once complete.
    pub fn current_pair(&self) -> Option<(Uuid, Uuid)> {
        self.pairs.get(self.current_index).copied()
    }

    pub fn is_complete(&self) -> bool {
        self.current_index >= self.pairs.len()
    }

    /// Snapshot this session for client-side persistence.
    pub fn to_saved(&self, now: DateTime<Utc>) -> SavedSession {
        SavedSession {
            subject_id: self.subject_id.clone(),
            pairs: self.pairs.clone(),
            current_index: self.current_index,
            results: self.results.clone(),
            pair_count: self.pairs.len(),
            saved_at: now,
        }
    }
}

/// The serialized session format. `pair_count` duplicates `pairs.len()` on
/// purpose: it is the cheap staleness-check field, and a mismatch means the
/// blob was hand-edited or truncated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedSession {
    pub subject_id: String,
    pub pairs: Vec<(Uuid, Uuid)>,
    pub current_index: usize,
    pub results: Vec<ComparisonRecord>,
    pub pair_count: usize,
    pub saved_at: DateTime<Utc>,
}

impl SavedSession {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(blob: &str) -> Result<SavedSession> {
        Ok(serde_json::from_str(blob)?)
    }

    /// Revalidate against the subject's current items and turn the blob back
    /// into a live session.
    ///
    /// Rejections are all `StaleSession` — the caller's recovery is the same
    /// in every case: discard and start a fresh survey.
    pub fn resume(self, items: &[Item], now: DateTime<Utc>) -> Result<SurveySession> {
        if self.pair_count != self.pairs.len() {
            return Err(EngineError::StaleSession("pair count does not match saved pairs"));
        }
        if self.current_index > self.pairs.len() {
            return Err(EngineError::StaleSession("progress index out of range"));
        }
        if now - self.saved_at > Duration::days(SESSION_MAX_AGE_DAYS) {
            return Err(EngineError::StaleSession("saved more than 7 days ago"));
        }

        // The pool a fresh start would draw from must still cover this
        // session. Item churn since the save shows up here.
        let fresh = pairing::pair_universe(items, self.pair_count);
        if fresh.len() < self.pair_count {
            return Err(EngineError::StaleSession("interest list changed since the save"));
        }
        let known: std::collections::HashSet<Uuid> = items.iter().map(|i| i.id).collect();
        for (a, b) in &self.pairs {
            if !known.contains(a) || !known.contains(b) {
                return Err(EngineError::StaleSession("a saved interest no longer exists"));
            }
        }

        Ok(SurveySession {
            subject_id: self.subject_id,
            pairs: self.pairs,
            current_index: self.current_index,
            results: self.results,
            created_at: self.saved_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewItem;

    fn item(name: &str, category: &str) -> Item {
        let new = NewItem::new(name, category);
        Item {
            id: Uuid::new_v4(),
            name: new.name,
            category: new.category,
            subcategory: None,
            details: String::new(),
            notes: String::new(),
            source: Default::default(),
            specifics: Default::default(),
            added_at: Utc::now(),
            rating: 1200.0,
            comparisons: 0,
            uncertainty: 350.0,
            last_compared_at: None,
            history: Vec::new(),
            gifts: Vec::new(),
        }
    }

    fn session_for(items: &[Item]) -> SurveySession {
        SurveySession {
            subject_id: "child-1".to_string(),
            pairs: vec![(items[0].id, items[1].id), (items[1].id, items[2].id)],
            current_index: 1,
            results: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_blob_round_trip() {
        let items: Vec<Item> = (0..3).map(|i| item(&format!("i{i}"), &format!("c{i}"))).collect();
        let session = session_for(&items);
        let now = Utc::now();

        let blob = session.to_saved(now).to_json().unwrap();
        let restored = SavedSession::from_json(&blob)
            .unwrap()
            .resume(&items, now)
            .unwrap();

        assert_eq!(restored.subject_id, "child-1");
        assert_eq!(restored.pairs, session.pairs);
        assert_eq!(restored.current_index, 1);
    }

    #[test]
    fn test_malformed_blob_is_rejected() {
        assert!(matches!(
            SavedSession::from_json("{not json"),
            Err(EngineError::InvalidSession(_))
        ));
    }

    #[test]
    fn test_old_session_is_stale() {
        let items: Vec<Item> = (0..3).map(|i| item(&format!("i{i}"), &format!("c{i}"))).collect();
        let session = session_for(&items);
        let saved = session.to_saved(Utc::now() - Duration::days(8));

        assert!(matches!(
            saved.resume(&items, Utc::now()),
            Err(EngineError::StaleSession(_))
        ));
    }

    #[test]
    fn test_session_saved_six_days_ago_still_resumes() {
        let items: Vec<Item> = (0..3).map(|i| item(&format!("i{i}"), &format!("c{i}"))).collect();
        let session = session_for(&items);
        let saved = session.to_saved(Utc::now() - Duration::days(6));
        assert!(saved.resume(&items, Utc::now()).is_ok());
    }

    #[test]
    fn test_tampered_pair_count_is_stale() {
        let items: Vec<Item> = (0..3).map(|i| item(&format!("i{i}"), &format!("c{i}"))).collect();
        let mut saved = session_for(&items).to_saved(Utc::now());
        saved.pair_count = 5;
        assert!(matches!(
            saved.resume(&items, Utc::now()),
            Err(EngineError::StaleSession(_))
        ));
    }

    #[test]
    fn test_removed_item_makes_session_stale() {
        let items: Vec<Item> = (0..4).map(|i| item(&format!("i{i}"), &format!("c{i}"))).collect();
        let saved = session_for(&items).to_saved(Utc::now());
        // Drop a referenced item; plenty of pairs remain, but an id dangles.
        let remaining: Vec<Item> = items[1..].to_vec();
        assert!(matches!(
            saved.resume(&remaining, Utc::now()),
            Err(EngineError::StaleSession(_))
        ));
    }

    #[test]
    fn test_shrunk_pool_makes_session_stale() {
        let items: Vec<Item> = (0..3).map(|i| item(&format!("i{i}"), &format!("c{i}"))).collect();
        let saved = session_for(&items).to_saved(Utc::now());
        // Only one item left: the fresh pool is empty.
        let remaining = vec![items[0].clone()];
        assert!(matches!(
            saved.resume(&remaining, Utc::now()),
            Err(EngineError::StaleSession(_))
        ));
    }

    #[test]
    fn test_progress_tracking() {
        let items: Vec<Item> = (0..3).map(|i| item(&format!("i{i}"), &format!("c{i}"))).collect();
        let mut session = session_for(&items);
        assert!(!session.is_complete());
        assert_eq!(session.current_pair(), Some((items[1].id, items[2].id)));

        session.current_index = 2;
        assert!(session.is_complete());
        assert_eq!(session.current_pair(), None);
    }
}
