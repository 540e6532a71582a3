/// Item storage: the per-subject document and the store contract.
///
/// A comparison is a read-modify-write touching two items at once, so the
/// contract is versioned: `save` carries the version the caller read, and a
/// mismatch fails with `StoreConflict` instead of silently losing an update.
/// The engine retries conflicts with fresh reads.
use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::types::Item;

/// Everything stored for one subject.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub last_survey_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A value plus the store version it was read at.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub value: T,
    pub version: u64,
}

/// Persistence collaborator for per-subject profiles.
///
/// `load` of an unknown subject returns an empty profile at version 0, so
/// new subjects need no explicit creation step. `save` succeeds only when
/// `expected_version` matches the stored version, and bumps it.
pub trait ItemStore {
    fn load(&self, subject_id: &str) -> Result<Versioned<Profile>>;
    fn save(&self, subject_id: &str, profile: Profile, expected_version: u64) -> Result<()>;
}

/// In-memory store. The reference implementation for tests and embedders
/// that bring their own persistence elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, (u64, Profile)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl ItemStore for MemoryStore {
    fn load(&self, subject_id: &str) -> Result<Versioned<Profile>> {
        let inner = self.inner.lock().unwrap();
        Ok(match inner.get(subject_id) {
            Some((version, profile)) => Versioned {
                value: profile.clone(),
                version: *version,
            },
            None => Versioned {
                value: Profile::default(),
                version: 0,
            },
        })
    }

    fn save(&self, subject_id: &str, profile: Profile, expected_version: u64) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let current = inner.get(subject_id).map(|(v, _)| *v).unwrap_or(0);
        if current != expected_version {
            return Err(EngineError::StoreConflict);
        }
        inner.insert(subject_id.to_string(), (current + 1, profile));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_subject_loads_empty_at_version_zero() {
        let store = MemoryStore::new();
        let loaded = store.load("nobody").unwrap();
        assert_eq!(loaded.version, 0);
        assert!(loaded.value.items.is_empty());
    }

    #[test]
    fn test_save_bumps_version() {
        let store = MemoryStore::new();
        store.save("s", Profile::default(), 0).unwrap();
        assert_eq!(store.load("s").unwrap().version, 1);
        store.save("s", Profile::default(), 1).unwrap();
        assert_eq!(store.load("s").unwrap().version, 2);
    }

    #[test]
    fn test_stale_save_conflicts() {
        let store = MemoryStore::new();
        store.save("s", Profile::default(), 0).unwrap();
        // A writer that read version 0 is now behind.
        assert!(matches!(
            store.save("s", Profile::default(), 0),
            Err(EngineError::StoreConflict)
        ));
    }

    #[test]
    fn test_subjects_are_independent() {
        let store = MemoryStore::new();
        store.save("a", Profile::default(), 0).unwrap();
        assert_eq!(store.load("b").unwrap().version, 0);
    }
}
