/// JSON-file-backed item store: one document per subject under the data
/// directory.
///
/// The version counter lives inside the document. `save` re-reads the file
/// to check the expected version, then writes to a temp file and renames,
/// so a single save is atomic and interleaved writers surface as
/// `StoreConflict` (which the engine retries).
use std::fs;
use std::path::{Path, PathBuf};

use kidrank_core::{EngineError, ItemStore, Profile, Result, Versioned};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
struct StoredDoc {
    version: u64,
    profile: Profile,
}

pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)
            .map_err(|e| EngineError::Backend(format!("cannot create {}: {e}", dir.display())))?;
        Ok(JsonFileStore { dir })
    }

    fn subject_path(&self, subject_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize(subject_id)))
    }
}

/// Keep subject-derived file names shell- and filesystem-safe.
fn sanitize(subject_id: &str) -> String {
    subject_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect()
}

/// Where survey progress for a subject is parked between runs.
pub fn session_path(dir: &Path, subject_id: &str) -> PathBuf {
    dir.join(format!("{}.session.json", sanitize(subject_id)))
}

fn read_doc(path: &Path) -> Result<Option<StoredDoc>> {
    match fs::read_to_string(path) {
        Ok(content) => {
            let doc = serde_json::from_str(&content).map_err(|e| {
                EngineError::Backend(format!("corrupt profile document {}: {e}", path.display()))
            })?;
            Ok(Some(doc))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(EngineError::Backend(format!(
            "cannot read {}: {e}",
            path.display()
        ))),
    }
}

impl ItemStore for JsonFileStore {
    fn load(&self, subject_id: &str) -> Result<Versioned<Profile>> {
        Ok(match read_doc(&self.subject_path(subject_id))? {
            Some(doc) => Versioned {
                value: doc.profile,
                version: doc.version,
            },
            None => Versioned {
                value: Profile::default(),
                version: 0,
            },
        })
    }

    fn save(&self, subject_id: &str, profile: Profile, expected_version: u64) -> Result<()> {
        let path = self.subject_path(subject_id);
        let current = read_doc(&path)?.map(|doc| doc.version).unwrap_or(0);
        if current != expected_version {
            return Err(EngineError::StoreConflict);
        }

        let doc = StoredDoc {
            version: current + 1,
            profile,
        };
        let content = serde_json::to_string_pretty(&doc)
            .map_err(|e| EngineError::Backend(format!("cannot encode profile: {e}")))?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content)
            .map_err(|e| EngineError::Backend(format!("cannot write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &path)
            .map_err(|e| EngineError::Backend(format!("cannot replace {}: {e}", path.display())))?;
        Ok(())
    }
}
