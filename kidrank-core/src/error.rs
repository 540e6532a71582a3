/// Error type for the ranking engine.
///
/// Rating, pairing, and classification are total functions and never fail;
/// only store access, id resolution, and session validation can.
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A referenced item id does not exist for this subject.
    #[error("item {0} not found")]
    ItemNotFound(Uuid),

    /// A comparison was submitted with the same item on both sides.
    #[error("item {0} cannot be compared against itself")]
    SelfComparison(Uuid),

    /// The reported winner is not a member of the session's current pair.
    #[error("item {0} is not part of the current pair")]
    NotInCurrentPair(Uuid),

    /// `answer` was called on a session with no questions left.
    #[error("survey session is already complete")]
    SessionComplete,

    /// A saved session failed revalidation; the caller must start a fresh
    /// survey. This is a staleness guard, not an integrity check.
    #[error("saved session is stale: {0}")]
    StaleSession(&'static str),

    /// A saved session blob could not be decoded at all.
    #[error("malformed session blob: {0}")]
    InvalidSession(#[from] serde_json::Error),

    /// The store detected a concurrent write (version mismatch). Retried
    /// internally; surfaced only by store implementations.
    #[error("concurrent write detected")]
    StoreConflict,

    /// A read-modify-write kept conflicting and was abandoned.
    #[error("write failed after {attempts} conflicting attempts")]
    WriteFailed { attempts: usize },

    /// The persistence collaborator failed (IO, corrupt document, ...).
    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
