//! Error types for the casting engine.

use thiserror::Error;

/// Result type alias for casting operations.
pub type CastResult<T> = Result<T, CastError>;

/// Errors that can occur while editing or persisting casting state.
///
/// Group generation itself never fails: unsatisfiable constraints degrade to the
/// least-bad partition and cancellation yields no result. These variants cover
/// document errors and caller-usage mistakes.
#[derive(Error, Debug)]
pub enum CastError {
    /// Automerge error during document operations.
    #[error("Automerge error: {0}")]
    Automerge(#[from] automerge::AutomergeError),

    /// Autosurgeon hydration error.
    #[error("Hydration error: {0}")]
    Hydrate(#[from] autosurgeon::HydrateError),

    /// Autosurgeon reconcile error.
    #[error("Reconcile error: {0}")]
    Reconcile(#[from] autosurgeon::ReconcileError),

    /// Character group not found in the group list.
    #[error("Character group not found: {0}")]
    GroupNotFound(String),

    /// Voice actor not found in the roster.
    #[error("Voice actor not found: {0}")]
    ActorNotFound(String),

    /// Character id not present where the caller expected it.
    #[error("Character not found: {0}")]
    CharacterNotFound(String),

    /// A move or assignment was requested with no characters.
    #[error("No characters given to move to group {0}")]
    EmptyCharacterList(String),

    /// Schema violation - document structure is invalid.
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CastError {
    /// Creates a GroupNotFound error.
    pub fn group_not_found(id: impl Into<String>) -> Self {
        Self::GroupNotFound(id.into())
    }

    /// Creates an ActorNotFound error.
    pub fn actor_not_found(id: impl Into<String>) -> Self {
        Self::ActorNotFound(id.into())
    }

    /// Creates a CharacterNotFound error.
    pub fn character_not_found(id: impl Into<String>) -> Self {
        Self::CharacterNotFound(id.into())
    }

    /// Creates an EmptyCharacterList error.
    pub fn empty_character_list(group_id: impl Into<String>) -> Self {
        Self::EmptyCharacterList(group_id.into())
    }

    /// Creates a SchemaViolation error.
    pub fn schema_violation(msg: impl Into<String>) -> Self {
        Self::SchemaViolation(msg.into())
    }

    /// Creates a Serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}

impl From<serde_json::Error> for CastError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
