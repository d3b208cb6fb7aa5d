//! Error types for trance operations

use crate::{EntityId, Langcode, RevisionId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Kind of stored resource a lookup refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Entity,
    Revision,
}

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Not found: {kind:?} with id {id}")]
    NotFound { kind: ResourceKind, id: Uuid },

    #[error("No field definitions registered for entity type {entity_type}")]
    UnknownEntityType { entity_type: String },

    #[error(
        "Concurrent modification of entity {entity_id}: expected default revision {expected}, found {actual}"
    )]
    ConcurrentModification {
        entity_id: EntityId,
        expected: RevisionId,
        actual: RevisionId,
    },

    #[error("Insert failed for {kind:?}: {reason}")]
    InsertFailed { kind: ResourceKind, reason: String },

    #[error("Commit failed for entity {entity_id}: {reason}")]
    CommitFailed { entity_id: EntityId, reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Validation errors, raised before any mutation is attempted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Revision {revision_id} has no {langcode} translation")]
    TranslationNotFound {
        revision_id: RevisionId,
        langcode: Langcode,
    },

    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Unknown field {field} for entity type {entity_type}")]
    UnknownField { field: String, entity_type: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all trance errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TranceError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl TranceError {
    /// The referenced revision or entity no longer exists.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TranceError::Storage(StorageError::NotFound { .. }))
    }

    /// The requested locale is absent from the source revision.
    pub fn is_translation_not_found(&self) -> bool {
        matches!(
            self,
            TranceError::Validation(ValidationError::TranslationNotFound { .. })
        )
    }

    /// The default revision moved between read and commit.
    pub fn is_concurrent_modification(&self) -> bool {
        matches!(
            self,
            TranceError::Storage(StorageError::ConcurrentModification { .. })
        )
    }
}

/// Result type alias for trance operations.
pub type TranceResult<T> = Result<T, TranceError>;

// =============================================================================
// TESTS
// =============================================================================
