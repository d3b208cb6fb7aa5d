//! Trance Core - Entity Types
//!
//! Pure data structures for versioned, translatable trance entities: ids,
//! revisions, translations, field definitions, errors and configuration.
//! All other crates depend on this. No storage or reversion logic lives here.

pub mod config;
pub mod entities;
pub mod error;
pub mod identity;

pub use config::{TranceConfig, DATE_PLACEHOLDER};
pub use entities::{
    FieldDefinition, FieldDefinitions, FieldValue, FieldValues, Revision, RevisionDraft,
    RevisionMeta, Translation,
};
pub use error::{
    ConfigError, ResourceKind, StorageError, TranceError, TranceResult, ValidationError,
};
pub use identity::{
    compute_content_hash, content_hash_hex, ContentHash, EntityId, EntityIdType, Langcode, RevisionId, Timestamp,
    UserId,
};
