//! Trance Storage - Revision Store Trait and Mock Implementation
//!
//! Defines the persistence contract the editing layer consumes. Real
//! database-backed stores live in the host application; this crate ships
//! only the in-memory `MockStorage` used by tests and embedders.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use trance_core::{
    content_hash_hex, EntityId, EntityIdType, FieldDefinitions, ResourceKind, Revision, RevisionDraft,
    RevisionId, RevisionMeta, StorageError, Timestamp, TranceResult, UserId,
};

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Entity/revision store for trance entities.
///
/// Revisions are immutable once committed. Implementations must make
/// `commit_as_new_default_revision` atomic: either the new revision is
/// recorded and becomes the entity's only default revision, or nothing
/// changes.
#[async_trait]
pub trait RevisionStore: Send + Sync {
    /// Load one revision by id.
    async fn load_revision(&self, revision_id: RevisionId) -> TranceResult<Revision>;

    /// Load the current default (latest) revision of an entity.
    async fn load_latest(&self, entity_id: EntityId) -> TranceResult<Revision>;

    /// List revision metadata of an entity, newest first.
    async fn list_revisions(&self, entity_id: EntityId) -> TranceResult<Vec<RevisionMeta>>;

    /// Create a new entity whose first revision is built from `draft`.
    async fn create_entity(
        &self,
        draft: RevisionDraft,
        author_id: UserId,
        timestamp: Timestamp,
    ) -> TranceResult<RevisionId>;

    /// Record `draft` as a new revision and make it the default one.
    ///
    /// When `draft.expected_latest` is set and the entity's default revision
    /// is a different one, fails with `StorageError::ConcurrentModification`.
    async fn commit_as_new_default_revision(
        &self,
        draft: RevisionDraft,
        author_id: UserId,
        timestamp: Timestamp,
    ) -> TranceResult<RevisionId>;

    /// Field definitions of an entity type.
    async fn field_definitions(&self, entity_type: &str) -> TranceResult<FieldDefinitions>;
}

// ============================================================================
// MOCK STORAGE
// ============================================================================

#[derive(Debug)]
struct EntityRecord {
    default_revision: RevisionId,
    /// Oldest first.
    history: Vec<RevisionId>,
}

#[derive(Debug, Default)]
struct StoreState {
    entities: HashMap<EntityId, EntityRecord>,
    /// Stored without a default flag; the flag is derived from the entity
    /// record on every read.
    revisions: HashMap<RevisionId, Revision>,
}

impl StoreState {
    fn materialize(&self, revision_id: RevisionId) -> TranceResult<Revision> {
        let revision = self.revisions.get(&revision_id).ok_or(StorageError::NotFound {
            kind: ResourceKind::Revision,
            id: revision_id.as_uuid(),
        })?;
        let mut revision = revision.clone();
        revision.is_default_revision = self
            .entities
            .get(&revision.entity_id)
            .is_some_and(|record| record.default_revision == revision_id);
        Ok(revision)
    }

    fn record(&self, entity_id: EntityId) -> TranceResult<&EntityRecord> {
        self.entities.get(&entity_id).ok_or_else(|| {
            StorageError::NotFound {
                kind: ResourceKind::Entity,
                id: entity_id.as_uuid(),
            }
            .into()
        })
    }
}

/// In-memory store for testing.
///
/// All state sits behind one lock, so the concurrency guard and the write
/// of a commit happen atomically.
#[derive(Debug, Default)]
pub struct MockStorage {
    state: Arc<RwLock<StoreState>>,
    field_definitions: Arc<RwLock<HashMap<String, FieldDefinitions>>>,
    injected_failure: Arc<Mutex<Option<StorageError>>>,
}

impl MockStorage {
    /// Create a new mock storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock storage that knows one entity type's fields.
    pub fn with_field_definitions(definitions: FieldDefinitions) -> Self {
        let storage = Self::new();
        if let Ok(mut defs) = storage.field_definitions.write() {
            defs.insert(definitions.entity_type().to_string(), definitions);
        }
        storage
    }

    /// Register (or replace) the field definitions of an entity type.
    pub fn register_field_definitions(&self, definitions: FieldDefinitions) -> TranceResult<()> {
        let mut defs = self
            .field_definitions
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        defs.insert(definitions.entity_type().to_string(), definitions);
        Ok(())
    }

    /// Make the next create/commit fail with `error` without touching state.
    pub fn fail_next_commit(&self, error: StorageError) -> TranceResult<()> {
        let mut slot = self
            .injected_failure
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?;
        *slot = Some(error);
        Ok(())
    }

    /// Total number of stored revisions across all entities.
    pub fn revision_count(&self) -> TranceResult<usize> {
        Ok(self.read()?.revisions.len())
    }

    /// Number of revisions of one entity flagged as default.
    pub fn default_revision_count(&self, entity_id: EntityId) -> TranceResult<usize> {
        let state = self.read()?;
        let record = state.record(entity_id)?;
        let mut count = 0;
        for revision_id in &record.history {
            if state.materialize(*revision_id)?.is_default_revision {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Clear all stored entities and revisions.
    pub fn clear(&self) -> TranceResult<()> {
        let mut state = self.write()?;
        state.entities.clear();
        state.revisions.clear();
        Ok(())
    }

    fn read(&self) -> TranceResult<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|_| StorageError::LockPoisoned.into())
    }

    fn write(&self) -> TranceResult<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|_| StorageError::LockPoisoned.into())
    }

    fn take_injected_failure(&self) -> TranceResult<Option<StorageError>> {
        let mut slot = self
            .injected_failure
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(slot.take())
    }
}

#[async_trait]
impl RevisionStore for MockStorage {
    async fn load_revision(&self, revision_id: RevisionId) -> TranceResult<Revision> {
        self.read()?.materialize(revision_id)
    }

    async fn load_latest(&self, entity_id: EntityId) -> TranceResult<Revision> {
        let state = self.read()?;
        let default_revision = state.record(entity_id)?.default_revision;
        state.materialize(default_revision)
    }

    async fn list_revisions(&self, entity_id: EntityId) -> TranceResult<Vec<RevisionMeta>> {
        let state = self.read()?;
        let record = state.record(entity_id)?;
        record
            .history
            .iter()
            .rev()
            .map(|revision_id| state.materialize(*revision_id).map(|r| r.meta()))
            .collect()
    }

    async fn create_entity(
        &self,
        draft: RevisionDraft,
        author_id: UserId,
        timestamp: Timestamp,
    ) -> TranceResult<RevisionId> {
        let mut guard = self.write()?;
        let state: &mut StoreState = &mut guard;

        if let Some(error) = self.take_injected_failure()? {
            return Err(error.into());
        }
        if state.entities.contains_key(&draft.entity_id) {
            return Err(StorageError::InsertFailed {
                kind: ResourceKind::Entity,
                reason: format!("entity {} already exists", draft.entity_id),
            }
            .into());
        }

        let entity_id = draft.entity_id;
        let content_hash = content_hash_hex(&draft.content_hash());
        let revision_id = RevisionId::now_v7();
        state
            .revisions
            .insert(revision_id, draft.into_revision(revision_id, author_id, timestamp, false));
        state.entities.insert(
            entity_id,
            EntityRecord {
                default_revision: revision_id,
                history: vec![revision_id],
            },
        );

        tracing::debug!(%entity_id, %revision_id, %content_hash, "Created entity");
        Ok(revision_id)
    }

    async fn commit_as_new_default_revision(
        &self,
        draft: RevisionDraft,
        author_id: UserId,
        timestamp: Timestamp,
    ) -> TranceResult<RevisionId> {
        let mut guard = self.write()?;
        let state: &mut StoreState = &mut guard;

        if let Some(error) = self.take_injected_failure()? {
            return Err(error.into());
        }

        let entity_id = draft.entity_id;
        let record = state.entities.get_mut(&entity_id).ok_or(StorageError::NotFound {
            kind: ResourceKind::Entity,
            id: entity_id.as_uuid(),
        })?;

        if let Some(expected) = draft.expected_latest {
            if record.default_revision != expected {
                return Err(StorageError::ConcurrentModification {
                    entity_id,
                    expected,
                    actual: record.default_revision,
                }
                .into());
            }
        }

        let content_hash = content_hash_hex(&draft.content_hash());
        let revision_id = RevisionId::now_v7();
        record.default_revision = revision_id;
        record.history.push(revision_id);
        state
            .revisions
            .insert(revision_id, draft.into_revision(revision_id, author_id, timestamp, false));

        tracing::debug!(%entity_id, %revision_id, %content_hash, "Committed default revision");
        Ok(revision_id)
    }

    async fn field_definitions(&self, entity_type: &str) -> TranceResult<FieldDefinitions> {
        let defs = self
            .field_definitions
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        defs.get(entity_type).cloned().ok_or_else(|| {
            StorageError::UnknownEntityType {
                entity_type: entity_type.to_string(),
            }
            .into()
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;
    use serde_json::json;
    use trance_core::{Langcode, Translation};

    fn draft_for(entity_id: EntityId, n: usize) -> RevisionDraft {
        let en = Translation::new("en").with_value("name", json!(format!("rev {}", n)));
        RevisionDraft {
            entity_id,
            entity_type: "trance".to_string(),
            bundle: "article".to_string(),
            default_langcode: Langcode::from("en"),
            translations: [(en.langcode.clone(), en)].into_iter().collect(),
            shared: Default::default(),
            revision_log: None,
            expected_latest: None,
        }
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime")
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        /// Property: after any number of commits exactly one revision is the
        /// default, and it is the most recently committed one.
        #[test]
        fn prop_single_default_revision(commits in 0usize..12) {
            let rt = runtime();
            let storage = MockStorage::new();
            let entity_id = EntityId::now_v7();

            let mut last = rt
                .block_on(storage.create_entity(draft_for(entity_id, 0), UserId::now_v7(), Utc::now()))
                .unwrap();
            for n in 1..=commits {
                last = rt
                    .block_on(storage.commit_as_new_default_revision(
                        draft_for(entity_id, n),
                        UserId::now_v7(),
                        Utc::now(),
                    ))
                    .unwrap();
            }

            prop_assert_eq!(storage.default_revision_count(entity_id).unwrap(), 1);
            let latest = rt.block_on(storage.load_latest(entity_id)).unwrap();
            prop_assert_eq!(latest.revision_id, last);
            prop_assert_eq!(storage.revision_count().unwrap(), commits + 1);
        }

        /// Property: committed revision ids are never reused.
        #[test]
        fn prop_commit_ids_are_fresh(commits in 1usize..12) {
            let rt = runtime();
            let storage = MockStorage::new();
            let entity_id = EntityId::now_v7();

            let mut seen = std::collections::HashSet::new();
            seen.insert(
                rt.block_on(storage.create_entity(draft_for(entity_id, 0), UserId::now_v7(), Utc::now()))
                    .unwrap(),
            );
            for n in 1..=commits {
                let id = rt
                    .block_on(storage.commit_as_new_default_revision(
                        draft_for(entity_id, n),
                        UserId::now_v7(),
                        Utc::now(),
                    ))
                    .unwrap();
                prop_assert!(seen.insert(id), "revision id {} reused", id);
            }
        }
    }
}
