//! Revision reversion engine.
//!
//! One entry point, [`RevisionReverter::revert`], covers both full snapshot
//! restoration and translation-scoped reverts. Every successful call commits
//! exactly one new default revision through the store.

use crate::{merge, messages};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use trance_core::{
    EntityId, EntityIdType, Langcode, ResourceKind, Revision, RevisionId, RevisionMeta,
    StorageError, Timestamp, TranceConfig, TranceResult, UserId, ValidationError,
};
use trance_storage::RevisionStore;

// ============================================================================
// POLICY & RESULT TYPES
// ============================================================================

/// How much of the source revision is restored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RevertPolicy {
    /// Restore every translation and every shared value.
    Full,
    /// Restore one translation; shared values only when opted in.
    Translation {
        langcode: Langcode,
        revert_shared_fields: bool,
    },
}

impl RevertPolicy {
    /// The translation this policy is scoped to, if any.
    pub fn langcode(&self) -> Option<&Langcode> {
        match self {
            RevertPolicy::Full => None,
            RevertPolicy::Translation { langcode, .. } => Some(langcode),
        }
    }
}

/// Outcome of a committed revert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReversionResult {
    pub new_revision_id: RevisionId,
    pub entity_id: EntityId,
    pub langcode: Option<Langcode>,
    pub timestamp: Timestamp,
    pub author_id: UserId,
    pub source_revision_id: RevisionId,
    pub source_revision_time: Timestamp,
    /// Entity label as of the new revision, in the reverted translation
    /// when the revert was translation-scoped.
    pub label: String,
}

impl ReversionResult {
    /// "Trance {label} has been reverted to the revision from {date}."
    pub fn summary(&self, config: &TranceConfig) -> String {
        messages::revert_summary(
            &self.label,
            self.langcode.as_ref(),
            &self.source_revision_time,
            config,
        )
    }
}

/// A validated revert waiting for confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevertRequest {
    pub entity_id: EntityId,
    pub source_revision_id: RevisionId,
    pub source_revision_time: Timestamp,
    pub policy: RevertPolicy,
}

impl RevertRequest {
    /// The confirmation question for this request.
    pub fn question(&self, config: &TranceConfig) -> String {
        messages::revert_question(self.policy.langcode(), &self.source_revision_time, config)
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// Reverts trance entities to earlier revisions.
#[derive(Debug)]
pub struct RevisionReverter<S: RevisionStore + ?Sized> {
    store: Arc<S>,
    config: TranceConfig,
}

impl<S: RevisionStore + ?Sized> Clone for RevisionReverter<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: RevisionStore + ?Sized> RevisionReverter<S> {
    /// Create a reverter over `store`. Fails if `config` does not validate.
    pub fn new(store: Arc<S>, config: TranceConfig) -> TranceResult<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &TranceConfig {
        &self.config
    }

    /// Policy matching the revert form's initial state: a translation revert
    /// uses the configured default for shared fields.
    pub fn default_policy(&self, langcode: Option<Langcode>) -> RevertPolicy {
        match langcode {
            None => RevertPolicy::Full,
            Some(langcode) => RevertPolicy::Translation {
                langcode,
                revert_shared_fields: self.config.revert_shared_fields_default,
            },
        }
    }

    /// Revision history of an entity, newest first.
    pub async fn revisions(&self, entity_id: EntityId) -> TranceResult<Vec<RevisionMeta>> {
        self.store.list_revisions(entity_id).await
    }

    /// Validate a revert without committing it.
    ///
    /// Checks the same preconditions as [`revert`](Self::revert) and returns
    /// the request the confirmation question is built from.
    pub async fn request(
        &self,
        entity_id: EntityId,
        source_revision_id: RevisionId,
        policy: RevertPolicy,
    ) -> TranceResult<RevertRequest> {
        let source = self.load_source(entity_id, source_revision_id).await?;
        check_translation(&source, &policy)?;
        Ok(RevertRequest {
            entity_id,
            source_revision_id,
            source_revision_time: source.revision_creation_time,
            policy,
        })
    }

    /// Commit a previously built request.
    pub async fn confirm(
        &self,
        request: RevertRequest,
        author_id: UserId,
    ) -> TranceResult<ReversionResult> {
        self.revert(
            request.entity_id,
            request.source_revision_id,
            request.policy,
            author_id,
        )
        .await
    }

    /// Revert `entity_id` to `source_revision_id` under `policy`.
    ///
    /// All preconditions are checked before anything is merged. Store
    /// failures, including `ConcurrentModification`, are returned unchanged
    /// and never retried.
    pub async fn revert(
        &self,
        entity_id: EntityId,
        source_revision_id: RevisionId,
        policy: RevertPolicy,
        author_id: UserId,
    ) -> TranceResult<ReversionResult> {
        let source = self.load_source(entity_id, source_revision_id).await?;
        check_translation(&source, &policy)?;

        let draft = match &policy {
            RevertPolicy::Full => merge::prepare_full_revert(&source),
            RevertPolicy::Translation {
                langcode,
                revert_shared_fields,
            } => {
                let latest = self.store.load_latest(entity_id).await?;
                let definitions = self
                    .store
                    .field_definitions(&self.config.entity_type_id)
                    .await?;
                merge::prepare_translation_revert(
                    &latest,
                    &source,
                    langcode,
                    *revert_shared_fields,
                    &definitions,
                )?
            }
        };

        let draft = draft.with_revision_log(messages::revision_log(
            &source.revision_creation_time,
            &self.config,
        ));
        let label = match policy.langcode() {
            Some(langcode) => draft.label_in(langcode, &self.config.label_field),
            None => draft.label(&self.config.label_field),
        };
        let timestamp = Utc::now();

        let new_revision_id = match self
            .store
            .commit_as_new_default_revision(draft, author_id, timestamp)
            .await
        {
            Ok(revision_id) => revision_id,
            Err(e) => {
                if e.is_concurrent_modification() {
                    tracing::warn!(
                        %entity_id,
                        %source_revision_id,
                        error = %e,
                        "Revert rejected, default revision changed"
                    );
                }
                return Err(e);
            }
        };

        tracing::info!(
            %entity_id,
            %source_revision_id,
            %new_revision_id,
            langcode = policy.langcode().map(Langcode::as_str),
            %author_id,
            "Reverted entity"
        );

        Ok(ReversionResult {
            new_revision_id,
            entity_id,
            langcode: policy.langcode().cloned(),
            timestamp,
            author_id,
            source_revision_id,
            source_revision_time: source.revision_creation_time,
            label,
        })
    }

    /// Full snapshot restoration.
    pub async fn revert_full(
        &self,
        entity_id: EntityId,
        source_revision_id: RevisionId,
        author_id: UserId,
    ) -> TranceResult<ReversionResult> {
        self.revert(entity_id, source_revision_id, RevertPolicy::Full, author_id)
            .await
    }

    /// Revert a single translation.
    pub async fn revert_translation(
        &self,
        entity_id: EntityId,
        source_revision_id: RevisionId,
        langcode: Langcode,
        revert_shared_fields: bool,
        author_id: UserId,
    ) -> TranceResult<ReversionResult> {
        let policy = RevertPolicy::Translation {
            langcode,
            revert_shared_fields,
        };
        self.revert(entity_id, source_revision_id, policy, author_id)
            .await
    }

    /// Load the source revision; one that belongs to another entity is
    /// treated as missing.
    async fn load_source(
        &self,
        entity_id: EntityId,
        source_revision_id: RevisionId,
    ) -> TranceResult<Revision> {
        let source = self.store.load_revision(source_revision_id).await?;
        if source.entity_id != entity_id {
            return Err(StorageError::NotFound {
                kind: ResourceKind::Revision,
                id: source_revision_id.as_uuid(),
            }
            .into());
        }
        Ok(source)
    }
}

fn check_translation(source: &Revision, policy: &RevertPolicy) -> TranceResult<()> {
    match policy.langcode() {
        Some(langcode) if !source.has_translation(langcode) => {
            Err(ValidationError::TranslationNotFound {
                revision_id: source.revision_id,
                langcode: langcode.clone(),
            }
            .into())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use trance_storage::MockStorage;

    #[test]
    fn test_policy_langcode() {
        assert_eq!(RevertPolicy::Full.langcode(), None);
        let policy = RevertPolicy::Translation {
            langcode: Langcode::from("fr"),
            revert_shared_fields: false,
        };
        assert_eq!(policy.langcode(), Some(&Langcode::from("fr")));
    }

    #[test]
    fn test_policy_serializes_with_mode_tag() {
        let policy = RevertPolicy::Translation {
            langcode: Langcode::from("en"),
            revert_shared_fields: true,
        };
        let json = serde_json::to_value(&policy).unwrap();
        assert_eq!(json["mode"], "translation");
        assert_eq!(json["langcode"], "en");

        let full = serde_json::to_value(RevertPolicy::Full).unwrap();
        assert_eq!(full["mode"], "full");
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = TranceConfig {
            label_field: String::new(),
            ..TranceConfig::default()
        };
        let result = RevisionReverter::new(Arc::new(MockStorage::new()), config);
        assert!(result.is_err());
    }

    #[test]
    fn test_default_policy_follows_config() {
        let config = TranceConfig {
            revert_shared_fields_default: true,
            ..TranceConfig::default()
        };
        let reverter = RevisionReverter::new(Arc::new(MockStorage::new()), config).unwrap();

        assert_eq!(reverter.default_policy(None), RevertPolicy::Full);
        assert_eq!(
            reverter.default_policy(Some(Langcode::from("en"))),
            RevertPolicy::Translation {
                langcode: Langcode::from("en"),
                revert_shared_fields: true,
            }
        );
    }

    #[test]
    fn test_summary_and_question() {
        let config = TranceConfig::default();
        let source_time = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 0).unwrap();
        let result = ReversionResult {
            new_revision_id: RevisionId::now_v7(),
            entity_id: EntityId::now_v7(),
            langcode: None,
            timestamp: Utc::now(),
            author_id: UserId::now_v7(),
            source_revision_id: RevisionId::now_v7(),
            source_revision_time: source_time,
            label: "Hello".to_string(),
        };
        assert_eq!(
            result.summary(&config),
            "Trance Hello has been reverted to the revision from Tue, 01/02/2024 - 03:04."
        );

        let request = RevertRequest {
            entity_id: result.entity_id,
            source_revision_id: result.source_revision_id,
            source_revision_time: source_time,
            policy: RevertPolicy::Full,
        };
        assert_eq!(
            request.question(&config),
            "Are you sure you want to revert to the revision from Tue, 01/02/2024 - 03:04?"
        );
    }
}
