//! Create and edit trance entities.
//!
//! Every save appends a revision: a new entity gets its first revision, an
//! existing one gets a new default revision guarded by the revision the edit
//! started from.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use trance_core::{
    EntityId, EntityIdType, FieldDefinitions, FieldValue, FieldValues, Langcode, RevisionDraft,
    RevisionId, TranceConfig, TranceResult, Translation, UserId, ValidationError,
};
use trance_storage::RevisionStore;

/// Whether a save created the entity or updated it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    Created,
    Updated,
}

impl SaveStatus {
    pub fn message(&self, label: &str) -> String {
        match self {
            SaveStatus::Created => format!("Created the {} content entity.", label),
            SaveStatus::Updated => format!("Saved the {} content entity.", label),
        }
    }
}

/// Edit state of an entity, new or existing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDraft {
    /// `None` until the entity has been created.
    pub entity_id: Option<EntityId>,
    /// Revision the edit started from.
    pub base_revision_id: Option<RevisionId>,
    pub bundle: String,
    pub default_langcode: Langcode,
    pub translations: BTreeMap<Langcode, Translation>,
    pub shared: FieldValues,
    pub revision_log: Option<String>,
}

impl EntityDraft {
    /// Set a translatable field on one translation, adding the translation
    /// if needed.
    pub fn with_translated(
        mut self,
        langcode: impl Into<Langcode>,
        field: impl Into<String>,
        value: FieldValue,
    ) -> Self {
        let langcode = langcode.into();
        self.translations
            .entry(langcode.clone())
            .or_insert_with(|| Translation::new(langcode))
            .values
            .insert(field.into(), value);
        self
    }

    /// Set a field shared by all translations.
    pub fn with_shared(mut self, field: impl Into<String>, value: FieldValue) -> Self {
        self.shared.insert(field.into(), value);
        self
    }

    pub fn with_revision_log(mut self, log: impl Into<String>) -> Self {
        self.revision_log = Some(log.into());
        self
    }

    pub fn is_new(&self) -> bool {
        self.entity_id.is_none()
    }
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOutcome {
    pub status: SaveStatus,
    pub entity_id: EntityId,
    pub revision_id: RevisionId,
    pub label: String,
    pub message: String,
}

/// Saves trance entities through a [`RevisionStore`].
#[derive(Debug)]
pub struct TranceEditor<S: RevisionStore + ?Sized> {
    store: Arc<S>,
    config: TranceConfig,
}

impl<S: RevisionStore + ?Sized> TranceEditor<S> {
    pub fn new(store: Arc<S>, config: TranceConfig) -> TranceResult<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &TranceConfig {
        &self.config
    }

    /// Empty draft for a new entity.
    pub fn new_draft(&self, bundle: impl Into<String>, default_langcode: impl Into<Langcode>) -> EntityDraft {
        EntityDraft {
            entity_id: None,
            base_revision_id: None,
            bundle: bundle.into(),
            default_langcode: default_langcode.into(),
            translations: BTreeMap::new(),
            shared: FieldValues::new(),
            revision_log: None,
        }
    }

    /// Draft of an existing entity's latest revision, with the log cleared.
    pub async fn prepare(&self, entity_id: EntityId) -> TranceResult<EntityDraft> {
        let latest = self.store.load_latest(entity_id).await?;
        Ok(EntityDraft {
            entity_id: Some(latest.entity_id),
            base_revision_id: Some(latest.revision_id),
            bundle: latest.bundle,
            default_langcode: latest.default_langcode,
            translations: latest.translations,
            shared: latest.shared,
            revision_log: None,
        })
    }

    /// Validate and persist `draft`, stamping `author_id` and the current
    /// time on the new revision.
    pub async fn save(&self, draft: EntityDraft, author_id: UserId) -> TranceResult<SaveOutcome> {
        let definitions = self
            .store
            .field_definitions(&self.config.entity_type_id)
            .await?;
        validate_draft(&draft, &definitions, &self.config.label_field)?;

        let status = if draft.is_new() {
            SaveStatus::Created
        } else {
            SaveStatus::Updated
        };
        let entity_id = draft.entity_id.unwrap_or_else(EntityId::now_v7);
        let revision = RevisionDraft {
            entity_id,
            entity_type: self.config.entity_type_id.clone(),
            bundle: draft.bundle,
            default_langcode: draft.default_langcode,
            translations: draft.translations,
            shared: draft.shared,
            revision_log: draft.revision_log,
            expected_latest: draft.base_revision_id,
        };
        let label = revision.label(&self.config.label_field);
        let timestamp = Utc::now();

        let committed = match status {
            SaveStatus::Created => {
                self.store
                    .create_entity(revision, author_id, timestamp)
                    .await
            }
            SaveStatus::Updated => {
                self.store
                    .commit_as_new_default_revision(revision, author_id, timestamp)
                    .await
            }
        };
        let revision_id = match committed {
            Ok(revision_id) => revision_id,
            Err(e) => {
                if e.is_concurrent_modification() {
                    tracing::warn!(%entity_id, error = %e, "Save rejected, entity changed since it was loaded");
                }
                return Err(e);
            }
        };

        tracing::info!(%entity_id, %revision_id, status = ?status, "Saved entity");

        Ok(SaveOutcome {
            status,
            entity_id,
            revision_id,
            message: status.message(&label),
            label,
        })
    }
}

fn validate_draft(
    draft: &EntityDraft,
    definitions: &FieldDefinitions,
    label_field: &str,
) -> TranceResult<()> {
    let default_translation = draft.translations.get(&draft.default_langcode).ok_or_else(|| {
        ValidationError::InvalidValue {
            field: "default_langcode".to_string(),
            reason: format!("no {} translation", draft.default_langcode),
        }
    })?;

    for (langcode, translation) in &draft.translations {
        for field in translation.values.keys() {
            match definitions.is_translatable(field) {
                None => return Err(unknown_field(field, definitions)),
                Some(false) => {
                    return Err(ValidationError::InvalidValue {
                        field: field.clone(),
                        reason: format!("shared field set on the {} translation", langcode),
                    }
                    .into())
                }
                Some(true) => {}
            }
        }
    }

    for field in draft.shared.keys() {
        match definitions.is_translatable(field) {
            None => return Err(unknown_field(field, definitions)),
            Some(true) => {
                return Err(ValidationError::InvalidValue {
                    field: field.clone(),
                    reason: "translatable field set as a shared value".to_string(),
                }
                .into())
            }
            Some(false) => {}
        }
    }

    let label = default_translation
        .get(label_field)
        .or_else(|| draft.shared.get(label_field));
    if !is_filled(label) {
        return Err(ValidationError::RequiredFieldMissing {
            field: label_field.to_string(),
        }
        .into());
    }

    for definition in definitions.iter().filter(|d| d.required) {
        let value = if definition.translatable {
            default_translation.get(&definition.name)
        } else {
            draft.shared.get(&definition.name)
        };
        if !is_filled(value) {
            return Err(ValidationError::RequiredFieldMissing {
                field: definition.name.clone(),
            }
            .into());
        }
    }

    Ok(())
}

fn is_filled(value: Option<&FieldValue>) -> bool {
    match value {
        None | Some(FieldValue::Null) => false,
        Some(FieldValue::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

fn unknown_field(field: &str, definitions: &FieldDefinitions) -> trance_core::TranceError {
    ValidationError::UnknownField {
        field: field.to_string(),
        entity_type: definitions.entity_type().to_string(),
    }
    .into()
}
