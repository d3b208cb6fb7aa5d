//! Core entity structures

use crate::{
    compute_content_hash, content_hash_hex, ContentHash, EntityId, Langcode, RevisionId, Timestamp, UserId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single field's stored value. Field items are free-form JSON.
pub type FieldValue = serde_json::Value;

/// Field values keyed by field name.
pub type FieldValues = BTreeMap<String, FieldValue>;

// ============================================================================
// FIELD DEFINITIONS
// ============================================================================

/// Definition of one field of an entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    /// Translatable fields hold one value per translation; the rest are
    /// shared by every translation of a revision.
    pub translatable: bool,
    pub required: bool,
}

impl FieldDefinition {
    pub fn translatable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            translatable: true,
            required: false,
        }
    }

    pub fn shared(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            translatable: false,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// All field definitions of one entity type, keyed by field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinitions {
    entity_type: String,
    fields: BTreeMap<String, FieldDefinition>,
}

impl FieldDefinitions {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Add (or replace) a definition.
    pub fn with(mut self, definition: FieldDefinition) -> Self {
        self.fields.insert(definition.name.clone(), definition);
        self
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn get(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }

    /// `None` when the field is not defined for this entity type.
    pub fn is_translatable(&self, name: &str) -> Option<bool> {
        self.fields.get(name).map(|d| d.translatable)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ============================================================================
// TRANSLATIONS & REVISIONS
// ============================================================================

/// Locale-specific values of the translatable fields within one revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub langcode: Langcode,
    pub values: FieldValues,
}

impl Translation {
    pub fn new(langcode: impl Into<Langcode>) -> Self {
        Self {
            langcode: langcode.into(),
            values: FieldValues::new(),
        }
    }

    /// Builder-style setter.
    pub fn with_value(mut self, field: impl Into<String>, value: FieldValue) -> Self {
        self.values.insert(field.into(), value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    /// Set a field, or clear it when `value` is `None`.
    pub fn set(&mut self, field: &str, value: Option<FieldValue>) {
        match value {
            Some(value) => {
                self.values.insert(field.to_string(), value);
            }
            None => {
                self.values.remove(field);
            }
        }
    }
}

/// Immutable snapshot of an entity at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    pub revision_id: RevisionId,
    pub entity_id: EntityId,
    pub entity_type: String,
    pub bundle: String,
    pub default_langcode: Langcode,
    pub revision_creation_time: Timestamp,
    pub revision_author_id: UserId,
    pub revision_log: Option<String>,
    pub is_default_revision: bool,
    pub translations: BTreeMap<Langcode, Translation>,
    /// Values of non-translatable fields, common to every translation.
    pub shared: FieldValues,
}

impl Revision {
    pub fn translation(&self, langcode: &Langcode) -> Option<&Translation> {
        self.translations.get(langcode)
    }

    pub fn has_translation(&self, langcode: &Langcode) -> bool {
        self.translations.contains_key(langcode)
    }

    pub fn langcodes(&self) -> impl Iterator<Item = &Langcode> {
        self.translations.keys()
    }

    /// Display label: the label field of the default translation, falling
    /// back to the entity id.
    pub fn label(&self, label_field: &str) -> String {
        resolve_label(
            self.entity_id,
            self.translation(&self.default_langcode),
            &self.shared,
            label_field,
        )
    }

    /// Hash over translations and shared values, ignoring revision metadata.
    pub fn content_hash(&self) -> ContentHash {
        hash_content(&self.translations, &self.shared)
    }

    /// Copy of the content as an unguarded draft.
    pub fn to_draft(&self) -> RevisionDraft {
        RevisionDraft {
            entity_id: self.entity_id,
            entity_type: self.entity_type.clone(),
            bundle: self.bundle.clone(),
            default_langcode: self.default_langcode.clone(),
            translations: self.translations.clone(),
            shared: self.shared.clone(),
            revision_log: None,
            expected_latest: None,
        }
    }

    pub fn meta(&self) -> RevisionMeta {
        RevisionMeta {
            revision_id: self.revision_id,
            entity_id: self.entity_id,
            revision_creation_time: self.revision_creation_time,
            revision_author_id: self.revision_author_id,
            revision_log: self.revision_log.clone(),
            is_default_revision: self.is_default_revision,
            langcodes: self.translations.keys().cloned().collect(),
            content_hash: content_hash_hex(&self.content_hash()),
        }
    }
}

/// Content of a revision that has not been committed yet.
///
/// The store assigns the revision id; author and timestamp are supplied at
/// commit time by the caller that stamps the revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionDraft {
    pub entity_id: EntityId,
    pub entity_type: String,
    pub bundle: String,
    pub default_langcode: Langcode,
    pub translations: BTreeMap<Langcode, Translation>,
    pub shared: FieldValues,
    pub revision_log: Option<String>,
    /// Optimistic guard: the commit fails if the entity's default revision is
    /// no longer this one.
    pub expected_latest: Option<RevisionId>,
}

impl RevisionDraft {
    pub fn guarded_by(mut self, revision_id: RevisionId) -> Self {
        self.expected_latest = Some(revision_id);
        self
    }

    pub fn with_revision_log(mut self, log: impl Into<String>) -> Self {
        self.revision_log = Some(log.into());
        self
    }

    pub fn content_hash(&self) -> ContentHash {
        hash_content(&self.translations, &self.shared)
    }

    /// Display label, resolved the same way as `Revision::label`.
    pub fn label(&self, label_field: &str) -> String {
        self.label_in(&self.default_langcode, label_field)
    }

    /// Display label as seen from one translation: its own label value,
    /// then the shared value, then the entity id.
    pub fn label_in(&self, langcode: &Langcode, label_field: &str) -> String {
        resolve_label(
            self.entity_id,
            self.translations.get(langcode),
            &self.shared,
            label_field,
        )
    }

    /// Materialize the draft as a stored revision.
    pub fn into_revision(
        self,
        revision_id: RevisionId,
        author_id: UserId,
        timestamp: Timestamp,
        is_default_revision: bool,
    ) -> Revision {
        Revision {
            revision_id,
            entity_id: self.entity_id,
            entity_type: self.entity_type,
            bundle: self.bundle,
            default_langcode: self.default_langcode,
            revision_creation_time: timestamp,
            revision_author_id: author_id,
            revision_log: self.revision_log,
            is_default_revision,
            translations: self.translations,
            shared: self.shared,
        }
    }
}

/// Revision metadata for history listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionMeta {
    pub revision_id: RevisionId,
    pub entity_id: EntityId,
    pub revision_creation_time: Timestamp,
    pub revision_author_id: UserId,
    pub revision_log: Option<String>,
    pub is_default_revision: bool,
    pub langcodes: Vec<Langcode>,
    /// Hex content hash; equal for revisions with equal field values.
    pub content_hash: String,
}

fn resolve_label(
    entity_id: EntityId,
    default_translation: Option<&Translation>,
    shared: &FieldValues,
    label_field: &str,
) -> String {
    let value = default_translation
        .and_then(|t| t.get(label_field))
        .or_else(|| shared.get(label_field));
    match value {
        Some(FieldValue::String(label)) if !label.is_empty() => label.clone(),
        Some(other) if !other.is_null() && !other.is_string() => other.to_string(),
        _ => entity_id.to_string(),
    }
}

fn hash_content(translations: &BTreeMap<Langcode, Translation>, shared: &FieldValues) -> ContentHash {
    // BTreeMaps serialize in key order, so equal content gives equal bytes.
    let bytes = serde_json::to_vec(&(translations, shared)).unwrap_or_default();
    compute_content_hash(&bytes)
}
