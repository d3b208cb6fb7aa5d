//! Trance Test Utilities
//!
//! Shared test infrastructure for the trance workspace:
//! - Proptest generators for ids, field values and revisions
//! - Fixtures for the two-revision, two-language scenario
//! - Assertions for trance-specific errors and revision history

// Re-export mock storage from its source crate
pub use trance_storage::{MockStorage, RevisionStore};

// Re-export core types for convenience
pub use trance_core::{
    EntityId, EntityIdType, FieldDefinition, FieldDefinitions, FieldValue, FieldValues,
    Langcode, ResourceKind, Revision, RevisionDraft, RevisionId, RevisionMeta, StorageError,
    Timestamp, TranceConfig, TranceError, TranceResult, Translation, UserId, ValidationError,
};

use chrono::{TimeZone, Utc};
use std::collections::BTreeMap;

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for trance types.

    use super::*;
    use proptest::collection::{btree_map, vec};
    use proptest::prelude::*;
    use uuid::Uuid;

    /// Field names the generators draw from.
    pub const FIELD_NAMES: [&str; 6] = ["name", "title", "body", "status", "weight", "promoted"];

    // === Identity Type Generators ===

    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    pub fn arb_entity_id() -> impl Strategy<Value = EntityId> {
        arb_uuid().prop_map(EntityId::new)
    }

    pub fn arb_revision_id() -> impl Strategy<Value = RevisionId> {
        arb_uuid().prop_map(RevisionId::new)
    }

    pub fn arb_user_id() -> impl Strategy<Value = UserId> {
        arb_uuid().prop_map(UserId::new)
    }

    /// Generate a Timestamp between 2020 and 2030.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1577836800i64..1893456000i64).prop_map(|secs| {
            chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
        })
    }

    pub fn arb_langcode() -> impl Strategy<Value = Langcode> {
        prop_oneof![
            Just(Langcode::from("en")),
            Just(Langcode::from("fr")),
            Just(Langcode::from("de")),
            Just(Langcode::from("es")),
            Just(Langcode::from("ja")),
        ]
    }

    // === Field Generators ===

    pub fn arb_field_name() -> impl Strategy<Value = String> {
        prop::sample::select(FIELD_NAMES.to_vec()).prop_map(str::to_string)
    }

    pub fn arb_field_value() -> impl Strategy<Value = FieldValue> {
        prop_oneof![
            Just(FieldValue::Null),
            any::<bool>().prop_map(FieldValue::from),
            any::<i64>().prop_map(FieldValue::from),
            "[a-zA-Z ]{0,16}".prop_map(FieldValue::from),
        ]
    }

    pub fn arb_field_values() -> impl Strategy<Value = FieldValues> {
        btree_map(arb_field_name(), arb_field_value(), 0..FIELD_NAMES.len())
    }

    /// Definitions for every name in [`FIELD_NAMES`], each randomly
    /// translatable or shared.
    pub fn arb_field_definitions() -> impl Strategy<Value = FieldDefinitions> {
        vec(any::<bool>(), FIELD_NAMES.len()).prop_map(|flags| {
            FIELD_NAMES
                .iter()
                .zip(flags)
                .fold(FieldDefinitions::new("trance"), |defs, (name, translatable)| {
                    defs.with(if translatable {
                        FieldDefinition::translatable(*name)
                    } else {
                        FieldDefinition::shared(*name)
                    })
                })
        })
    }

    // === Revision Generators ===

    /// A revision of `entity_id` with one to three translations.
    pub fn arb_revision_of(entity_id: EntityId) -> impl Strategy<Value = Revision> {
        (
            arb_revision_id(),
            arb_timestamp(),
            arb_user_id(),
            btree_map(arb_langcode(), arb_field_values(), 1..4),
            arb_field_values(),
        )
            .prop_map(move |(revision_id, created, author, translations, shared)| {
                let translations: BTreeMap<Langcode, Translation> = translations
                    .into_iter()
                    .map(|(langcode, values)| {
                        (
                            langcode.clone(),
                            Translation { langcode, values },
                        )
                    })
                    .collect();
                let default_langcode = translations
                    .keys()
                    .next()
                    .cloned()
                    .unwrap_or_else(|| Langcode::from("en"));
                Revision {
                    revision_id,
                    entity_id,
                    entity_type: "trance".to_string(),
                    bundle: "article".to_string(),
                    default_langcode,
                    revision_creation_time: created,
                    revision_author_id: author,
                    revision_log: None,
                    is_default_revision: false,
                    translations,
                    shared,
                }
            })
    }

    pub fn arb_revision() -> impl Strategy<Value = Revision> {
        arb_entity_id().prop_flat_map(arb_revision_of)
    }

    /// `(latest, source, langcode)` for one entity, where `source` carries
    /// a `langcode` translation. `latest` may or may not.
    pub fn arb_revision_pair() -> impl Strategy<Value = (Revision, Revision, Langcode)> {
        arb_entity_id()
            .prop_flat_map(|entity_id| (arb_revision_of(entity_id), arb_revision_of(entity_id)))
            .prop_flat_map(|(mut latest, source)| {
                latest.is_default_revision = true;
                let langcodes: Vec<Langcode> = source.langcodes().cloned().collect();
                (Just(latest), Just(source), prop::sample::select(langcodes))
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! The reference scenario: an entity with revisions R1 and R2, each with
    //! "en" and "fr" translations and a shared `status` field.

    use super::*;
    use serde_json::json;

    /// Field definitions of the trance entity type used across tests.
    pub fn trance_field_definitions() -> FieldDefinitions {
        FieldDefinitions::new("trance")
            .with(FieldDefinition::translatable("name").required())
            .with(FieldDefinition::translatable("title"))
            .with(FieldDefinition::translatable("body"))
            .with(FieldDefinition::shared("status"))
    }

    /// Mock storage with [`trance_field_definitions`] registered.
    pub fn trance_storage() -> MockStorage {
        MockStorage::with_field_definitions(trance_field_definitions())
    }

    pub fn scenario_entity_id() -> EntityId {
        EntityId::now_v7()
    }

    pub fn r1_time() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    pub fn r2_time() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 2, 20, 16, 45, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    fn scenario_revision(
        entity_id: EntityId,
        en_title: &str,
        fr_title: &str,
        status: &str,
        created: Timestamp,
    ) -> Revision {
        let en = Translation::new("en")
            .with_value("name", json!("Example"))
            .with_value("title", json!(en_title));
        let fr = Translation::new("fr")
            .with_value("name", json!("Exemple"))
            .with_value("title", json!(fr_title));
        Revision {
            revision_id: RevisionId::now_v7(),
            entity_id,
            entity_type: "trance".to_string(),
            bundle: "article".to_string(),
            default_langcode: Langcode::from("en"),
            revision_creation_time: created,
            revision_author_id: UserId::now_v7(),
            revision_log: None,
            is_default_revision: false,
            translations: [(en.langcode.clone(), en), (fr.langcode.clone(), fr)]
                .into_iter()
                .collect(),
            shared: [("status".to_string(), json!(status))].into_iter().collect(),
        }
    }

    /// R1: en title "Old", fr title "Ancien", status "draft".
    pub fn scenario_r1(entity_id: EntityId) -> Revision {
        scenario_revision(entity_id, "Old", "Ancien", "draft", r1_time())
    }

    /// R2: en title "New", fr title "Nouveau", status "published".
    pub fn scenario_r2(entity_id: EntityId) -> Revision {
        let mut revision = scenario_revision(entity_id, "New", "Nouveau", "published", r2_time());
        revision.is_default_revision = true;
        revision
    }

    /// Ids of the scenario as stored.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Scenario {
        pub entity_id: EntityId,
        pub r1: RevisionId,
        pub r2: RevisionId,
    }

    /// Store R1 then R2 (the default revision) in `store`.
    pub async fn seed_scenario<S: RevisionStore + ?Sized>(store: &S) -> TranceResult<Scenario> {
        let entity_id = scenario_entity_id();
        let author = UserId::now_v7();
        let r1 = store
            .create_entity(scenario_r1(entity_id).to_draft(), author, r1_time())
            .await?;
        let r2 = store
            .commit_as_new_default_revision(scenario_r2(entity_id).to_draft(), author, r2_time())
            .await?;
        Ok(Scenario { entity_id, r1, r2 })
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for trance-specific validation.

    use super::*;

    /// Assert that a TranceResult is a NotFound storage error.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &TranceResult<T>, kind: ResourceKind) {
        match result {
            Err(TranceError::Storage(StorageError::NotFound { kind: k, .. })) => {
                assert_eq!(*k, kind, "Wrong resource kind in NotFound error");
            }
            other => panic!("Expected NotFound error for {:?}, got: {:?}", kind, other),
        }
    }

    #[track_caller]
    pub fn assert_translation_not_found<T: std::fmt::Debug>(
        result: &TranceResult<T>,
        langcode: &str,
    ) {
        match result {
            Err(TranceError::Validation(ValidationError::TranslationNotFound {
                langcode: l, ..
            })) => {
                assert_eq!(l.as_str(), langcode, "Wrong langcode in TranslationNotFound");
            }
            other => panic!("Expected TranslationNotFound for {}, got: {:?}", langcode, other),
        }
    }

    #[track_caller]
    pub fn assert_concurrent_modification<T: std::fmt::Debug>(result: &TranceResult<T>) {
        match result {
            Err(TranceError::Storage(StorageError::ConcurrentModification { .. })) => {}
            other => panic!("Expected ConcurrentModification error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &TranceResult<T>) {
        match result {
            Err(TranceError::Validation(_)) => {}
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    /// Assert that exactly one revision in a history listing is the default
    /// one, and that it is the newest.
    #[track_caller]
    pub fn assert_single_default(history: &[RevisionMeta]) {
        let defaults = history.iter().filter(|m| m.is_default_revision).count();
        assert_eq!(defaults, 1, "Expected exactly one default revision, found {}", defaults);
        assert!(
            history.first().is_some_and(|m| m.is_default_revision),
            "Default revision is not the newest"
        );
    }

    /// Assert that two revisions carry the same field values.
    #[track_caller]
    pub fn assert_same_content(a: &Revision, b: &Revision) {
        assert_eq!(a.translations, b.translations, "Translations differ");
        assert_eq!(a.shared, b.shared, "Shared values differ");
    }

    /// Assert a translatable value of a revision.
    #[track_caller]
    pub fn assert_translated_value(revision: &Revision, langcode: &str, field: &str, expected: &FieldValue) {
        let actual = revision
            .translation(&Langcode::from(langcode))
            .and_then(|t| t.get(field));
        assert_eq!(actual, Some(expected), "{} value of {} differs", langcode, field);
    }

    /// Assert a shared value of a revision.
    #[track_caller]
    pub fn assert_shared_value(revision: &Revision, field: &str, expected: &FieldValue) {
        assert_eq!(revision.shared.get(field), Some(expected), "Shared value of {} differs", field);
    }
}

// ============================================================================
// TESTS
// ============================================================================
