//! Preparation of reverted revisions.
//!
//! Pure functions: they turn loaded revisions into the draft that gets
//! committed, and never talk to the store.

use trance_core::{
    FieldDefinitions, Langcode, Revision, RevisionDraft, TranceResult, Translation,
    ValidationError,
};

/// Full snapshot restoration: every translation and every shared value of
/// `source`, verbatim.
pub fn prepare_full_revert(source: &Revision) -> RevisionDraft {
    source.to_draft()
}

/// Targeted merge of one translation from `source` into `latest`.
///
/// Translatable fields are always copied for `langcode`; shared fields only
/// when `revert_shared_fields` is set. A field the source does not carry is
/// cleared. Other translations of `latest` are left as they are. The draft is
/// guarded by `latest`'s revision id.
pub fn prepare_translation_revert(
    latest: &Revision,
    source: &Revision,
    langcode: &Langcode,
    revert_shared_fields: bool,
    definitions: &FieldDefinitions,
) -> TranceResult<RevisionDraft> {
    let source_translation =
        source
            .translation(langcode)
            .ok_or_else(|| ValidationError::TranslationNotFound {
                revision_id: source.revision_id,
                langcode: langcode.clone(),
            })?;

    let mut draft = latest.to_draft().guarded_by(latest.revision_id);
    let target = draft
        .translations
        .entry(langcode.clone())
        .or_insert_with(|| Translation::new(langcode.clone()));

    let mut copied = 0usize;
    let mut kept = 0usize;
    for definition in definitions.iter() {
        let name = definition.name.as_str();
        if definition.translatable {
            target.set(name, source_translation.get(name).cloned());
            copied += 1;
        } else if revert_shared_fields {
            match source.shared.get(name) {
                Some(value) => {
                    draft.shared.insert(name.to_string(), value.clone());
                }
                None => {
                    draft.shared.remove(name);
                }
            }
            copied += 1;
        } else {
            kept += 1;
        }
    }

    tracing::debug!(
        entity_id = %latest.entity_id,
        %langcode,
        revert_shared_fields,
        copied,
        kept,
        "Merged translation from source revision"
    );

    Ok(draft)
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use trance_test_utils::generators::{arb_field_definitions, arb_revision_pair};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: translations other than the reverted one are unchanged.
        #[test]
        fn prop_other_locales_are_isolated(
            (latest, source, langcode) in arb_revision_pair(),
            definitions in arb_field_definitions(),
            revert_shared in any::<bool>(),
        ) {
            let draft = prepare_translation_revert(&latest, &source, &langcode, revert_shared, &definitions).unwrap();
            for (other, translation) in &latest.translations {
                if *other != langcode {
                    prop_assert_eq!(&draft.translations[other], translation);
                }
            }
        }

        /// Property: translatable fields always take the source value.
        #[test]
        fn prop_translatable_fields_are_copied(
            (latest, source, langcode) in arb_revision_pair(),
            definitions in arb_field_definitions(),
            revert_shared in any::<bool>(),
        ) {
            let draft = prepare_translation_revert(&latest, &source, &langcode, revert_shared, &definitions).unwrap();
            let merged = &draft.translations[&langcode];
            let original = source.translation(&langcode).unwrap();
            for definition in definitions.iter().filter(|d| d.translatable) {
                prop_assert_eq!(merged.get(&definition.name), original.get(&definition.name));
            }
        }

        /// Property: shared fields follow the source only when opted in.
        #[test]
        fn prop_shared_fields_are_gated(
            (latest, source, langcode) in arb_revision_pair(),
            definitions in arb_field_definitions(),
            revert_shared in any::<bool>(),
        ) {
            let draft = prepare_translation_revert(&latest, &source, &langcode, revert_shared, &definitions).unwrap();
            for definition in definitions.iter().filter(|d| !d.translatable) {
                let expected = if revert_shared {
                    source.shared.get(&definition.name)
                } else {
                    latest.shared.get(&definition.name)
                };
                prop_assert_eq!(draft.shared.get(&definition.name), expected);
            }
        }
    }
}
