//! Configuration types

use crate::{ConfigError, TranceError, TranceResult};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

/// Placeholder substituted with the formatted source revision date.
pub const DATE_PLACEHOLDER: &str = "{date}";

/// Configuration for the trance editing layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranceConfig {
    /// Entity type id whose field definitions are consulted.
    pub entity_type_id: String,
    /// Field used as the entity's display label.
    pub label_field: String,
    /// chrono format string for dates shown in confirmation text.
    pub date_format: String,
    /// Initial state of the "revert content shared among translations" option.
    pub revert_shared_fields_default: bool,
    /// Log message recorded on reverted revisions; `{date}` is replaced by
    /// the source revision's creation date.
    pub revision_log_template: String,
}

impl Default for TranceConfig {
    fn default() -> Self {
        Self {
            entity_type_id: "trance".to_string(),
            label_field: "name".to_string(),
            date_format: "%a, %m/%d/%Y - %H:%M".to_string(),
            revert_shared_fields_default: false,
            revision_log_template: "Copy of the revision from {date}.".to_string(),
        }
    }
}

impl TranceConfig {
    /// Create TranceConfig from environment variables.
    ///
    /// Environment variables:
    /// - `TRANCE_ENTITY_TYPE`: Entity type id (default: "trance")
    /// - `TRANCE_LABEL_FIELD`: Label field name (default: "name")
    /// - `TRANCE_DATE_FORMAT`: chrono format string for dates
    /// - `TRANCE_REVERT_SHARED_FIELDS`: "true" or "false" (default: false)
    /// - `TRANCE_REVISION_LOG_TEMPLATE`: Log message for reverted revisions
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let string_var = |name: &str, fallback: String| {
            std::env::var(name)
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(fallback)
        };

        let revert_shared_fields_default = std::env::var("TRANCE_REVERT_SHARED_FIELDS")
            .ok()
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(defaults.revert_shared_fields_default);

        Self {
            entity_type_id: string_var("TRANCE_ENTITY_TYPE", defaults.entity_type_id),
            label_field: string_var("TRANCE_LABEL_FIELD", defaults.label_field),
            date_format: string_var("TRANCE_DATE_FORMAT", defaults.date_format),
            revert_shared_fields_default,
            revision_log_template: string_var(
                "TRANCE_REVISION_LOG_TEMPLATE",
                defaults.revision_log_template,
            ),
        }
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - entity_type_id and label_field are non-empty
    /// - date_format is a valid chrono format string
    pub fn validate(&self) -> TranceResult<()> {
        for (field, value) in [
            ("entity_type_id", &self.entity_type_id),
            ("label_field", &self.label_field),
            ("date_format", &self.date_format),
        ] {
            if value.trim().is_empty() {
                return Err(TranceError::Config(ConfigError::MissingRequired {
                    field: field.to_string(),
                }));
            }
        }

        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(TranceError::Config(ConfigError::InvalidValue {
                field: "date_format".to_string(),
                value: self.date_format.clone(),
                reason: "not a valid chrono format string".to_string(),
            }));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TranceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.entity_type_id, "trance");
        assert!(!config.revert_shared_fields_default);
        assert!(config.revision_log_template.contains(DATE_PLACEHOLDER));
    }

    #[test]
    fn test_validate_rejects_empty_label_field() {
        let config = TranceConfig {
            label_field: "  ".to_string(),
            ..TranceConfig::default()
        };
        match config.validate() {
            Err(TranceError::Config(ConfigError::MissingRequired { field })) => {
                assert_eq!(field, "label_field");
            }
            other => panic!("Expected MissingRequired, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_bad_date_format() {
        let config = TranceConfig {
            date_format: "%Y-%".to_string(),
            ..TranceConfig::default()
        };
        match config.validate() {
            Err(TranceError::Config(ConfigError::InvalidValue { field, .. })) => {
                assert_eq!(field, "date_format");
            }
            other => panic!("Expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_config_serialized_fields() {
        let json = serde_json::to_value(TranceConfig::default()).unwrap();
        let mut keys: Vec<&str> = json
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "date_format",
                "entity_type_id",
                "label_field",
                "revert_shared_fields_default",
                "revision_log_template",
            ]
        );
    }

    #[test]
    fn test_from_env_defaults() {
        // Unset variables fall back to the defaults.
        std::env::remove_var("TRANCE_LABEL_FIELD");
        std::env::remove_var("TRANCE_REVERT_SHARED_FIELDS");
        let config = TranceConfig::from_env();
        assert_eq!(config.label_field, "name");
        assert!(!config.revert_shared_fields_default);
        assert!(config.validate().is_ok());
    }
}
