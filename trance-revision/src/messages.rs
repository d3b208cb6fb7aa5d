//! Human-readable text around a revert: the confirmation question, the log
//! message stamped on the new revision and the success summary.

use std::fmt::Write;
use trance_core::{Langcode, Timestamp, TranceConfig, DATE_PLACEHOLDER};

/// Format a revision date with the configured chrono format.
///
/// A format string chrono cannot render falls back to RFC 3339.
pub fn format_date(timestamp: &Timestamp, config: &TranceConfig) -> String {
    let mut out = String::new();
    match write!(out, "{}", timestamp.format(&config.date_format)) {
        Ok(()) => out,
        Err(_) => timestamp.to_rfc3339(),
    }
}

/// Confirmation question shown before reverting.
pub fn revert_question(
    langcode: Option<&Langcode>,
    source_time: &Timestamp,
    config: &TranceConfig,
) -> String {
    let date = format_date(source_time, config);
    match langcode {
        Some(langcode) => format!(
            "Are you sure you want to revert {} translation to the revision from {}?",
            langcode, date
        ),
        None => format!(
            "Are you sure you want to revert to the revision from {}?",
            date
        ),
    }
}

/// Log message recorded on the revision a revert creates.
pub fn revision_log(source_time: &Timestamp, config: &TranceConfig) -> String {
    config
        .revision_log_template
        .replace(DATE_PLACEHOLDER, &format_date(source_time, config))
}

/// Summary reported once a revert has been committed.
pub fn revert_summary(
    label: &str,
    langcode: Option<&Langcode>,
    source_time: &Timestamp,
    config: &TranceConfig,
) -> String {
    let date = format_date(source_time, config);
    match langcode {
        Some(langcode) => format!(
            "Trance {} {} translation has been reverted to the revision from {}.",
            label, langcode, date
        ),
        None => format!(
            "Trance {} has been reverted to the revision from {}.",
            label, date
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn source_time() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap()
    }

    #[test]
    fn test_format_date_uses_config() {
        let config = TranceConfig::default();
        assert_eq!(format_date(&source_time(), &config), "Sat, 03/09/2024 - 14:05");

        let iso = TranceConfig {
            date_format: "%Y-%m-%d".to_string(),
            ..TranceConfig::default()
        };
        assert_eq!(format_date(&source_time(), &iso), "2024-03-09");
    }

    #[test]
    fn test_format_date_falls_back_on_bad_format() {
        let config = TranceConfig {
            date_format: "%Y-%".to_string(),
            ..TranceConfig::default()
        };
        assert_eq!(format_date(&source_time(), &config), source_time().to_rfc3339());
    }

    #[test]
    fn test_revert_question() {
        let config = TranceConfig::default();
        assert_eq!(
            revert_question(None, &source_time(), &config),
            "Are you sure you want to revert to the revision from Sat, 03/09/2024 - 14:05?"
        );
        assert_eq!(
            revert_question(Some(&Langcode::from("fr")), &source_time(), &config),
            "Are you sure you want to revert fr translation to the revision from Sat, 03/09/2024 - 14:05?"
        );
    }

    #[test]
    fn test_revision_log_substitutes_date() {
        let config = TranceConfig::default();
        assert_eq!(
            revision_log(&source_time(), &config),
            "Copy of the revision from Sat, 03/09/2024 - 14:05."
        );

        let fixed = TranceConfig {
            revision_log_template: "Reverted".to_string(),
            ..TranceConfig::default()
        };
        assert_eq!(revision_log(&source_time(), &fixed), "Reverted");
    }

    #[test]
    fn test_revert_summary() {
        let config = TranceConfig::default();
        assert_eq!(
            revert_summary("Hello", None, &source_time(), &config),
            "Trance Hello has been reverted to the revision from Sat, 03/09/2024 - 14:05."
        );
        assert_eq!(
            revert_summary("Hello", Some(&Langcode::from("en")), &source_time(), &config),
            "Trance Hello en translation has been reverted to the revision from Sat, 03/09/2024 - 14:05."
        );
    }
}
