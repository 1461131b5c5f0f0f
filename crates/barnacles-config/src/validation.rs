// SPDX-FileCopyrightText: 2026 Barnacles Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as SQL identifier syntax, non-empty paths, and known log levels.

use barnacles_core::types::is_sql_identifier;

use crate::diagnostic::ConfigError;
use crate::model::BarnaclesConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &BarnaclesConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.connection.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "connection.database_path must not be empty".to_string(),
        });
    }

    if !LOG_LEVELS.contains(&config.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "log_level `{}` is not one of {}",
                config.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    // Table and column names are quoted into statement text, so they must
    // be plain identifiers.
    let tables = &config.tables;
    for (key, value) in [
        ("tables.raddec_table", &tables.raddec_table),
        ("tables.raddec_column", &tables.raddec_column),
        ("tables.dynamb_table", &tables.dynamb_table),
        ("tables.dynamb_column", &tables.dynamb_column),
    ] {
        if !is_sql_identifier(value) {
            errors.push(ConfigError::Validation {
                message: format!(
                    "{key} `{value}` must contain only letters, digits, and underscores, and not start with a digit"
                ),
            });
        }
    }

    let explicit_filter = config
        .events
        .as_ref()
        .and_then(|events| events.raddec.as_ref())
        .and_then(|raddec| raddec.filter.as_ref());
    if explicit_filter.is_some_and(|filter| filter.accepted_events.is_empty()) {
        errors.push(ConfigError::Validation {
            message: "events.raddec.filter.accepted_events must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EventsToStore, FilterSpec, RaddecOptions};

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = BarnaclesConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = BarnaclesConfig::default();
        config.connection.database_path = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "database_path"));
    }

    #[test]
    fn injected_table_name_fails_validation() {
        let mut config = BarnaclesConfig::default();
        config.tables.dynamb_table = "dynamb; DROP TABLE raddec".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "tables.dynamb_table"));
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = BarnaclesConfig::default();
        config.log_level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "log_level"));
    }

    #[test]
    fn empty_accepted_events_fails_validation() {
        let mut config = BarnaclesConfig::default();
        config.events = Some(EventsToStore {
            raddec: Some(RaddecOptions {
                include_packets: false,
                filter: Some(FilterSpec {
                    accepted_events: vec![],
                    ..FilterSpec::default()
                }),
            }),
            dynamb: None,
        });
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "accepted_events"));
    }

    #[test]
    fn errors_are_collected_not_fail_fast() {
        let mut config = BarnaclesConfig::default();
        config.connection.database_path = String::new();
        config.tables.raddec_column = "1st".to_string();
        config.tables.dynamb_column = "a-b".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
