// SPDX-FileCopyrightText: 2026 Barnacles Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the barnacles-store configuration system.

use barnacles_config::diagnostic::ConfigError;
use barnacles_config::model::BarnaclesConfig;
use barnacles_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};
use barnacles_core::{EventKind, RaddecEventType};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_barnacles_config() {
    let toml = r#"
print_errors = true
log_level = "debug"

[connection]
database_path = "/tmp/pareto.db"
wal_mode = false
busy_timeout_ms = 250

[events.raddec]
include_packets = true

[events.raddec.filter]
accepted_events = ["appearance", "keepalive"]
accepted_transmitter_ids = ["fee150bada55"]
min_rssi = -80

[events.dynamb]

[tables]
raddec_table = "radio_decodings"
raddec_column = "payload"
dynamb_table = "ambient"
dynamb_column = "payload"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert!(config.print_errors);
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.connection.database_path, "/tmp/pareto.db");
    assert!(!config.connection.wal_mode);
    assert_eq!(config.connection.busy_timeout_ms, 250);

    let events = config.events_to_store();
    let raddec = events.raddec.expect("raddec configured");
    assert!(raddec.include_packets);
    let filter = raddec.filter_spec();
    assert_eq!(
        filter.accepted_events,
        vec![RaddecEventType::Appearance, RaddecEventType::Keepalive]
    );
    assert_eq!(filter.accepted_transmitter_ids, vec!["fee150bada55"]);
    assert_eq!(filter.min_rssi, Some(-80));
    assert!(events.dynamb.is_some());

    let target = config.tables.target(EventKind::Raddec).unwrap();
    assert_eq!(target.table(), "radio_decodings");
    assert_eq!(target.column(), "payload");
}

/// Omitting the events section stores every supported kind.
#[test]
fn missing_events_section_stores_everything() {
    let config = load_config_from_str("print_errors = false\n").unwrap();
    assert!(config.events.is_none());
    let events = config.events_to_store();
    assert!(events.stores(EventKind::Raddec));
    assert!(events.stores(EventKind::Dynamb));
}

/// A kind left out of an explicit events section is not persisted, even
/// though the compiled defaults enable it.
#[test]
fn explicit_events_section_is_not_merged_with_defaults() {
    let config = load_config_from_str("[events.dynamb]\n").unwrap();
    let events = config.events_to_store();
    assert!(events.stores(EventKind::Dynamb));
    assert!(!events.stores(EventKind::Raddec));
}

/// Unknown top-level key produces an UnknownKey diagnostic with a suggestion.
#[test]
fn unknown_top_level_key_suggests_correction() {
    let errors = load_and_validate_str("print_erors = true\n").unwrap_err();
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { key, suggestion, .. }
            if key == "print_erors" && suggestion.as_deref() == Some("print_errors")
    )));
}

/// Unknown key in [connection] section is rejected.
#[test]
fn unknown_field_in_connection_produces_error() {
    let toml = r#"
[connection]
databse_path = "/tmp/x.db"
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { suggestion, .. } if suggestion.as_deref() == Some("database_path")
    )));
}

/// A misspelled raddec event name produces an UnknownValue diagnostic.
#[test]
fn misspelled_event_type_suggests_correction() {
    let toml = r#"
[events.raddec.filter]
accepted_events = ["apperance"]
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownValue { value, suggestion, .. }
            if value == "apperance" && suggestion.as_deref() == Some("appearance")
    )));
}

/// Wrong value type is reported as InvalidType.
#[test]
fn wrong_type_produces_invalid_type() {
    let toml = r#"
[connection]
wal_mode = "yes"
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("wal_mode")))
    );
}

/// Semantic validation runs after a successful parse.
#[test]
fn bad_identifier_fails_validation() {
    let toml = r#"
[tables]
dynamb_table = "dynamb'); DROP TABLE raddec; --"
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { message } if message.contains("tables.dynamb_table"))
    ));
}

/// Defaults survive a figment round trip with no user input.
#[test]
fn defaults_round_trip_through_figment() {
    let config = load_and_validate_str("").expect("empty config is valid");
    let defaults = BarnaclesConfig::default();
    assert_eq!(config.log_level, defaults.log_level);
    assert_eq!(config.tables, defaults.tables);
    assert!(!config.print_errors);
}

/// Environment variables override file values.
#[test]
fn env_overrides_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "custom.toml",
            r#"
print_errors = false

[tables]
dynamb_table = "from_file"
"#,
        )?;
        jail.set_env("BARNACLES_PRINT_ERRORS", "true");
        jail.set_env("BARNACLES_TABLES_DYNAMB_TABLE", "from_env");
        jail.set_env("BARNACLES_CONNECTION_DATABASE_PATH", "/tmp/env.db");

        let config = load_and_validate_path(std::path::Path::new("custom.toml"))
            .map_err(|errors| format!("{errors:?}"))?;
        assert!(config.print_errors);
        assert_eq!(config.tables.dynamb_table, "from_env");
        assert_eq!(config.connection.database_path, "/tmp/env.db");
        Ok(())
    });
}

/// The resolved config serializes back to TOML that loads to the same values.
#[test]
fn resolved_config_serializes_to_toml() {
    let config = load_config_from_str("[events.dynamb]\n[tables]\ndynamb_table = \"ambient\"\n")
        .unwrap();
    let rendered = toml::to_string_pretty(&config).expect("config serializes");
    let reloaded = load_config_from_str(&rendered).unwrap();
    assert_eq!(reloaded.tables.dynamb_table, "ambient");
    assert_eq!(reloaded.events_to_store(), config.events_to_store());
}
