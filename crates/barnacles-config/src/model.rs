// SPDX-FileCopyrightText: 2026 Barnacles Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for barnacles-store.
//!
//! Structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup. The one exception is [`EventsToStore`], where
//! unsupported event kinds are ignored.

use serde::{Deserialize, Serialize};

use barnacles_core::{BarnaclesError, EventKind, RaddecEventType, Target};

/// Top-level barnacles-store configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BarnaclesConfig {
    /// Surface dropped requests and execution failures as errors.
    #[serde(default)]
    pub print_errors: bool,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Data store connection parameters.
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Which event kinds to persist. `None` stores every supported kind
    /// with its default options.
    #[serde(default)]
    pub events: Option<EventsToStore>,

    /// Table and column name overrides.
    #[serde(default)]
    pub tables: TableConfig,
}

impl Default for BarnaclesConfig {
    fn default() -> Self {
        Self {
            print_errors: false,
            log_level: default_log_level(),
            connection: ConnectionConfig::default(),
            events: None,
            tables: TableConfig::default(),
        }
    }
}

impl BarnaclesConfig {
    /// The effective per-kind options, applying the store-everything default.
    pub fn events_to_store(&self) -> EventsToStore {
        self.events.clone().unwrap_or_else(EventsToStore::all)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Data store connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// How long SQLite waits on a locked database before failing a statement.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("barnacles").join("pareto-anywhere.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("pareto-anywhere.db"))
        .display()
        .to_string()
}

fn default_wal_mode() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

/// Per-kind storage options. A kind that is absent is not persisted.
///
/// Not `deny_unknown_fields`: keys naming unsupported kinds are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EventsToStore {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raddec: Option<RaddecOptions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamb: Option<DynambOptions>,
}

impl EventsToStore {
    /// Every supported kind with default options.
    pub fn all() -> Self {
        Self {
            raddec: Some(RaddecOptions::default()),
            dynamb: Some(DynambOptions::default()),
        }
    }

    /// Whether events of `kind` are persisted.
    pub fn stores(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Raddec => self.raddec.is_some(),
            EventKind::Dynamb => self.dynamb.is_some(),
        }
    }
}

/// Options for raddec (radio decoding) events.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RaddecOptions {
    /// Keep the raw `packets` array in the stored payload.
    #[serde(default)]
    pub include_packets: bool,

    /// Which raddecs to store. `None` applies [`FilterSpec::default`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterSpec>,
}

impl RaddecOptions {
    /// The effective filter specification.
    pub fn filter_spec(&self) -> FilterSpec {
        self.filter.clone().unwrap_or_default()
    }
}

/// Options for dynamb (dynamic ambient) events. Presence enables the kind.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DynambOptions {}

/// Predicate parameters for raddec filtering.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FilterSpec {
    /// A raddec passes if any of its events is listed here.
    #[serde(default = "default_accepted_events")]
    pub accepted_events: Vec<RaddecEventType>,

    /// Transmitter identifiers to accept. Empty accepts any transmitter.
    #[serde(default)]
    pub accepted_transmitter_ids: Vec<String>,

    /// Minimum RSSI of the strongest receiver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rssi: Option<i64>,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            accepted_events: default_accepted_events(),
            accepted_transmitter_ids: Vec::new(),
            min_rssi: None,
        }
    }
}

fn default_accepted_events() -> Vec<RaddecEventType> {
    vec![
        RaddecEventType::Appearance,
        RaddecEventType::Displacement,
        RaddecEventType::Disappearance,
    ]
}

/// Table and column names per event kind.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TableConfig {
    #[serde(default = "default_raddec_name")]
    pub raddec_table: String,

    #[serde(default = "default_raddec_name")]
    pub raddec_column: String,

    #[serde(default = "default_dynamb_name")]
    pub dynamb_table: String,

    #[serde(default = "default_dynamb_name")]
    pub dynamb_column: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            raddec_table: default_raddec_name(),
            raddec_column: default_raddec_name(),
            dynamb_table: default_dynamb_name(),
            dynamb_column: default_dynamb_name(),
        }
    }
}

impl TableConfig {
    /// The validated target for `kind`.
    pub fn target(&self, kind: EventKind) -> Result<Target, BarnaclesError> {
        match kind {
            EventKind::Raddec => Target::new(&self.raddec_table, &self.raddec_column),
            EventKind::Dynamb => Target::new(&self.dynamb_table, &self.dynamb_column),
        }
    }
}

fn default_raddec_name() -> String {
    "raddec".to_string()
}

fn default_dynamb_name() -> String {
    "dynamb".to_string()
}
