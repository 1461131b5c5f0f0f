// SPDX-FileCopyrightText: 2026 Barnacles Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Compiles events into parameterized persistence requests.
//!
//! Statement text only ever contains validated, quoted identifiers. The
//! serialized payload is bound as parameter `?1` by the connection.

use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value};

use barnacles_config::model::{BarnaclesConfig, EventsToStore, TableConfig};
use barnacles_core::{BarnaclesError, Event, EventKind, PersistenceRequest, Target};

/// Raw radio payloads carried by a raddec; omitted unless `include_packets`.
const PACKETS_FIELD: &str = "packets";

/// Turns events into [`PersistenceRequest`]s for the configured targets.
#[derive(Debug, Clone)]
pub struct RequestCompiler {
    events: EventsToStore,
    raddec: Target,
    dynamb: Target,
}

impl RequestCompiler {
    /// Build a compiler from per-kind options and table names.
    ///
    /// Fails if a table or column name is not a valid identifier.
    pub fn new(events: EventsToStore, tables: &TableConfig) -> Result<Self, BarnaclesError> {
        Ok(Self {
            events,
            raddec: tables.target(EventKind::Raddec)?,
            dynamb: tables.target(EventKind::Dynamb)?,
        })
    }

    pub fn from_config(config: &BarnaclesConfig) -> Result<Self, BarnaclesError> {
        Self::new(config.events_to_store(), &config.tables)
    }

    /// Whether events of `kind` are persisted at all.
    pub fn stores(&self, kind: EventKind) -> bool {
        self.events.stores(kind)
    }

    pub fn target(&self, kind: EventKind) -> &Target {
        match kind {
            EventKind::Raddec => &self.raddec,
            EventKind::Dynamb => &self.dynamb,
        }
    }

    /// Targets of every kind that is persisted, for table initialization.
    pub fn targets(&self) -> Vec<Target> {
        [EventKind::Raddec, EventKind::Dynamb]
            .into_iter()
            .filter(|kind| self.stores(*kind))
            .map(|kind| self.target(kind).clone())
            .collect()
    }

    /// Compile `event` into a request for the `kind` target.
    ///
    /// The event moves into the request as its origin, so it can be
    /// correlated with the store identifier once the insert completes.
    pub fn compile(
        &self,
        kind: EventKind,
        event: Event,
    ) -> Result<PersistenceRequest, BarnaclesError> {
        let payload = match kind {
            EventKind::Raddec => {
                let options = self.events.raddec.as_ref().ok_or_else(|| not_stored(kind))?;
                if options.include_packets {
                    serde_json::to_string(&event)?
                } else {
                    serde_json::to_string(&Omitting {
                        fields: event.fields(),
                        omit: PACKETS_FIELD,
                    })?
                }
            }
            EventKind::Dynamb => {
                self.events.dynamb.as_ref().ok_or_else(|| not_stored(kind))?;
                serde_json::to_string(&event)?
            }
        };

        let target = self.target(kind).clone();
        Ok(PersistenceRequest {
            kind,
            statement: insert_statement(&target),
            target,
            payload,
            origin: event,
        })
    }
}

/// Targets of every persisted kind named by `config`.
pub fn configured_targets(config: &BarnaclesConfig) -> Result<Vec<Target>, BarnaclesError> {
    Ok(RequestCompiler::from_config(config)?.targets())
}

/// `INSERT INTO "<table>" ("<column>") VALUES (?1) RETURNING rowid`.
pub fn insert_statement(target: &Target) -> String {
    format!(
        "INSERT INTO \"{}\" (\"{}\") VALUES (?1) RETURNING rowid",
        target.table(),
        target.column()
    )
}

fn not_stored(kind: EventKind) -> BarnaclesError {
    BarnaclesError::Config(format!("events of kind {kind} are not configured for storage"))
}

/// Serializes a field map with one field left out, without cloning it.
struct Omitting<'a> {
    fields: &'a Map<String, Value>,
    omit: &'a str,
}

impl Serialize for Omitting<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.fields.iter().filter(|(key, _)| key.as_str() != self.omit))
    }
}
