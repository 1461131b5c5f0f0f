// SPDX-FileCopyrightText: 2026 Barnacles Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the connection trait and the forwarding pipeline.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::BarnaclesError;
use crate::event::Event;

/// The kind of a telemetry event. Gates whether and how it is persisted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Radio decoding: a transmitter observed by one or more receivers.
    Raddec,
    /// Dynamic ambient: a sensor-value reading.
    Dynamb,
}

/// Lifecycle transitions a raddec can report in its `events` array.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RaddecEventType {
    Appearance,
    Displacement,
    Packets,
    Keepalive,
    Disappearance,
}

impl RaddecEventType {
    /// Decode a numeric code from a raddec payload.
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Appearance),
            1 => Some(Self::Displacement),
            2 => Some(Self::Packets),
            3 => Some(Self::Keepalive),
            4 => Some(Self::Disappearance),
            _ => None,
        }
    }
}

/// Identifier generated by the data store for an inserted row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoreId(pub i64);

/// Sequence number assigned by the write queue when a request is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Readiness of a store connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    /// Not yet opened.
    Connecting,
    /// Open and accepting statements.
    Ready,
    /// Opening failed; nothing will be accepted.
    Failed,
    /// Closed by the owner.
    Closed,
}

impl ConnectionState {
    pub fn is_ready(self) -> bool {
        self == Self::Ready
    }
}

/// A validated table/column pair that one event kind is written to.
///
/// Both names have been checked by [`is_sql_identifier`], so they can be
/// quoted into statement text. Payloads are never placed in statement text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    table: String,
    column: String,
}

impl Target {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Result<Self, BarnaclesError> {
        let table = table.into();
        let column = column.into();
        for name in [&table, &column] {
            if !is_sql_identifier(name) {
                return Err(BarnaclesError::InvalidIdentifier(name.clone()));
            }
        }
        Ok(Self { table, column })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn column(&self) -> &str {
        &self.column
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// Returns true for `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A compiled unit of work for the store.
///
/// Deliberately not `Clone`: ownership moves into the write queue on submit
/// and the request is dropped once its execution has completed.
#[derive(Debug)]
pub struct PersistenceRequest {
    /// Kind of the originating event.
    pub kind: EventKind,
    /// Where the payload is written.
    pub target: Target,
    /// Parameterized statement text. The payload binds to `?1`.
    pub statement: String,
    /// Serialized event payload.
    pub payload: String,
    /// The event as received, for correlation after execution.
    pub origin: Event,
}

/// What a completed execution produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Identifier from the statement's result row, if one was returned.
    pub store_id: Option<StoreId>,
}

/// A persisted event as re-emitted to downstream listeners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub kind: EventKind,
    pub event: Event,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn event_kind_parses_lowercase_names() {
        assert_eq!(EventKind::from_str("raddec").unwrap(), EventKind::Raddec);
        assert_eq!(EventKind::from_str("dynamb").unwrap(), EventKind::Dynamb);
        assert!(EventKind::from_str("spatem").is_err());
        assert_eq!(EventKind::Dynamb.to_string(), "dynamb");
    }

    #[test]
    fn raddec_event_codes_are_stable() {
        let decoded: Vec<_> = (0..=5).map(RaddecEventType::from_code).collect();
        assert_eq!(
            decoded,
            vec![
                Some(RaddecEventType::Appearance),
                Some(RaddecEventType::Displacement),
                Some(RaddecEventType::Packets),
                Some(RaddecEventType::Keepalive),
                Some(RaddecEventType::Disappearance),
                None,
            ]
        );
    }

    #[test]
    fn identifiers_are_validated() {
        assert!(is_sql_identifier("raddec"));
        assert!(is_sql_identifier("_dynamb_2024"));
        assert!(!is_sql_identifier(""));
        assert!(!is_sql_identifier("2fast"));
        assert!(!is_sql_identifier("dynamb; DROP TABLE raddec"));
        assert!(!is_sql_identifier("my\"table"));
    }

    #[test]
    fn target_rejects_bad_names() {
        assert!(Target::new("raddec", "raddec").is_ok());
        let err = Target::new("raddec", "bad column").unwrap_err();
        assert!(matches!(err, BarnaclesError::InvalidIdentifier(name) if name == "bad column"));
    }

    #[test]
    fn connection_state_display() {
        assert_eq!(ConnectionState::Ready.to_string(), "ready");
        assert_eq!(ConnectionState::Connecting.to_string(), "connecting");
        assert!(!ConnectionState::Closed.is_ready());
    }
}
