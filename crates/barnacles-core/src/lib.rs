// SPDX-FileCopyrightText: 2026 Barnacles Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for barnacles-store.
//!
//! This crate provides the event value, the persistence request and outcome
//! types, the error type, and the [`StoreConnection`] trait that every data
//! store backend implements.

pub mod error;
pub mod event;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::BarnaclesError;
pub use event::{Event, STORE_ID_FIELD};
pub use traits::StoreConnection;
pub use types::{
    ConnectionState, EventKind, ExecutionOutcome, PersistenceRequest, RaddecEventType,
    RequestId, StoreId, StoredEvent, Target,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn barnacles_error_has_all_variants() {
        let _config = BarnaclesError::Config("test".into());
        let _storage = BarnaclesError::storage(std::io::Error::other("test"));
        let _serialization =
            BarnaclesError::from(serde_json::from_str::<serde_json::Value>("{").unwrap_err());
        let _event = BarnaclesError::InvalidEvent("test".into());
        let _not_ready = BarnaclesError::ConnectionNotReady {
            state: ConnectionState::Connecting,
        };
        let _identifier = BarnaclesError::InvalidIdentifier("bad name".into());
        let _internal = BarnaclesError::Internal("test".into());
    }

    #[test]
    fn not_ready_error_names_the_state() {
        let err = BarnaclesError::ConnectionNotReady {
            state: ConnectionState::Failed,
        };
        assert_eq!(err.to_string(), "connection not ready (state: failed)");
    }

    #[test]
    fn stored_event_serialization() {
        let stored = StoredEvent {
            kind: EventKind::Dynamb,
            event: Event::try_from(serde_json::json!({"temperature": 20})).unwrap(),
        };
        let json = serde_json::to_value(&stored).expect("should serialize");
        assert_eq!(json, serde_json::json!({"kind": "dynamb", "event": {"temperature": 20}}));
        let parsed: StoredEvent = serde_json::from_value(json).expect("should deserialize");
        assert_eq!(parsed, stored);
    }

    #[test]
    fn store_connection_is_object_safe() {
        fn _assert_dyn(_: &dyn StoreConnection) {}
        fn _assert_arc(_: std::sync::Arc<dyn StoreConnection>) {}
    }
}
