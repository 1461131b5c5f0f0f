// SPDX-FileCopyrightText: 2026 Barnacles Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for barnacles-store.

use thiserror::Error;

use crate::types::ConnectionState;

/// The primary error type used across the connection trait and the forwarding pipeline.
#[derive(Debug, Error)]
pub enum BarnaclesError {
    /// Configuration errors (invalid TOML, bad identifiers, unsupported values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database open, statement failure, constraint violation).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Event payload could not be serialized for persistence.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An inbound value could not be interpreted as an event.
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    /// The connection was asked to execute while not in the `Ready` state.
    #[error("connection not ready (state: {state})")]
    ConnectionNotReady { state: ConnectionState },

    /// A table or column name is not a plain SQL identifier.
    #[error("invalid SQL identifier `{0}`")]
    InvalidIdentifier(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BarnaclesError {
    /// Wrap any storage-layer error.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage {
            source: Box::new(err),
        }
    }
}
