// SPDX-FileCopyrightText: 2026 Barnacles Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite store connection for barnacles-store.
//!
//! Provides WAL-mode SQLite storage for persisted events. All statements go
//! through one `tokio-rusqlite` connection and its single background thread;
//! the forwarder's write queue additionally guarantees that at most one
//! statement is outstanding at a time.

pub mod connection;
pub mod database;
pub mod queries;

pub use connection::{connect, SqliteConnection};
pub use database::Database;
pub use queries::events::StoredRow;
