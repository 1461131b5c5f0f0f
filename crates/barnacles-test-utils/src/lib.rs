// SPDX-FileCopyrightText: 2026 Barnacles Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for barnacles-store.
//!
//! Provides a mock store connection and telemetry fixtures for fast,
//! deterministic tests without a database.
//!
//! # Components
//!
//! - [`MockConnection`] - Store connection that records, gates, and fails executions
//! - [`fixtures`] - Sample raddec and dynamb events

pub mod fixtures;
pub mod mock_connection;

pub use mock_connection::{MockConnection, RecordedExecution};
