// SPDX-FileCopyrightText: 2026 Barnacles Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for the pluggable seams of barnacles-store.
//!
//! Traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod connection;

pub use connection::StoreConnection;
