// SPDX-FileCopyrightText: 2026 Barnacles Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection trait for single-flight data store backends.

use async_trait::async_trait;

use crate::error::BarnaclesError;
use crate::types::{ConnectionState, ExecutionOutcome, PersistenceRequest};

/// A connection to a data store that accepts one statement at a time.
///
/// Callers must not invoke [`execute`](Self::execute) again until the
/// previous future has resolved; implementations may corrupt or lose state
/// otherwise. The write queue is the component that upholds this.
#[async_trait]
pub trait StoreConnection: Send + Sync + 'static {
    /// Returns the human-readable name of this connection.
    fn name(&self) -> &str;

    /// Current readiness. Requests are only accepted while `Ready`.
    fn state(&self) -> ConnectionState;

    /// Executes one request.
    ///
    /// Resolves exactly once, when execution has finished. `Ok` carries the
    /// zero-or-one result row; `Err` reports an execution failure.
    async fn execute(
        &self,
        request: &PersistenceRequest,
    ) -> Result<ExecutionOutcome, BarnaclesError>;

    /// Closes the connection, flushing anything the backend buffers.
    async fn close(&self) -> Result<(), BarnaclesError>;
}
