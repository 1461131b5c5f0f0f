// SPDX-FileCopyrightText: 2026 Barnacles Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock store connection for deterministic testing.
//!
//! `MockConnection` implements `StoreConnection` and records every execution
//! it receives, so tests can assert order and single-flight behaviour
//! without a database.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, Semaphore};

use barnacles_core::{
    BarnaclesError, ConnectionState, EventKind, ExecutionOutcome, PersistenceRequest, StoreConnection,
    StoreId,
};

/// One execution observed by the mock, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedExecution {
    pub kind: EventKind,
    pub table: String,
    pub statement: String,
    pub payload: String,
}

/// A mock connection that records executions and can hold them open.
///
/// By default every execution completes immediately and returns a result
/// row with ids counting up from 1. [`MockConnection::gated`] makes each
/// execution wait for [`release`](MockConnection::release), which lets a
/// test pile up a backlog behind an in-flight request.
pub struct MockConnection {
    state: Mutex<ConnectionState>,
    executions: Mutex<Vec<RecordedExecution>>,
    failures: Mutex<HashSet<usize>>,
    gate: Option<Semaphore>,
    latency: Option<Duration>,
    returns_rows: bool,
    next_id: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    started: watch::Sender<usize>,
    closed: AtomicUsize,
}

impl MockConnection {
    /// A ready connection whose executions complete immediately.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A ready connection whose executions wait for [`release`](Self::release).
    pub fn gated() -> Self {
        Self::build(Some(Semaphore::new(0)))
    }

    fn build(gate: Option<Semaphore>) -> Self {
        let (started, _) = watch::channel(0);
        Self {
            state: Mutex::new(ConnectionState::Ready),
            executions: Mutex::new(Vec::new()),
            failures: Mutex::new(HashSet::new()),
            gate,
            latency: None,
            returns_rows: true,
            next_id: AtomicUsize::new(1),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            started,
            closed: AtomicUsize::new(0),
        }
    }

    /// Start in the given state instead of `Ready`.
    pub fn with_state(self, state: ConnectionState) -> Self {
        *lock(&self.state) = state;
        self
    }

    /// Sleep for `latency` inside every execution.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Complete successfully without a result row.
    pub fn without_rows(mut self) -> Self {
        self.returns_rows = false;
        self
    }

    /// Make the execution with the given zero-based index fail.
    pub fn fail_execution(self, index: usize) -> Self {
        lock(&self.failures).insert(index);
        self
    }

    /// Change the reported state.
    pub fn set_state(&self, state: ConnectionState) {
        *lock(&self.state) = state;
    }

    /// Let `count` gated executions complete.
    pub fn release(&self, count: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(count);
        }
    }

    /// Every execution received so far, in arrival order.
    pub fn executions(&self) -> Vec<RecordedExecution> {
        lock(&self.executions).clone()
    }

    /// Payloads of every execution received so far, in arrival order.
    pub fn payloads(&self) -> Vec<String> {
        lock(&self.executions)
            .iter()
            .map(|e| e.payload.clone())
            .collect()
    }

    /// Number of executions that have started.
    pub fn started_count(&self) -> usize {
        *self.started.borrow()
    }

    /// Largest number of executions ever outstanding at the same time.
    pub fn max_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Number of times `close` was called.
    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Wait until at least `count` executions have started.
    pub async fn wait_for_started(&self, count: usize) {
        let mut rx = self.started.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|started| *started >= count).await;
    }
}

impl Default for MockConnection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreConnection for MockConnection {
    fn name(&self) -> &str {
        "mock-connection"
    }

    fn state(&self) -> ConnectionState {
        *lock(&self.state)
    }

    async fn execute(
        &self,
        request: &PersistenceRequest,
    ) -> Result<ExecutionOutcome, BarnaclesError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let index = {
            let mut executions = lock(&self.executions);
            executions.push(RecordedExecution {
                kind: request.kind,
                table: request.target.table().to_string(),
                statement: request.statement.clone(),
                payload: request.payload.clone(),
            });
            executions.len() - 1
        };
        self.started.send_modify(|started| *started += 1);

        if let Some(gate) = &self.gate {
            // Closing the semaphore is never done, so acquire only fails if dropped.
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if lock(&self.failures).contains(&index) {
            return Err(BarnaclesError::storage(std::io::Error::other(format!(
                "mock execution {index} failed"
            ))));
        }
        let store_id = self
            .returns_rows
            .then(|| StoreId(self.next_id.fetch_add(1, Ordering::SeqCst) as i64));
        Ok(ExecutionOutcome { store_id })
    }

    async fn close(&self) -> Result<(), BarnaclesError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        self.set_state(ConnectionState::Closed);
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use barnacles_core::{Event, Target};

    fn request(payload: &str) -> PersistenceRequest {
        PersistenceRequest {
            kind: EventKind::Dynamb,
            target: Target::new("dynamb", "dynamb").unwrap(),
            statement: "INSERT".to_string(),
            payload: payload.to_string(),
            origin: Event::new(),
        }
    }

    #[tokio::test]
    async fn ids_count_up_from_one() {
        let connection = MockConnection::new();
        let first = connection.execute(&request("a")).await.unwrap();
        let second = connection.execute(&request("b")).await.unwrap();
        assert_eq!(first.store_id, Some(StoreId(1)));
        assert_eq!(second.store_id, Some(StoreId(2)));
        assert_eq!(connection.payloads(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn configured_failure_is_returned() {
        let connection = MockConnection::new().fail_execution(0);
        assert!(connection.execute(&request("a")).await.is_err());
        assert!(connection.execute(&request("b")).await.is_ok());
    }

    #[tokio::test]
    async fn gated_execution_waits_for_release() {
        let connection = std::sync::Arc::new(MockConnection::gated());
        let task = {
            let connection = connection.clone();
            tokio::spawn(async move { connection.execute(&request("held")).await })
        };

        connection.wait_for_started(1).await;
        assert!(!task.is_finished());
        connection.release(1);
        let outcome = task.await.unwrap().unwrap();
        assert_eq!(outcome.store_id, Some(StoreId(1)));
    }

    #[tokio::test]
    async fn without_rows_returns_no_id() {
        let connection = MockConnection::new().without_rows();
        let outcome = connection.execute(&request("a")).await.unwrap();
        assert_eq!(outcome.store_id, None);
    }
}
