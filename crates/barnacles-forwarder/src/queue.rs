// SPDX-FileCopyrightText: 2026 Barnacles Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-flight FIFO write queue.
//!
//! Requests are executed one at a time, in submission order, by a drain task
//! that exists only while there is work. The idle/busy flag and the backlog
//! live behind one mutex, so two concurrent submits can never both observe
//! "idle" and both start a drain task.
//!
//! Two policies are deliberate:
//! - a request submitted while the connection is not ready is dropped, not
//!   queued or replayed later;
//! - an execution has no timeout, so a stalled connection stalls the queue.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, error, trace};

use barnacles_core::{
    BarnaclesError, ConnectionState, EventKind, PersistenceRequest, RequestId, StoreConnection,
    StoredEvent,
};

use crate::emitter::EventEmitter;
use crate::recording;

/// What happened to a submitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Accepted into the backlog; it will execute after every earlier request.
    Queued(RequestId),
    /// Discarded because the connection reported this state.
    Dropped(ConnectionState),
}

/// Routes failures either to `error!` or to `debug!`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Diagnostics {
    print_errors: bool,
}

impl Diagnostics {
    pub(crate) fn new(print_errors: bool) -> Self {
        Self { print_errors }
    }

    fn dropped(self, kind: EventKind, state: ConnectionState) {
        if self.print_errors {
            error!(%kind, %state, "connection not ready, request dropped");
        } else {
            debug!(%kind, %state, "connection not ready, request dropped");
        }
    }

    fn failed(self, kind: EventKind, id: RequestId, err: &BarnaclesError) {
        if self.print_errors {
            error!(%kind, request_id = %id, error = %err, "request execution failed");
        } else {
            debug!(%kind, request_id = %id, error = %err, "request execution failed");
        }
    }

    pub(crate) fn rejected(self, kind: EventKind, err: &BarnaclesError) {
        if self.print_errors {
            error!(%kind, error = %err, "event could not be compiled");
        } else {
            debug!(%kind, error = %err, "event could not be compiled");
        }
    }
}

struct Pending {
    id: RequestId,
    request: PersistenceRequest,
}

#[derive(Default)]
struct QueueState {
    backlog: VecDeque<Pending>,
    in_flight: bool,
    next_id: u64,
}

impl QueueState {
    /// Requests accepted but not yet completed.
    fn outstanding(&self) -> usize {
        self.backlog.len() + usize::from(self.in_flight)
    }
}

struct Shared {
    connection: Arc<dyn StoreConnection>,
    emitter: EventEmitter,
    diagnostics: Diagnostics,
    state: Mutex<QueueState>,
    outstanding: watch::Sender<usize>,
    runtime: Handle,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish the counters. Called with the state lock held.
    fn publish(&self, state: &QueueState) {
        self.outstanding.send_replace(state.outstanding());
        recording::set_queue_pending(state.backlog.len());
    }
}

/// The write queue for one connection.
///
/// Cloning is cheap and every clone feeds the same backlog.
#[derive(Clone)]
pub struct WriteQueue {
    shared: Arc<Shared>,
}

impl WriteQueue {
    /// Create a queue whose drain task runs on the current tokio runtime.
    ///
    /// Fails when called outside a runtime. Once created, [`submit`](Self::submit)
    /// may be called from any thread.
    pub fn new(
        connection: Arc<dyn StoreConnection>,
        emitter: EventEmitter,
        print_errors: bool,
    ) -> Result<Self, BarnaclesError> {
        let runtime = Handle::try_current().map_err(|e| {
            BarnaclesError::Internal(format!("write queue requires a tokio runtime: {e}"))
        })?;
        Ok(Self::with_runtime(
            connection,
            emitter,
            Diagnostics::new(print_errors),
            runtime,
        ))
    }

    pub(crate) fn with_runtime(
        connection: Arc<dyn StoreConnection>,
        emitter: EventEmitter,
        diagnostics: Diagnostics,
        runtime: Handle,
    ) -> Self {
        let (outstanding, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                connection,
                emitter,
                diagnostics,
                state: Mutex::new(QueueState::default()),
                outstanding,
                runtime,
            }),
        }
    }

    /// Accept `request` for execution after every earlier request.
    ///
    /// Never blocks. The request is dropped if the connection is not ready
    /// at this moment. The request is consumed either way, so it can only
    /// ever execute once.
    pub fn submit(&self, request: PersistenceRequest) -> SubmitOutcome {
        let kind = request.kind;
        let state = self.shared.connection.state();
        if !state.is_ready() {
            recording::record_dropped(kind);
            self.shared.diagnostics.dropped(kind, state);
            return SubmitOutcome::Dropped(state);
        }

        let (id, start_drain) = {
            let mut queue = self.shared.lock();
            let id = RequestId(queue.next_id);
            queue.next_id += 1;
            queue.backlog.push_back(Pending { id, request });
            let start_drain = !queue.in_flight;
            queue.in_flight = true;
            self.shared.publish(&queue);
            (id, start_drain)
        };

        trace!(%kind, request_id = %id, start_drain, "request queued");
        if start_drain {
            let shared = Arc::clone(&self.shared);
            self.shared.runtime.spawn(drain(shared));
        }
        SubmitOutcome::Queued(id)
    }

    /// Requests waiting behind the in-flight one.
    pub fn pending(&self) -> usize {
        self.shared.lock().backlog.len()
    }

    /// Whether a request has been handed to the connection and not yet completed.
    pub fn is_in_flight(&self) -> bool {
        self.shared.lock().in_flight
    }

    /// Wait until every accepted request has completed and been re-emitted.
    pub async fn drained(&self) {
        let mut rx = self.shared.outstanding.subscribe();
        // The sender is owned by `self`, so the channel cannot close here.
        let _ = rx.wait_for(|outstanding| *outstanding == 0).await;
    }

    pub fn connection(&self) -> &Arc<dyn StoreConnection> {
        &self.shared.connection
    }
}

impl std::fmt::Debug for WriteQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let queue = self.shared.lock();
        f.debug_struct("WriteQueue")
            .field("connection", &self.shared.connection.name())
            .field("pending", &queue.backlog.len())
            .field("in_flight", &queue.in_flight)
            .finish()
    }
}

/// Execute the backlog head-first until it is empty.
///
/// Only one drain task exists at a time: it is spawned by the submit that
/// flips `in_flight` on, and it flips `in_flight` off under the same lock
/// that tells it the backlog is empty.
async fn drain(shared: Arc<Shared>) {
    loop {
        let next = {
            let mut queue = shared.lock();
            let next = queue.backlog.pop_front();
            if next.is_none() {
                queue.in_flight = false;
            }
            shared.publish(&queue);
            next
        };
        let Some(pending) = next else {
            trace!("write queue idle");
            return;
        };
        execute(&shared, pending).await;
    }
}

async fn execute(shared: &Shared, pending: Pending) {
    let Pending { id, request } = pending;
    let kind = request.kind;
    trace!(%kind, request_id = %id, target = %request.target, "executing request");

    let result = shared.connection.execute(&request).await;
    match result {
        Ok(outcome) => {
            let mut event = request.origin;
            if let Some(store_id) = outcome.store_id {
                event.attach_store_id(store_id);
            }
            recording::record_stored(kind);
            let delivered = shared.emitter.emit(StoredEvent { kind, event });
            debug!(%kind, request_id = %id, store_id = ?outcome.store_id, delivered, "event stored");
        }
        Err(err) => {
            recording::record_failed(kind);
            shared.diagnostics.failed(kind, id, &err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barnacles_core::{Event, StoreId, Target, STORE_ID_FIELD};
    use barnacles_test_utils::{fixtures, MockConnection};

    fn request(event: Event) -> PersistenceRequest {
        PersistenceRequest {
            kind: EventKind::Dynamb,
            target: Target::new("dynamb", "dynamb").unwrap(),
            statement: r#"INSERT INTO "dynamb" ("dynamb") VALUES (?1) RETURNING rowid"#.into(),
            payload: serde_json::to_string(&event).unwrap(),
            origin: event,
        }
    }

    fn queue(connection: Arc<MockConnection>) -> (WriteQueue, EventEmitter) {
        let emitter = EventEmitter::default();
        let queue = WriteQueue::new(connection, emitter.clone(), true).unwrap();
        (queue, emitter)
    }

    #[test]
    fn new_outside_runtime_fails() {
        let err = WriteQueue::new(Arc::new(MockConnection::new()), EventEmitter::default(), false)
            .unwrap_err();
        assert!(matches!(err, BarnaclesError::Internal(_)));
    }

    #[tokio::test]
    async fn backlog_waits_behind_in_flight_request() {
        let connection = Arc::new(MockConnection::gated());
        let (queue, _emitter) = queue(connection.clone());

        for temp in 1..=3 {
            let outcome = queue.submit(request(fixtures::event(serde_json::json!({ "temp": temp }))));
            assert!(matches!(outcome, SubmitOutcome::Queued(_)));
        }

        connection.wait_for_started(1).await;
        assert!(queue.is_in_flight());
        assert_eq!(queue.pending(), 2);
        assert_eq!(connection.started_count(), 1);

        connection.release(3);
        queue.drained().await;
        assert!(!queue.is_in_flight());
        assert_eq!(queue.pending(), 0);
        assert_eq!(
            connection.payloads(),
            vec![r#"{"temp":1}"#, r#"{"temp":2}"#, r#"{"temp":3}"#]
        );
        assert_eq!(connection.max_concurrency(), 1);
    }

    #[tokio::test]
    async fn request_ids_increase_in_submission_order() {
        let connection = Arc::new(MockConnection::gated());
        let (queue, _emitter) = queue(connection.clone());

        let first = queue.submit(request(fixtures::dynamb(1.0)));
        let second = queue.submit(request(fixtures::dynamb(2.0)));
        assert_eq!(first, SubmitOutcome::Queued(RequestId(0)));
        assert_eq!(second, SubmitOutcome::Queued(RequestId(1)));

        connection.release(2);
        queue.drained().await;
    }

    #[tokio::test]
    async fn not_ready_connection_drops_request() {
        let connection = Arc::new(MockConnection::new().with_state(ConnectionState::Connecting));
        let (queue, _emitter) = queue(connection.clone());

        let outcome = queue.submit(request(fixtures::dynamb(1.0)));
        assert_eq!(outcome, SubmitOutcome::Dropped(ConnectionState::Connecting));
        assert_eq!(queue.pending(), 0);
        assert!(!queue.is_in_flight());

        queue.drained().await;
        assert!(connection.executions().is_empty());
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn drop_is_logged_as_error_when_printing_errors() {
        let connection = Arc::new(MockConnection::new().with_state(ConnectionState::Closed));
        let (queue, _emitter) = queue(connection);

        queue.submit(request(fixtures::dynamb(1.0)));
        assert!(logs_contain("ERROR"));
        assert!(logs_contain("connection not ready, request dropped"));
        assert!(logs_contain("state=closed"));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn execution_failure_is_logged_with_request_id() {
        let connection = Arc::new(MockConnection::new().fail_execution(0));
        let (queue, _emitter) = queue(connection);

        queue.submit(request(fixtures::dynamb(1.0)));
        queue.drained().await;
        assert!(logs_contain("request execution failed"));
        assert!(logs_contain("request_id=req-0"));
        assert!(logs_contain("mock execution 0 failed"));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn quiet_mode_logs_drops_at_debug() {
        let connection = Arc::new(MockConnection::new().with_state(ConnectionState::Connecting));
        let queue = WriteQueue::new(connection, EventEmitter::default(), false).unwrap();

        queue.submit(request(fixtures::dynamb(1.0)));
        assert!(logs_contain("connection not ready, request dropped"));
        assert!(!logs_contain("ERROR"));
    }

    #[tokio::test]
    async fn success_attaches_store_id_and_emits() {
        let connection = Arc::new(MockConnection::new());
        let (queue, emitter) = queue(connection);
        let mut rx = emitter.subscribe();

        let event = fixtures::dynamb(22.0);
        queue.submit(request(event.clone()));
        let stored = rx.recv().await.unwrap();

        assert_eq!(stored.kind, EventKind::Dynamb);
        assert_eq!(stored.event.store_id(), Some(StoreId(1)));
        let mut expected = event;
        expected.insert(STORE_ID_FIELD, serde_json::json!(1));
        assert_eq!(stored.event, expected);
    }

    #[tokio::test]
    async fn success_without_row_emits_unchanged_event() {
        let connection = Arc::new(MockConnection::new().without_rows());
        let (queue, emitter) = queue(connection);
        let mut rx = emitter.subscribe();

        let event = fixtures::dynamb(22.0);
        queue.submit(request(event.clone()));
        let stored = rx.recv().await.unwrap();
        assert_eq!(stored.event, event);
    }

    #[tokio::test]
    async fn failure_is_not_emitted_and_queue_advances() {
        let connection = Arc::new(MockConnection::gated().fail_execution(0));
        let (queue, emitter) = queue(connection.clone());
        let mut rx = emitter.subscribe();

        queue.submit(request(fixtures::dynamb(1.0)));
        queue.submit(request(fixtures::dynamb(2.0)));
        connection.release(2);
        queue.drained().await;

        assert_eq!(connection.executions().len(), 2);
        let stored = rx.recv().await.unwrap();
        assert_eq!(stored.event.get("temperature"), Some(&serde_json::json!(2.0)));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn queue_restarts_after_going_idle() {
        let connection = Arc::new(MockConnection::new());
        let (queue, _emitter) = queue(connection.clone());

        queue.submit(request(fixtures::dynamb(1.0)));
        queue.drained().await;
        assert!(!queue.is_in_flight());

        queue.submit(request(fixtures::dynamb(2.0)));
        queue.drained().await;
        assert_eq!(connection.executions().len(), 2);
    }

    #[tokio::test]
    async fn drained_returns_immediately_when_idle() {
        let (queue, _emitter) = queue(Arc::new(MockConnection::new()));
        queue.drained().await;
        assert!(format!("{queue:?}").contains("mock-connection"));
    }
}
