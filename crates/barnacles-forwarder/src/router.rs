// SPDX-FileCopyrightText: 2026 Barnacles Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event routing: kind gate, filter, compile, submit.

use std::str::FromStr;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use barnacles_config::model::BarnaclesConfig;
use barnacles_core::{
    BarnaclesError, ConnectionState, Event, EventKind, RequestId, StoreConnection, StoredEvent,
    Target,
};

use crate::compiler::RequestCompiler;
use crate::emitter::EventEmitter;
use crate::filter::{EventFilter, RaddecFilter};
use crate::queue::{Diagnostics, SubmitOutcome, WriteQueue};
use crate::recording;

/// What the forwarder did with one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The kind is unknown or not configured for storage.
    Ignored,
    /// The kind's filter rejected the event.
    Filtered,
    /// The event could not be serialized.
    Rejected,
    /// The connection was not ready; nothing was queued.
    Dropped(ConnectionState),
    /// A request was queued for execution.
    Queued(RequestId),
}

impl From<SubmitOutcome> for Dispatch {
    fn from(outcome: SubmitOutcome) -> Self {
        match outcome {
            SubmitOutcome::Queued(id) => Self::Queued(id),
            SubmitOutcome::Dropped(state) => Self::Dropped(state),
        }
    }
}

/// Forwards events into the store and re-emits the ones that were persisted.
///
/// One forwarder owns one write queue and therefore one connection.
pub struct Forwarder {
    compiler: RequestCompiler,
    raddec_filter: Option<Arc<dyn EventFilter>>,
    queue: WriteQueue,
    emitter: EventEmitter,
    diagnostics: Diagnostics,
}

impl Forwarder {
    /// Build a forwarder around an already-constructed connection.
    ///
    /// Must be called inside a tokio runtime; the write queue spawns its
    /// drain task there.
    pub fn new(
        config: &BarnaclesConfig,
        connection: Arc<dyn StoreConnection>,
    ) -> Result<Self, BarnaclesError> {
        let compiler = RequestCompiler::from_config(config)?;
        let raddec_filter = config
            .events_to_store()
            .raddec
            .map(|options| Arc::new(RaddecFilter::new(&options.filter_spec())) as Arc<dyn EventFilter>);
        let emitter = EventEmitter::new();
        let queue = WriteQueue::new(connection, emitter.clone(), config.print_errors)?;

        info!(
            connection = queue.connection().name(),
            raddec = compiler.stores(EventKind::Raddec),
            dynamb = compiler.stores(EventKind::Dynamb),
            "forwarder ready"
        );

        Ok(Self {
            compiler,
            raddec_filter,
            queue,
            emitter,
            diagnostics: Diagnostics::new(config.print_errors),
        })
    }

    /// Replace the raddec filter built from configuration.
    ///
    /// Has no effect when raddecs are not configured for storage.
    pub fn with_raddec_filter(mut self, filter: impl EventFilter + 'static) -> Self {
        if self.raddec_filter.is_some() {
            self.raddec_filter = Some(Arc::new(filter));
        }
        self
    }

    /// Handle an event whose kind is given by name.
    ///
    /// Unknown kind names are ignored, exactly like unconfigured kinds.
    pub fn handle_event(&self, kind: &str, event: Event) -> Dispatch {
        match EventKind::from_str(kind) {
            Ok(kind) => self.handle(kind, event),
            Err(_) => {
                trace!(kind, "unsupported event kind ignored");
                Dispatch::Ignored
            }
        }
    }

    /// Handle one event of a known kind.
    ///
    /// Returns as soon as the request is queued; persistence and
    /// re-emission happen later on the drain task.
    pub fn handle(&self, kind: EventKind, event: Event) -> Dispatch {
        if !self.compiler.stores(kind) {
            trace!(%kind, "kind not configured for storage");
            return Dispatch::Ignored;
        }
        recording::record_received(kind);

        if kind == EventKind::Raddec {
            if let Some(filter) = &self.raddec_filter {
                if !filter.is_passing(&event) {
                    recording::record_filtered(kind);
                    trace!(%kind, "event rejected by filter");
                    return Dispatch::Filtered;
                }
            }
        }

        match self.compiler.compile(kind, event) {
            Ok(request) => self.queue.submit(request).into(),
            Err(err) => {
                self.diagnostics.rejected(kind, &err);
                Dispatch::Rejected
            }
        }
    }

    /// Register a listener for persisted events.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<StoredEvent> {
        self.emitter.subscribe()
    }

    /// Read-only view of the write queue.
    pub fn queue(&self) -> &WriteQueue {
        &self.queue
    }

    /// Targets that the connection must be able to write to.
    pub fn targets(&self) -> Vec<Target> {
        self.compiler.targets()
    }

    /// Wait until every queued request has completed.
    pub async fn drained(&self) {
        self.queue.drained().await;
    }

    /// Drain the queue, then close the connection.
    pub async fn shutdown(&self) -> Result<(), BarnaclesError> {
        self.drained().await;
        debug!("write queue drained, closing connection");
        self.queue.connection().close().await
    }
}
