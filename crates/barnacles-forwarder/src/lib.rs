// SPDX-FileCopyrightText: 2026 Barnacles Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event forwarding pipeline for barnacles-store.
//!
//! Events enter through [`Forwarder::handle_event`], pass the kind gate and
//! (for raddecs) the [`RaddecFilter`], are compiled into parameterized
//! requests by the [`RequestCompiler`], and are executed one at a time by the
//! [`WriteQueue`]. Each persisted event is re-emitted with its `_storeId` to
//! every [`Forwarder::subscribe`] listener.

pub mod compiler;
pub mod emitter;
pub mod filter;
pub mod queue;
pub mod recording;
pub mod router;

pub use compiler::{configured_targets, RequestCompiler};
pub use emitter::EventEmitter;
pub use filter::{EventFilter, RaddecFilter};
pub use queue::{SubmitOutcome, WriteQueue};
pub use recording::register_metrics;
pub use router::{Dispatch, Forwarder};
