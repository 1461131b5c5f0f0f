// SPDX-FileCopyrightText: 2026 Barnacles Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics. Without an installed recorder every call is a
//! no-op.

use metrics::{describe_counter, describe_gauge};

use barnacles_core::EventKind;

/// Register all barnacles metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "barnacles_events_received_total",
        "Events handed to the forwarder"
    );
    describe_counter!(
        "barnacles_events_filtered_total",
        "Events rejected by a filter"
    );
    describe_counter!(
        "barnacles_events_stored_total",
        "Events persisted and re-emitted"
    );
    describe_counter!(
        "barnacles_events_dropped_total",
        "Requests dropped because the connection was not ready"
    );
    describe_counter!(
        "barnacles_events_failed_total",
        "Requests whose execution failed"
    );
    describe_gauge!(
        "barnacles_queue_pending",
        "Requests waiting behind the in-flight request"
    );
}

pub fn record_received(kind: EventKind) {
    metrics::counter!("barnacles_events_received_total", "kind" => kind.to_string()).increment(1);
}

pub fn record_filtered(kind: EventKind) {
    metrics::counter!("barnacles_events_filtered_total", "kind" => kind.to_string()).increment(1);
}

pub fn record_stored(kind: EventKind) {
    metrics::counter!("barnacles_events_stored_total", "kind" => kind.to_string()).increment(1);
}

pub fn record_dropped(kind: EventKind) {
    metrics::counter!("barnacles_events_dropped_total", "kind" => kind.to_string()).increment(1);
}

pub fn record_failed(kind: EventKind) {
    metrics::counter!("barnacles_events_failed_total", "kind" => kind.to_string()).increment(1);
}

/// Set the backlog length.
pub fn set_queue_pending(count: usize) {
    metrics::gauge!("barnacles_queue_pending").set(count as f64);
}
