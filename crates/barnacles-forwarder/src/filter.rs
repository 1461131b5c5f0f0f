// SPDX-FileCopyrightText: 2026 Barnacles Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filter evaluation for kinds that declare a filter specification.

use std::collections::HashSet;

use serde_json::Value;

use barnacles_config::model::FilterSpec;
use barnacles_core::{Event, RaddecEventType};

/// A pure predicate deciding whether an event continues down the pipeline.
pub trait EventFilter: Send + Sync {
    /// Returns true if `event` should be persisted.
    fn is_passing(&self, event: &Event) -> bool;
}

impl<F> EventFilter for F
where
    F: Fn(&Event) -> bool + Send + Sync,
{
    fn is_passing(&self, event: &Event) -> bool {
        self(event)
    }
}

/// Raddec filter built from a [`FilterSpec`].
///
/// An event passes when every configured criterion holds:
/// - at least one code in its `events` array is accepted,
/// - its `transmitterId` is accepted, if a transmitter list is configured,
/// - its strongest `rssiSignature` entry reaches `min_rssi`, if set.
///
/// Missing or malformed fields fail the criterion that reads them.
#[derive(Debug, Clone)]
pub struct RaddecFilter {
    accepted_events: HashSet<RaddecEventType>,
    accepted_transmitter_ids: HashSet<String>,
    min_rssi: Option<i64>,
}

impl RaddecFilter {
    pub fn new(spec: &FilterSpec) -> Self {
        Self {
            accepted_events: spec.accepted_events.iter().copied().collect(),
            accepted_transmitter_ids: spec
                .accepted_transmitter_ids
                .iter()
                .map(|id| id.to_lowercase())
                .collect(),
            min_rssi: spec.min_rssi,
        }
    }

    fn has_accepted_event(&self, event: &Event) -> bool {
        event
            .get("events")
            .and_then(Value::as_array)
            .is_some_and(|codes| {
                codes
                    .iter()
                    .filter_map(Value::as_u64)
                    .filter_map(RaddecEventType::from_code)
                    .any(|event_type| self.accepted_events.contains(&event_type))
            })
    }

    fn has_accepted_transmitter(&self, event: &Event) -> bool {
        if self.accepted_transmitter_ids.is_empty() {
            return true;
        }
        event
            .get("transmitterId")
            .and_then(Value::as_str)
            .is_some_and(|id| self.accepted_transmitter_ids.contains(&id.to_lowercase()))
    }

    fn is_strong_enough(&self, event: &Event) -> bool {
        let Some(min_rssi) = self.min_rssi else {
            return true;
        };
        strongest_rssi(event).is_some_and(|rssi| rssi >= min_rssi)
    }
}

impl Default for RaddecFilter {
    fn default() -> Self {
        Self::new(&FilterSpec::default())
    }
}

impl EventFilter for RaddecFilter {
    fn is_passing(&self, event: &Event) -> bool {
        self.has_accepted_event(event)
            && self.has_accepted_transmitter(event)
            && self.is_strong_enough(event)
    }
}

/// The highest RSSI among the receivers of a raddec.
fn strongest_rssi(event: &Event) -> Option<i64> {
    event
        .get("rssiSignature")?
        .as_array()?
        .iter()
        .filter_map(|receiver| receiver.get("rssi")?.as_i64())
        .max()
}
