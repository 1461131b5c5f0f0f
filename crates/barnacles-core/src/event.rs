// SPDX-FileCopyrightText: 2026 Barnacles Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The telemetry event value carried through the forwarding pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::BarnaclesError;
use crate::types::StoreId;

/// Field appended to an event once the store has assigned it an identifier.
pub const STORE_ID_FIELD: &str = "_storeId";

/// A telemetry event: a JSON object of named fields.
///
/// Each occurrence is a distinct value. The pipeline never rewrites existing
/// fields; the only mutation it performs is [`Event::attach_store_id`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(Map<String, Value>);

impl Event {
    /// Create an empty event.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Look up a field by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Insert or replace a field, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    /// Borrow the underlying field map.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume the event and return its field map.
    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    /// The store identifier attached to this event, if it has been persisted.
    pub fn store_id(&self) -> Option<StoreId> {
        self.0
            .get(STORE_ID_FIELD)
            .and_then(Value::as_i64)
            .map(StoreId)
    }

    /// Append the store identifier returned for this event's row.
    pub fn attach_store_id(&mut self, id: StoreId) {
        self.0.insert(STORE_ID_FIELD.to_string(), Value::from(id.0));
    }
}

impl From<Map<String, Value>> for Event {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl TryFrom<Value> for Event {
    type Error = BarnaclesError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(BarnaclesError::InvalidEvent(format!(
                "expected a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
