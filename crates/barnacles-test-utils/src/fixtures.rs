// SPDX-FileCopyrightText: 2026 Barnacles Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sample raddec and dynamb events shaped like real telemetry.

use barnacles_core::Event;
use serde_json::json;

/// A raddec from transmitter `fee150bada55` reporting the given event codes.
///
/// Carries two receivers (strongest RSSI -64) and one raw packet.
pub fn raddec(events: &[u64]) -> Event {
    raddec_from("fee150bada55", events, -64)
}

/// A raddec with an explicit transmitter and strongest RSSI.
pub fn raddec_from(transmitter_id: &str, events: &[u64], strongest_rssi: i64) -> Event {
    event(json!({
        "transmitterId": transmitter_id,
        "transmitterIdType": 2,
        "rssiSignature": [
            {
                "receiverId": "001bc50940810000",
                "receiverIdType": 1,
                "rssi": strongest_rssi,
                "numberOfDecodings": 3
            },
            {
                "receiverId": "001bc50940820000",
                "receiverIdType": 1,
                "rssi": strongest_rssi - 12,
                "numberOfDecodings": 1
            }
        ],
        "packets": ["061b55daba50e1fe0201050303aafe1116aafe20000bf217920000003c0000003c"],
        "timestamp": 1_710_000_000_000_u64,
        "events": events
    }))
}

/// A dynamb from device `001bc50940810000` with a temperature reading.
pub fn dynamb(temperature: f64) -> Event {
    event(json!({
        "deviceId": "001bc50940810000",
        "deviceIdType": 1,
        "temperature": temperature,
        "timestamp": 1_710_000_000_000_u64
    }))
}

/// Wrap a JSON object literal as an event.
///
/// Panics if `value` is not an object; fixtures are always objects.
pub fn event(value: serde_json::Value) -> Event {
    match Event::try_from(value) {
        Ok(event) => event,
        Err(e) => panic!("fixture is not a JSON object: {e}"),
    }
}
