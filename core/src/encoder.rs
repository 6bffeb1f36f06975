//! Message encoder
//!
//! Serializes a `Reading` into the JSON payload the collector expects.
//! Collectors key on field names, so each reading kind always emits the same
//! fields in the same order with the same JSON types:
//!
//! ```text
//! {"sensor_id":"0x01","temperature":22.5,"humidity":48.0,"timestamp":"1000"}
//! {"sensor_id":3,"state":1,"timestamp":"2000"}
//! ```
//!
//! The timestamp travels as a decimal string. Floats are written with the
//! shortest representation that round-trips the sensor's `f32`, so no
//! precision is added or removed.

use core::fmt::Write as _;

use heapless::{String, Vec};
use serde::Serialize;

use crate::reading::{Reading, ENVIRONMENT_SENSOR_ID};

/// Payload buffer size
///
/// The widest environmental payload (two `-3.4028235e38` floats and a
/// 20-digit timestamp) is 110 bytes.
pub const PAYLOAD_CAPACITY: usize = 128;

/// Maximum decimal digits in a `u64`
const TIMESTAMP_DIGITS: usize = 20;

#[derive(Serialize)]
struct EnvironmentMessage<'a> {
    sensor_id: &'a str,
    temperature: f32,
    humidity: f32,
    timestamp: &'a str,
}

#[derive(Serialize)]
struct DigitalMessage<'a> {
    sensor_id: u8,
    state: u8,
    timestamp: &'a str,
}

/// Serialized, self-contained JSON bytes ready for transmission
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payload {
    bytes: Vec<u8, PAYLOAD_CAPACITY>,
}

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Payload as text (always valid UTF-8 JSON)
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.bytes).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Encode a reading as a JSON payload
///
/// Encoding is total and deterministic: the same reading always yields
/// byte-identical output.
pub fn encode(reading: &Reading) -> Payload {
    let mut buf = [0u8; PAYLOAD_CAPACITY];
    let result = match *reading {
        Reading::TemperatureHumidity {
            temperature_celsius,
            humidity_percent,
            timestamp_ms,
        } => serde_json_core::to_slice(
            &EnvironmentMessage {
                sensor_id: ENVIRONMENT_SENSOR_ID,
                temperature: temperature_celsius,
                humidity: humidity_percent,
                timestamp: &timestamp_text(timestamp_ms),
            },
            &mut buf,
        ),
        Reading::DigitalState {
            sensor_id,
            state,
            timestamp_ms,
        } => serde_json_core::to_slice(
            &DigitalMessage {
                sensor_id,
                state: state.as_bit(),
                timestamp: &timestamp_text(timestamp_ms),
            },
            &mut buf,
        ),
    };

    // Cannot fail: PAYLOAD_CAPACITY covers the widest message of either kind
    let len = result.expect("payload should fit");
    let mut bytes = Vec::new();
    bytes
        .extend_from_slice(&buf[..len])
        .expect("payload should fit");

    Payload { bytes }
}

fn timestamp_text(timestamp_ms: u64) -> String<TIMESTAMP_DIGITS> {
    let mut text = String::new();
    // Cannot fail: u64::MAX has exactly TIMESTAMP_DIGITS digits
    write!(text, "{}", timestamp_ms).expect("timestamp should fit");
    text
}
