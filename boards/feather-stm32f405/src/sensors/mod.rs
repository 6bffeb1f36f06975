//! Board sensor adapters
//!
//! - **`dht22`**: temperature/humidity over a bit-banged single-wire bus
//! - **`relays`**: relay-state input lines

pub mod dht22;
pub mod relays;

pub use dht22::{Dht22, Dht22Config};
pub use relays::{RelayInputs, RelayLine, RELAY_CHANNELS};
