//! Hardware abstraction traits for the telemetry agent
//!
//! This crate defines the boundary between the platform-agnostic telemetry
//! core and a concrete board. BSPs implement these traits; the core only
//! ever sees the traits.
//!
//! - **`time`**: monotonic milliseconds since boot
//! - **`network`**: link-up predicate and a connection-oriented transport
//! - **`sensor`**: temperature/humidity primitives with NaN on fault
//! - **`gpio`**: logic level of board-defined input lines

#![no_std]
#![deny(unsafe_code)]
#![deny(warnings)]

pub mod gpio;
pub mod network;
pub mod sensor;
pub mod time;

pub use gpio::{DigitalInputs, LogicLevel};
pub use network::{LinkProbe, Transport};
pub use sensor::EnvironmentSensor;
pub use time::Clock;
