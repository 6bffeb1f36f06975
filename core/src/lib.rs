//! Platform-agnostic core logic for the telemetry agent
//!
//! This crate decides when to sample, how to serialize a reading, how to
//! attempt delivery to the collector and how to classify the outcome. It has
//! NO hardware dependencies: every device handle arrives through the traits
//! in `hal-abstractions`.
//!
//! ## Pipeline
//!
//! ```text
//! Scheduler ─▶ ReadingSource ─▶ encode ─▶ DeliveryClient ─▶ DeliveryOutcome (logged)
//! ```
//!
//! Each cycle is one-shot: nothing feeds back, nothing is queued, and the
//! only state carried between cycles is the scheduler's last fire time.
//!
//! ## Accepted limitation
//!
//! A cycle runs to completion before the next due-time check. The delivery
//! attempt is bounded by the configured response timeout, but a transport
//! that hangs inside that bound stalls the cadence for its duration.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![deny(warnings)]

#[macro_use]
mod fmt;

pub mod config;
pub mod delivery;
pub mod dht22;
pub mod encoder;
pub mod endpoint;
pub mod http;
pub mod reading;
pub mod scheduler;
pub mod source;

pub use config::{ConfigError, DigitalChannel, TelemetryConfig};
pub use delivery::{DeliveryClient, DeliveryOutcome, ResponseBody, TransportErrorCode};
pub use encoder::{encode, Payload};
pub use endpoint::{Endpoint, EndpointError};
pub use reading::{Reading, ReadingKind, SampleError, ENVIRONMENT_SENSOR_ID};
pub use scheduler::{CycleReport, Scheduler, SchedulerState};
pub use source::ReadingSource;

#[cfg(test)]
pub(crate) mod testing;
