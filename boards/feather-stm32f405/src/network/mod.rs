#![deny(warnings)]
//! Network module
//!
//! - **`config`**: Configuration structs with `Default` implementations
//! - **`error`**: Simple error enum for network operations
//! - **`manager`**: Link and address bring-up
//! - **`socket`**: Async TCP socket wrapper for embedded-io-async
//! - **`transport`**: `LinkProbe` and `Transport` for the telemetry core
//!
//! The W5500 driver (`embassy-net-wiznet`) provides the device and runner,
//! `embassy-net` does all TCP/IP processing, and the telemetry core only sees
//! the `hal_abstractions` traits implemented in `transport`.

pub mod config;
pub mod error;
pub mod manager;
pub mod socket;
pub mod transport;

pub use config::{Addressing, NetworkConfig};
pub use transport::{EthLink, TcpTransport, SOCKET_BUFFER_SIZE};
