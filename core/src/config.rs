//! Telemetry configuration
//!
//! All parameters are fixed at build/boot time. Nothing is read from the
//! environment or persisted.

use crate::endpoint::{Endpoint, EndpointError};

/// Upper bound on digital channels sampled per cycle
pub const MAX_DIGITAL_CHANNELS: usize = 8;

/// One digital input line and the sensor id it reports under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DigitalChannel<P> {
    pub pin: P,
    pub sensor_id: u8,
}

impl<P> DigitalChannel<P> {
    pub const fn new(pin: P, sensor_id: u8) -> Self {
        Self { pin, sensor_id }
    }
}

/// Scheduler and delivery parameters
#[derive(Debug, Clone, Copy)]
pub struct TelemetryConfig<'a, P> {
    /// Collector URL (`http://host[:port][/path]`)
    pub endpoint: &'a str,
    /// Fixed interval between cycles (milliseconds)
    pub interval_ms: u64,
    /// Bound on one delivery round trip (milliseconds)
    pub response_timeout_ms: u32,
    /// Sample and deliver the environmental reading each cycle
    pub include_environment: bool,
    /// Digital lines sampled and delivered each cycle, in order
    pub digital_channels: &'a [DigitalChannel<P>],
}

impl<P: 'static> Default for TelemetryConfig<'static, P> {
    fn default() -> Self {
        Self {
            endpoint: "http://192.168.1.100:5000/send_data",
            interval_ms: 60_000, // 1 minute
            response_timeout_ms: 5_000,
            include_environment: true,
            digital_channels: &[],
        }
    }
}

impl<'a, P> TelemetryConfig<'a, P> {
    /// Check the configuration and parse the endpoint
    ///
    /// # Errors
    ///
    /// - `ConfigError::ZeroInterval` for a zero sampling interval
    /// - `ConfigError::TooManyDigitalChannels` above [`MAX_DIGITAL_CHANNELS`]
    /// - `ConfigError::Endpoint` when the URL does not parse
    pub fn validate(&self) -> Result<Endpoint<'a>, ConfigError> {
        if self.interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.digital_channels.len() > MAX_DIGITAL_CHANNELS {
            return Err(ConfigError::TooManyDigitalChannels);
        }
        Endpoint::parse(self.endpoint).map_err(ConfigError::Endpoint)
    }
}

/// Configuration errors, detected once at boot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Sampling interval is zero
    ZeroInterval,
    /// More digital channels than a cycle report can hold
    TooManyDigitalChannels,
    /// Collector URL is invalid
    Endpoint(EndpointError),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ZeroInterval => write!(f, "Sampling interval must be non-zero"),
            Self::TooManyDigitalChannels => write!(f, "Too many digital channels"),
            Self::Endpoint(e) => write!(f, "Invalid endpoint: {}", e),
        }
    }
}

impl core::error::Error for ConfigError {}
