//! Reading domain entity
//!
//! A `Reading` is one immutable observation. It is produced, encoded and
//! discarded within a single cycle; nothing here knows how it is sent.

use hal_abstractions::LogicLevel;

/// Fixed symbolic identifier of the temperature/humidity sensor
pub const ENVIRONMENT_SENSOR_ID: &str = "0x01";

/// Which of the two reading shapes a `Reading` carries
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadingKind {
    TemperatureHumidity,
    DigitalState,
}

/// One sampled observation
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reading {
    /// Periodic environmental poll
    TemperatureHumidity {
        temperature_celsius: f32,
        humidity_percent: f32,
        timestamp_ms: u64,
    },
    /// On-demand digital input query
    DigitalState {
        sensor_id: u8,
        state: LogicLevel,
        timestamp_ms: u64,
    },
}

impl Reading {
    /// Build an environmental reading, rejecting NaN in either value
    pub fn environment(
        temperature_celsius: f32,
        humidity_percent: f32,
        timestamp_ms: u64,
    ) -> Result<Self, SampleError> {
        if temperature_celsius.is_nan() || humidity_percent.is_nan() {
            return Err(SampleError::InvalidReading);
        }
        Ok(Self::TemperatureHumidity {
            temperature_celsius,
            humidity_percent,
            timestamp_ms,
        })
    }

    /// Build a digital-state reading
    pub const fn digital(sensor_id: u8, state: LogicLevel, timestamp_ms: u64) -> Self {
        Self::DigitalState {
            sensor_id,
            state,
            timestamp_ms,
        }
    }

    pub const fn kind(&self) -> ReadingKind {
        match self {
            Self::TemperatureHumidity { .. } => ReadingKind::TemperatureHumidity,
            Self::DigitalState { .. } => ReadingKind::DigitalState,
        }
    }

    /// Milliseconds since boot at sample time
    pub const fn timestamp_ms(&self) -> u64 {
        match self {
            Self::TemperatureHumidity { timestamp_ms, .. }
            | Self::DigitalState { timestamp_ms, .. } => *timestamp_ms,
        }
    }
}

/// Error produced by the reading source
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleError {
    /// Sensor returned NaN for temperature or humidity
    InvalidReading,
}

impl core::fmt::Display for SampleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidReading => write!(f, "Sensor returned an invalid reading"),
        }
    }
}

impl core::error::Error for SampleError {}
