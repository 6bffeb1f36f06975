//! Reading source
//!
//! Turns raw sensor and input-line reads into timestamped `Reading`s. No
//! retries happen here: a failed environmental sample yields no reading for
//! that cycle and the caller moves on.

use hal_abstractions::{Clock, DigitalInputs, EnvironmentSensor};

use crate::reading::{Reading, SampleError};

/// Produces readings from the environmental sensor and digital inputs
pub struct ReadingSource<S, I, C> {
    sensor: S,
    inputs: I,
    clock: C,
}

impl<S, I, C> ReadingSource<S, I, C>
where
    S: EnvironmentSensor,
    I: DigitalInputs,
    C: Clock,
{
    pub fn new(sensor: S, inputs: I, clock: C) -> Self {
        Self {
            sensor,
            inputs,
            clock,
        }
    }

    /// Poll the temperature/humidity sensor
    ///
    /// # Errors
    ///
    /// `SampleError::InvalidReading` when either value comes back NaN.
    pub async fn sample_environment(&mut self) -> Result<Reading, SampleError> {
        let humidity = self.sensor.read_humidity().await;
        let temperature = self.sensor.read_temperature().await;
        let timestamp_ms = self.clock.now_ms();

        Reading::environment(temperature, humidity, timestamp_ms).map_err(|e| {
            warn!("Failed to read from DHT sensor!");
            e
        })
    }

    /// Read the logic level of `pin` verbatim
    pub fn sample_digital(&mut self, pin: I::Pin, sensor_id: u8) -> Reading {
        let state = self.inputs.read_level(pin);
        Reading::digital(sensor_id, state, self.clock.now_ms())
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }
}
