#![deny(unsafe_code)]
#![deny(warnings)]
//! Bit-banged DHT22 driver
//!
//! The single-wire protocol has ~30 µs margins, too tight for async waits,
//! so the 40-bit capture runs inside a critical section and is timed with
//! the DWT cycle counter. Frame decoding lives in `telemetry_core::dht22`.

use cortex_m::peripheral::DWT;
use defmt::warn;
use embassy_stm32::gpio::{Flex, Speed};
use embassy_time::{Duration, Instant, Timer};
use hal_abstractions::EnvironmentSensor;
use telemetry_core::dht22::{self, FrameError, Measurement, FRAME_BITS};

/// DHT22 driver configuration
#[derive(Debug, Clone)]
pub struct Dht22Config {
    /// Minimum spacing between bus transactions; reads inside this window
    /// return the cached result
    pub min_interval_ms: u64,
    /// Core clock used to convert cycle counts to microseconds
    pub sysclk_hz: u32,
}

impl Default for Dht22Config {
    fn default() -> Self {
        Self {
            min_interval_ms: 2000,
            sysclk_hz: 84_000_000,
        }
    }
}

/// DHT22 on an open-drain GPIO line with an external pull-up
///
/// Requires the DWT cycle counter to be enabled during init.
pub struct Dht22<'d> {
    pin: Flex<'d>,
    config: Dht22Config,
    last: Option<(Instant, Result<Measurement, FrameError>)>,
}

impl<'d> Dht22<'d> {
    pub fn new(mut pin: Flex<'d>, config: Dht22Config) -> Self {
        // Idle state is a released (high) line
        pin.set_high();
        pin.set_as_input_output(Speed::Low);
        Self {
            pin,
            config,
            last: None,
        }
    }

    /// Run one bus transaction, or reuse the last one if it is recent
    pub async fn measure(&mut self) -> Result<Measurement, FrameError> {
        if let Some((at, result)) = self.last {
            if at.elapsed() < Duration::from_millis(self.config.min_interval_ms) {
                return result;
            }
        }

        let result = self.transaction().await;
        if let Err(e) = result {
            warn!("DHT22 transaction failed: {}", e);
        }
        self.last = Some((Instant::now(), result));
        result
    }

    async fn transaction(&mut self) -> Result<Measurement, FrameError> {
        // Start signal: hold the line low for at least 1 ms
        self.pin.set_low();
        Timer::after_micros(1100).await;

        let cycles_per_us = self.config.sysclk_hz / 1_000_000;
        let pin = &mut self.pin;
        let pulses = critical_section::with(|_| capture(pin, cycles_per_us))?;

        dht22::decode(dht22::frame_from_pulses(&pulses))
    }
}

impl EnvironmentSensor for Dht22<'_> {
    async fn read_humidity(&mut self) -> f32 {
        self.measure()
            .await
            .map_or(f32::NAN, |m| m.humidity_percent())
    }

    async fn read_temperature(&mut self) -> f32 {
        self.measure()
            .await
            .map_or(f32::NAN, |m| m.temperature_celsius())
    }
}

/// Release the line and record the high-pulse width of each bit in µs
fn capture(pin: &mut Flex<'_>, cycles_per_us: u32) -> Result<[u32; FRAME_BITS], FrameError> {
    let response_timeout = 100 * cycles_per_us;
    pin.set_high();

    // Response: sensor pulls low ~80 µs, then high ~80 µs
    wait_while(pin, true, response_timeout).map_err(|_| FrameError::NoResponse)?;
    wait_while(pin, false, response_timeout).map_err(|_| FrameError::NoResponse)?;
    wait_while(pin, true, response_timeout).map_err(|_| FrameError::NoResponse)?;

    let mut pulses = [0u32; FRAME_BITS];
    for width in pulses.iter_mut() {
        wait_while(pin, false, 80 * cycles_per_us)?;
        *width = wait_while(pin, true, 100 * cycles_per_us)? / cycles_per_us;
    }
    Ok(pulses)
}

/// Spin while the line reads `high`; returns the elapsed cycles
fn wait_while(pin: &Flex<'_>, high: bool, timeout_cycles: u32) -> Result<u32, FrameError> {
    let start = DWT::cycle_count();
    loop {
        let elapsed = DWT::cycle_count().wrapping_sub(start);
        if pin.is_high() != high {
            return Ok(elapsed);
        }
        if elapsed > timeout_cycles {
            return Err(FrameError::Timeout);
        }
    }
}
