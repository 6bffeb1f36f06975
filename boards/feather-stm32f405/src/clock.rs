#![deny(unsafe_code)]
#![deny(warnings)]
//! Uptime clock

use hal_abstractions::Clock;

/// Milliseconds since boot from the embassy-time driver
#[derive(Debug, Clone, Copy, Default)]
pub struct UptimeClock;

impl Clock for UptimeClock {
    fn now_ms(&self) -> u64 {
        embassy_time::Instant::now().as_millis()
    }
}
