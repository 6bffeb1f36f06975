#![deny(unsafe_code)]
#![deny(warnings)]
//! Relay state inputs

use embedded_hal::digital::InputPin;
use hal_abstractions::{DigitalInputs, LogicLevel};
use telemetry_core::DigitalChannel;

/// Number of relay-state lines on the board
pub const RELAY_COUNT: usize = 5;

/// One relay-state input line
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum RelayLine {
    One,
    Two,
    Three,
    Four,
    Five,
}

impl RelayLine {
    const fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
            Self::Three => 2,
            Self::Four => 3,
            Self::Five => 4,
        }
    }
}

/// Relay lines and the sensor ids the collector knows them by
pub const RELAY_CHANNELS: [DigitalChannel<RelayLine>; RELAY_COUNT] = [
    DigitalChannel::new(RelayLine::One, 1),
    DigitalChannel::new(RelayLine::Two, 2),
    DigitalChannel::new(RelayLine::Three, 3),
    DigitalChannel::new(RelayLine::Four, 4),
    DigitalChannel::new(RelayLine::Five, 5),
];

/// Bank of relay-state inputs
///
/// Lines one and two idle high (pull-up), three to five idle low
/// (pull-down); pulls are applied when the pins are created.
pub struct RelayInputs<P> {
    lines: [P; RELAY_COUNT],
}

impl<P: InputPin> RelayInputs<P> {
    pub fn new(lines: [P; RELAY_COUNT]) -> Self {
        Self { lines }
    }
}

impl<P: InputPin> DigitalInputs for RelayInputs<P> {
    type Pin = RelayLine;

    fn read_level(&mut self, pin: RelayLine) -> LogicLevel {
        // GPIO reads are infallible on this MCU
        let high = self.lines[pin.index()].is_high().unwrap_or(false);
        LogicLevel::from(high)
    }
}
