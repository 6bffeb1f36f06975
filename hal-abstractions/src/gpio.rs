//! Digital input lines

/// Instantaneous logic level of an input line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LogicLevel {
    Low,
    High,
}

impl LogicLevel {
    /// Level as the `0`/`1` integer carried on the wire
    pub const fn as_bit(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::High => 1,
        }
    }
}

impl From<bool> for LogicLevel {
    fn from(high: bool) -> Self {
        if high {
            Self::High
        } else {
            Self::Low
        }
    }
}

/// A bank of input lines addressed by a board-defined pin identifier
///
/// Pin direction and pull configuration happen once during board setup,
/// so a read always yields a defined level and cannot fail.
pub trait DigitalInputs {
    /// Board-specific handle naming one input line
    type Pin: Copy;

    /// Read the current logic level of `pin`
    fn read_level(&mut self, pin: Self::Pin) -> LogicLevel;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_bits() {
        assert_eq!(LogicLevel::Low.as_bit(), 0);
        assert_eq!(LogicLevel::High.as_bit(), 1);
        assert_eq!(LogicLevel::from(true), LogicLevel::High);
        assert_eq!(LogicLevel::from(false), LogicLevel::Low);
    }
}
