//! DHT22 (AM2302) frame decoding
//!
//! The sensor answers a start pulse with 40 bits, MSB first:
//!
//! | Byte | Content                                      |
//! |------|----------------------------------------------|
//! | 0..2 | relative humidity × 10, big-endian           |
//! | 2..4 | temperature × 10, bit 15 set when negative   |
//! | 4    | low byte of the sum of bytes 0..4            |
//!
//! Each bit is a ~50 µs low followed by a high pulse: ~26-28 µs for `0`,
//! ~70 µs for `1`. Bit-banging the line is board code; this module only
//! turns captured high-pulse widths into a checked measurement.

/// Bits in one sensor frame
pub const FRAME_BITS: usize = 40;

/// High pulses longer than this (µs) are a `1` bit
pub const ONE_THRESHOLD_US: u32 = 50;

/// Checked humidity/temperature pair
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    humidity_percent: f32,
    temperature_celsius: f32,
}

impl Measurement {
    pub fn humidity_percent(&self) -> f32 {
        self.humidity_percent
    }

    pub fn temperature_celsius(&self) -> f32 {
        self.temperature_celsius
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Line never answered the start pulse
    NoResponse,
    /// A bit pulse did not end in time
    Timeout,
    /// Parity byte does not match the data
    Checksum { expected: u8, actual: u8 },
}

impl core::fmt::Display for FrameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoResponse => write!(f, "Sensor did not respond"),
            Self::Timeout => write!(f, "Timed out waiting for bit"),
            Self::Checksum { expected, actual } => {
                write!(f, "Checksum mismatch: expected {:#04x}, got {:#04x}", expected, actual)
            }
        }
    }
}

impl core::error::Error for FrameError {}

/// Pack captured high-pulse widths into frame bytes
pub fn frame_from_pulses(pulses_us: &[u32; FRAME_BITS]) -> [u8; 5] {
    let mut frame = [0u8; 5];
    for (i, &width) in pulses_us.iter().enumerate() {
        if width > ONE_THRESHOLD_US {
            frame[i / 8] |= 0x80 >> (i % 8);
        }
    }
    frame
}

/// Verify the checksum and convert a frame to physical units
///
/// # Errors
///
/// `FrameError::Checksum` when byte 4 is not the wrapping sum of bytes 0..4.
pub fn decode(frame: [u8; 5]) -> Result<Measurement, FrameError> {
    let expected = frame[..4]
        .iter()
        .fold(0u8, |sum, &b| sum.wrapping_add(b));
    if expected != frame[4] {
        return Err(FrameError::Checksum {
            expected,
            actual: frame[4],
        });
    }

    let humidity = u16::from_be_bytes([frame[0], frame[1]]);
    let magnitude = u16::from_be_bytes([frame[2] & 0x7F, frame[3]]);
    let mut temperature = f32::from(magnitude) / 10.0;
    if frame[2] & 0x80 != 0 {
        temperature = -temperature;
    }

    Ok(Measurement {
        humidity_percent: f32::from(humidity) / 10.0,
        temperature_celsius: temperature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_checksum(data: [u8; 4]) -> [u8; 5] {
        let sum = data.iter().fold(0u8, |s, &b| s.wrapping_add(b));
        [data[0], data[1], data[2], data[3], sum]
    }

    #[test]
    fn test_datasheet_example() {
        // 65.2 %RH, 35.1 °C
        let m = decode([0x02, 0x8C, 0x01, 0x5F, 0xEE]).unwrap();
        assert_eq!(m.humidity_percent(), 65.2);
        assert_eq!(m.temperature_celsius(), 35.1);
    }

    #[test]
    fn test_negative_temperature() {
        // -10.1 °C
        let m = decode(with_checksum([0x01, 0xF4, 0x80, 0x65])).unwrap();
        assert_eq!(m.humidity_percent(), 50.0);
        assert_eq!(m.temperature_celsius(), -10.1);
    }

    #[test]
    fn test_checksum_wraps() {
        let frame = with_checksum([0xFF, 0xFF, 0x00, 0xFF]);
        assert_eq!(frame[4], 0xFD);
        assert!(decode(frame).is_ok());
    }

    #[test]
    fn test_checksum_mismatch() {
        assert_eq!(
            decode([0x02, 0x8C, 0x01, 0x5F, 0xEF]),
            Err(FrameError::Checksum {
                expected: 0xEE,
                actual: 0xEF
            })
        );
    }

    #[test]
    fn test_pulses_to_frame() {
        let mut pulses = [26u32; FRAME_BITS];
        // 0x02 in byte 0, 0x80 in byte 2, 0x01 in byte 4
        pulses[6] = 70;
        pulses[16] = 70;
        pulses[39] = 70;
        // Exactly at threshold is still a zero
        pulses[8] = ONE_THRESHOLD_US;

        assert_eq!(frame_from_pulses(&pulses), [0x02, 0x00, 0x80, 0x00, 0x01]);
    }
}
