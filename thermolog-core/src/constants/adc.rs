//! ADC Constants
//!
//! The thermistor divider is read through a 10-bit, 8-channel successive
//! approximation ADC on SPI (MCP3008 pinout).

/// Largest count a 10-bit conversion can report.
///
/// Also the divisor in the voltage divider equation, which uses
/// `1023 / average` rather than `1024`.
pub const ADC_FULL_SCALE: u16 = 1023;

/// Number of bytes exchanged per conversion (start, config, padding).
pub const ADC_TRANSFER_LEN: usize = 3;

/// Start bit sent in the first byte of every command.
pub const ADC_START_BIT: u8 = 0x01;

/// Single-ended mode flag, OR-ed with the channel number.
pub const ADC_SINGLE_ENDED: u8 = 8;

/// Highest channel index on an 8-channel part.
pub const ADC_MAX_CHANNEL: u8 = 7;

/// Mask for the two significant bits carried in the second reply byte.
pub const ADC_HIGH_BITS_MASK: u8 = 0b11;
