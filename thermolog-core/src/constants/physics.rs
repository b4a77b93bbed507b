//! Physical Constants for thermistor conversion

/// Offset between the Celsius and Kelvin scales.
///
/// The Steinhart-Hart B-parameter form works in Kelvin, every nominal
/// temperature is shifted by this amount on the way in and out.
///
/// Source: NIST Special Publication 330 (2019)
pub const KELVIN_OFFSET: f64 = 273.15;

/// Absolute zero in Celsius (°C).
///
/// A converted temperature at or below this value means the resistance
/// input was garbage.
pub const ABSOLUTE_ZERO_CELSIUS: f64 = -KELVIN_OFFSET;

/// Decimal places kept when a temperature is stored.
pub const TEMPERATURE_DECIMALS: i32 = 2;
