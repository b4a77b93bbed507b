//! Thermistor model and temperature conversion
//!
//! Converts the averaged ADC count into a temperature in two steps:
//!
//! 1. **Voltage divider**: the thermistor sits on the low side of a divider
//!    with a known series resistor, so
//!    `R = series_resistor / ((1023 / average) - 1)`.
//! 2. **Steinhart-Hart (B-parameter form)**:
//!    `1/T = 1/T0 + ln(R/R0) / B`, with temperatures in Kelvin.
//!
//! The calibration offset (°C) is added to the Steinhart-Hart output and the
//! result is rounded to two decimals for storage.
//!
//! The divider equation has poles at an average of 0 (open thermistor) and
//! at full scale (shorted thermistor). Both are reported as
//! [`ConversionError::NoReading`] rather than leaking infinities into the
//! data file.

use serde::{Deserialize, Serialize};

use crate::constants::adc::ADC_FULL_SCALE;
use crate::constants::physics::{ABSOLUTE_ZERO_CELSIUS, KELVIN_OFFSET, TEMPERATURE_DECIMALS};
use crate::errors::{ConversionError, ConversionResult};
use crate::traits::Validatable;

/// Immutable thermistor and divider constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermistorModel {
    /// Resistance at the nominal temperature (Ω)
    pub nominal_resistance: f64,
    /// Temperature at which `nominal_resistance` is specified (°C)
    pub nominal_temp: f64,
    /// B-coefficient (K)
    pub bcoefficient: f64,
    /// Fixed resistor in the divider (Ω)
    pub series_resistor: f64,
    /// Added to every converted temperature (°C)
    pub calibration_offset: f64,
}

impl Default for ThermistorModel {
    fn default() -> Self {
        // 10k NTC, B = 3950, measured 9.86k series resistor
        Self {
            nominal_resistance: 10_000.0,
            nominal_temp: 25.0,
            bcoefficient: 3950.0,
            series_resistor: 9_860.0,
            calibration_offset: 0.5,
        }
    }
}

/// Intermediate values of one conversion, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    /// Raw average fed in (ADC counts)
    pub average: f64,
    /// Derived thermistor resistance (Ω)
    pub resistance: f64,
    /// Temperature rounded for storage (°C)
    pub temperature: f64,
}

/// Pure conversion from buffer average to temperature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureConverter {
    model: ThermistorModel,
}

impl TemperatureConverter {
    /// Create a converter for `model`
    pub fn new(model: ThermistorModel) -> Self {
        Self { model }
    }

    /// Model constants
    pub fn model(&self) -> &ThermistorModel {
        &self.model
    }

    /// Thermistor resistance for a raw average
    pub fn resistance_from_average(&self, average: f64) -> ConversionResult<f64> {
        let full_scale = f64::from(ADC_FULL_SCALE);
        if !(average > 0.0 && average < full_scale) {
            return Err(ConversionError::NoReading { average });
        }

        let resistance = self.model.series_resistor / (full_scale / average - 1.0);
        if !resistance.is_valid() {
            return Err(ConversionError::NonFinite);
        }
        Ok(resistance)
    }

    /// Temperature (°C, unrounded, including calibration offset) for a resistance
    pub fn temperature_from_resistance(&self, resistance: f64) -> ConversionResult<f64> {
        if !(resistance > 0.0) {
            return Err(ConversionError::NonFinite);
        }

        let x = (resistance / self.model.nominal_resistance).ln();
        let inverse_kelvin =
            x / self.model.bcoefficient + 1.0 / (self.model.nominal_temp + KELVIN_OFFSET);
        if !inverse_kelvin.is_valid() {
            return Err(ConversionError::NonFinite);
        }
        if inverse_kelvin <= 0.0 {
            return Err(ConversionError::Unphysical { resistance });
        }
        let celsius = 1.0 / inverse_kelvin - KELVIN_OFFSET;

        let calibrated = celsius + self.model.calibration_offset;
        if !calibrated.is_valid() {
            return Err(ConversionError::NonFinite);
        }
        if calibrated <= ABSOLUTE_ZERO_CELSIUS {
            return Err(ConversionError::Unphysical { resistance });
        }
        Ok(calibrated)
    }

    /// Full conversion of a raw average, temperature rounded for storage
    pub fn convert(&self, average: f64) -> ConversionResult<Conversion> {
        let resistance = self.resistance_from_average(average)?;
        let temperature = round_to_storage(self.temperature_from_resistance(resistance)?);

        log::debug!("average raw: {:.2}", average);
        log::debug!("thermistor resistance: {:.1}", resistance);
        log::debug!("thermistor temperature: {}", temperature);

        Ok(Conversion {
            average,
            resistance,
            temperature,
        })
    }
}

/// Round to the number of decimals kept in the data file
pub fn round_to_storage(celsius: f64) -> f64 {
    let scale = 10f64.powi(TEMPERATURE_DECIMALS);
    (celsius * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uncalibrated() -> TemperatureConverter {
        TemperatureConverter::new(ThermistorModel {
            calibration_offset: 0.0,
            ..ThermistorModel::default()
        })
    }

    #[test]
    fn nominal_resistance_gives_nominal_temperature() {
        let converter = uncalibrated();
        let t = converter.temperature_from_resistance(10_000.0).unwrap();
        assert!((t - 25.0).abs() < 1e-9, "got {}", t);
    }

    #[test]
    fn calibration_offset_is_added() {
        let converter = TemperatureConverter::new(ThermistorModel::default());
        let t = converter.temperature_from_resistance(10_000.0).unwrap();
        assert!((t - 25.5).abs() < 1e-9);
    }

    #[test]
    fn temperature_decreases_with_resistance() {
        let converter = uncalibrated();
        let mut previous = f64::INFINITY;
        for r in [500.0, 2_000.0, 5_000.0, 10_000.0, 20_000.0, 80_000.0] {
            let t = converter.temperature_from_resistance(r).unwrap();
            assert!(t < previous, "{} Ω gave {} °C", r, t);
            previous = t;
        }
    }

    #[test]
    fn divider_midpoint_equals_series_resistor() {
        let converter = uncalibrated();
        let r = converter.resistance_from_average(511.5).unwrap();
        assert!((r - 9_860.0).abs() < 1e-6);
    }

    #[test]
    fn divider_poles_are_no_reading() {
        let converter = uncalibrated();
        for average in [0.0, 1023.0, 1100.0, -3.0, f64::NAN] {
            assert!(matches!(
                converter.resistance_from_average(average),
                Err(ConversionError::NoReading { .. })
            ));
        }
    }

    #[test]
    fn non_positive_resistance_is_rejected() {
        let converter = uncalibrated();
        assert_eq!(
            converter.temperature_from_resistance(0.0),
            Err(ConversionError::NonFinite)
        );
    }

    #[test]
    fn tiny_resistance_is_unphysical() {
        let converter = TemperatureConverter::new(ThermistorModel::default());
        for resistance in [0.005, 0.0096] {
            assert_eq!(
                converter.temperature_from_resistance(resistance),
                Err(ConversionError::Unphysical { resistance })
            );
        }
    }

    #[test]
    fn near_zero_average_never_reaches_storage() {
        let converter = TemperatureConverter::new(ThermistorModel::default());
        // One count of 1 among 999 zeros
        let err = converter.convert(0.001).unwrap_err();
        assert!(matches!(err, ConversionError::Unphysical { .. }));
    }

    #[test]
    fn negative_offset_cannot_push_below_absolute_zero() {
        let converter = TemperatureConverter::new(ThermistorModel {
            calibration_offset: -10_000.0,
            ..ThermistorModel::default()
        });
        assert!(matches!(
            converter.temperature_from_resistance(10_000.0),
            Err(ConversionError::Unphysical { .. })
        ));
    }

    #[test]
    fn convert_rounds_to_two_decimals() {
        let converter = uncalibrated();
        let conversion = converter.convert(501.67).unwrap();
        let scaled = conversion.temperature * 100.0;
        assert!((scaled - scaled.round()).abs() < 1e-6);
        // Slightly below the divider midpoint means slightly warmer than 25 °C
        // once the 9.86k series resistor is taken into account
        assert!(conversion.temperature > 25.0 && conversion.temperature < 27.0);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to_storage(21.456), 21.46);
        assert_eq!(round_to_storage(-3.004), -3.0);
    }
}
