//! Constants for thermolog core
//!
//! Numeric values used by the sampling and conversion stages live here
//! instead of being scattered as magic numbers.
//!
//! ## Organization
//!
//! - **ADC**: converter resolution and SPI framing
//! - **Physics**: thermodynamic constants used by the thermistor model
//! - **Time**: unit conversions and scheduler limits

/// ADC resolution and command framing for the MCP300x family.
pub mod adc;

/// Physical constants used by the Steinhart-Hart conversion.
pub mod physics;

/// Time unit conversions and tick limits.
pub mod time;

pub use adc::{ADC_FULL_SCALE, ADC_MAX_CHANNEL, ADC_TRANSFER_LEN};
pub use physics::KELVIN_OFFSET;
pub use time::{MIN_TICK_MS, MS_PER_SECOND};
