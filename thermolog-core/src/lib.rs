//! Core sampling and persistence engine for thermolog
//!
//! Turns raw thermistor ADC counts into durable temperature readings.
//!
//! Data flow:
//! - [`sampler::ResistanceSampler`] decodes ADC replies, drops spikes and
//!   keeps a ring buffer of recent counts
//! - [`thermistor::TemperatureConverter`] maps the buffer average to °C
//! - [`storage::DataPointLog`] queues [`datapoint::DataPoint`]s and merges
//!   them into a JSON array file, gated by [`transmission::TransmissionState`]
//!
//! ```no_run
//! use thermolog_core::{
//!     DataPoint, DataPointLog, ResistanceSampler, SamplerConfig,
//!     TemperatureConverter, ThermistorModel, TransmissionState,
//! };
//!
//! let mut sampler = ResistanceSampler::new(SamplerConfig::default());
//! sampler.ingest(&[0x00, 0x01, 0xf4]);
//!
//! let converter = TemperatureConverter::new(ThermistorModel::default());
//! let mut log = DataPointLog::new("readings.data");
//! if let Ok(conversion) = converter.convert(sampler.average()) {
//!     log.add(DataPoint::new(1_700_000_000, conversion.temperature));
//! }
//! log.flush_to_file(TransmissionState::Idle)?;
//! # Ok::<(), thermolog_core::StorageError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod adc;
pub mod buffer;
pub mod constants;
pub mod datapoint;
pub mod errors;
pub mod sampler;
pub mod storage;
pub mod thermistor;
pub mod time;
pub mod traits;
pub mod transmission;

// Public API
pub use datapoint::DataPoint;
pub use errors::{AdcError, ConversionError, StorageError};
pub use sampler::{Ingest, ResistanceSampler, SamplerConfig, SpikePolicy};
pub use storage::{DataPointLog, FlushOutcome};
pub use thermistor::{Conversion, TemperatureConverter, ThermistorModel};
pub use time::{SystemClock, TimeSource};
pub use traits::{AdcFrame, AdcTransport};
pub use transmission::TransmissionState;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
