//! Error Types for the Sampling and Persistence Path
//!
//! ## Error Categories
//!
//! Not every bad input is an error. A rejected spike sample is an expected
//! outcome of [`ResistanceSampler::ingest`](crate::sampler::ResistanceSampler::ingest)
//! and is reported as an [`Ingest`](crate::sampler::Ingest) value, never through
//! these types. What remains falls into three groups:
//!
//! ### Conversion
//! - `NoReading`: the buffer average sits on a pole of the divider equation
//!   (0 or full scale), so no resistance can be derived
//! - `NonFinite`: the transform produced NaN or infinity
//! - `Unphysical`: the resistance maps to a temperature at or below
//!   absolute zero
//!
//! ### Persistence
//! - `Read`: the durable file exists but could not be read (permissions, I/O)
//! - `Corrupt`: the durable file is not a JSON array of data points
//! - `Encode`: the combined array could not be serialized
//! - `Write`: the rewrite of the durable file failed
//!
//! ### Transport
//! - `AdcError`: the SPI exchange failed or the device could not be opened
//!
//! `Corrupt` is kept apart from `Read` so that a malformed history file is
//! never mistaken for a transient failure and never silently overwritten.
//!
//! ```rust
//! use thermolog_core::errors::StorageError;
//!
//! fn report(err: &StorageError) -> &'static str {
//!     match err {
//!         StorageError::Corrupt { .. } => "operator must repair the data file",
//!         StorageError::Read { .. } => "cannot read data file this cycle",
//!         StorageError::Write { .. } | StorageError::Encode(_) => "will retry next cycle",
//!     }
//! }
//! ```

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for conversion operations
pub type ConversionResult<T> = Result<T, ConversionError>;

/// Result type for durable log operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Conversion failures between the raw average and a temperature
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConversionError {
    /// Divider equation undefined for this average
    #[error("no reading available for average {average}")]
    NoReading {
        /// Raw buffer average that was rejected
        average: f64,
    },

    /// Result is NaN or infinite
    #[error("conversion produced a non-finite value")]
    NonFinite,

    /// Resistance maps to a temperature at or below absolute zero
    #[error("resistance {resistance} Ω is outside the thermistor model")]
    Unphysical {
        /// Derived thermistor resistance
        resistance: f64,
    },
}

/// Durable log failures
#[derive(Error, Debug)]
pub enum StorageError {
    /// File exists but could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        /// Data file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// File content is not a JSON array of `[timestamp, temperature]` pairs
    #[error("data file {path} is corrupt: {source}")]
    Corrupt {
        /// Data file path
        path: PathBuf,
        /// Parser error
        #[source]
        source: serde_json::Error,
    },

    /// Combined array could not be encoded
    #[error("failed to encode data points: {0}")]
    Encode(#[source] serde_json::Error),

    /// Rewrite failed, the previous file content is still in place
    #[error("failed to write {path}: {source}")]
    Write {
        /// Data file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// ADC transport failures
#[derive(Error, Debug)]
pub enum AdcError {
    /// Device could not be opened or configured
    #[error("failed to open ADC device: {0}")]
    Open(String),

    /// A single exchange failed
    #[error("ADC transfer failed: {0}")]
    Transfer(String),

    /// Device replied with fewer bytes than requested
    #[error("short ADC reply: expected {expected} bytes, got {actual}")]
    ShortReply {
        /// Bytes requested
        expected: usize,
        /// Bytes received
        actual: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_error_names_the_file() {
        let source = serde_json::from_str::<Vec<u8>>("{").unwrap_err();
        let err = StorageError::Corrupt {
            path: PathBuf::from("/tmp/readings.data"),
            source,
        };
        assert!(err.to_string().contains("/tmp/readings.data"));
    }

    #[test]
    fn conversion_error_reports_average() {
        let err = ConversionError::NoReading { average: 1023.0 };
        assert_eq!(err.to_string(), "no reading available for average 1023");
    }
}
