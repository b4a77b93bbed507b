//! Timestamped temperature readings
//!
//! On disk and on the wire a data point is a two-element JSON array,
//! `[unix_seconds, celsius]`, so the whole log reads as
//!
//! ```json
//! [[1700000000,21.43],[1700000002,21.45]]
//! ```

use serde::{Deserialize, Serialize};

use crate::time::UnixSeconds;

/// One converted reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(UnixSeconds, f64)", into = "(UnixSeconds, f64)")]
pub struct DataPoint {
    /// Unix time in seconds
    pub timestamp: UnixSeconds,
    /// Temperature in °C, rounded to two decimals
    pub temperature: f64,
}

impl DataPoint {
    /// Create a data point
    pub fn new(timestamp: UnixSeconds, temperature: f64) -> Self {
        Self {
            timestamp,
            temperature,
        }
    }
}

impl From<(UnixSeconds, f64)> for DataPoint {
    fn from((timestamp, temperature): (UnixSeconds, f64)) -> Self {
        Self::new(timestamp, temperature)
    }
}

impl From<DataPoint> for (UnixSeconds, f64) {
    fn from(point: DataPoint) -> Self {
        (point.timestamp, point.temperature)
    }
}
