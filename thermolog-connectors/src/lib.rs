//! I/O Adapters for the Thermolog Pipeline
//!
//! ## Overview
//!
//! `thermolog-core` is pure logic plus a JSON file. Everything that talks to
//! the outside world lives here:
//!
//! - [`DeliveryClient`]: forwards pending points to a remote collector and
//!   owns the [`TransmissionState`] that gates local persistence
//! - `http`: the HTTP [`Collector`] (feature `http`, on by default)
//! - `responder`: read-only HTTP server exposing the data file (feature
//!   `responder`, on by default)
//! - `spi`: ADC transport over `/dev/spidev*` (feature `spi`)
//!
//! ## Delivery semantics
//!
//! ```text
//! delivery tick:
//!   send(pending) ──await──▶ Succeeded | Failed
//!                                 │
//!   flush_to_file(state) ◀────────┘
//! ```
//!
//! The send is awaited before the flush runs, so the flush always sees the
//! outcome of the attempt made in the same tick. The client never touches
//! the pending list: a failed attempt leaves the points queued for the next
//! tick, a successful one still needs the flush to make them durable.
//! There is no backoff beyond the fixed tick interval.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use thermolog_connectors::{DeliveryClient, http::{HttpCollector, HttpConfig}};
//! use thermolog_core::{DataPoint, DataPointLog};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let collector = HttpCollector::new(HttpConfig::new("http://192.168.1.141/dev/test.php"))?;
//! let mut client = DeliveryClient::new(collector);
//! let mut log = DataPointLog::new("readings.data");
//!
//! log.add(DataPoint::new(1_700_000_000, 21.5));
//! let state = client.send(log.pending()).await;
//! if log.flush_to_file(state).is_ok() {
//!     client.settle();
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "responder")]
pub mod responder;

#[cfg(feature = "spi")]
pub mod spi;

use async_trait::async_trait;
use thermolog_core::{DataPoint, TransmissionState};
use thiserror::Error;

/// Delivery errors
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Network failure, timeout or connection refused
    #[error("transport error: {0}")]
    Transport(String),

    /// Collector answered with something other than 200
    #[error("collector answered {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },

    /// Payload could not be encoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid endpoint or client settings
    #[error("configuration error: {0}")]
    Config(String),

    /// Blocking request task was cancelled or panicked
    #[error("delivery task interrupted: {0}")]
    Interrupted(String),
}

/// Remote end that accepts a batch of data points
#[async_trait]
pub trait Collector: Send + Sync {
    /// Deliver the whole batch as one request
    async fn deliver(&self, points: &[DataPoint]) -> Result<usize, DeliveryError>;
}

/// Delivery statistics
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConnectionStats {
    /// Batches accepted by the collector
    pub batches_sent: u64,
    /// Batches that failed
    pub batches_failed: u64,
    /// Data points in accepted batches (a point retried twice counts twice)
    pub points_sent: u64,
    /// Payload bytes in accepted batches
    pub bytes_sent: u64,
    /// Last error message
    pub last_error: Option<String>,
}

/// Forwards pending points and tracks the delivery state
pub struct DeliveryClient<C> {
    collector: C,
    state: TransmissionState,
    stats: ConnectionStats,
}

impl<C: Collector> DeliveryClient<C> {
    /// Wrap a collector, starting `Idle`
    pub fn new(collector: C) -> Self {
        Self {
            collector,
            state: TransmissionState::Idle,
            stats: ConnectionStats::default(),
        }
    }

    /// Send `points` as one batch and wait for the outcome
    ///
    /// An empty batch is a no-op and leaves the state unchanged.
    pub async fn send(&mut self, points: &[DataPoint]) -> TransmissionState {
        if points.is_empty() {
            return self.state;
        }

        self.state = self.state.begin();
        let result = self.collector.deliver(points).await;

        match result {
            Ok(bytes) => {
                self.stats.batches_sent += 1;
                self.stats.points_sent += points.len() as u64;
                self.stats.bytes_sent += bytes as u64;
                self.state = self.state.finish(true);
                log::debug!("delivered {} points ({} bytes)", points.len(), bytes);
            }
            Err(e) => {
                self.stats.batches_failed += 1;
                self.stats.last_error = Some(e.to_string());
                self.state = self.state.finish(false);
                log::warn!("delivery of {} points failed: {}", points.len(), e);
            }
        }

        self.state
    }

    /// Mark a successful delivery as persisted
    pub fn settle(&mut self) {
        self.state = self.state.settle();
    }

    /// Current delivery state
    pub fn state(&self) -> TransmissionState {
        self.state
    }

    /// Delivery statistics
    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    /// Underlying collector
    pub fn collector(&self) -> &C {
        &self.collector
    }
}
