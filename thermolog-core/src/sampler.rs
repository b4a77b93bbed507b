//! Resistance sampler with spike rejection
//!
//! Every sampling tick hands the raw ADC reply to
//! [`ResistanceSampler::ingest`]. The count is decoded, checked against the
//! most recently stored count and either written into the ring buffer or
//! dropped. Drops are silent: the next tick simply samples again.
//!
//! ## Spike policies
//!
//! A zero count is never stored, whatever the policy. Two rules for
//! non-zero counts have been deployed over time and they disagree, so both
//! are available through [`SpikePolicy`]:
//!
//! | Policy | Rejects when |
//! |--------|--------------|
//! | `ZeroOrDeviation` (default) | `v == 0` **or** `|v - last| / last > threshold` |
//! | `ZeroAndDeviation` | `v == 0` only; deviating non-zero counts are kept |
//!
//! The deviation term needs a previous sample. With an empty buffer the
//! deviation check is skipped and only the zero check applies.

use serde::{Deserialize, Serialize};

use crate::adc::decode_reply;
use crate::buffer::ResistanceBuffer;
use crate::traits::AdcFrame;

/// Rule used to decide whether a decoded count is a spike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpikePolicy {
    /// Reject zeros and any count deviating beyond the threshold
    #[default]
    ZeroOrDeviation,
    /// Reject zeros, keep every non-zero count
    ZeroAndDeviation,
}

/// Why a count was dropped
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    /// Count was zero (open circuit or failed conversion)
    Zero,
    /// Relative deviation from the last stored count exceeded the threshold
    Deviation {
        /// Observed relative deviation
        deviation: f64,
    },
}

/// Outcome of one sampling tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ingest {
    /// Count was stored at the slot the cursor pointed to
    Accepted {
        /// Decoded count
        count: u16,
        /// Slot written
        slot: usize,
    },
    /// Count was discarded
    Rejected {
        /// Decoded count
        count: u16,
        /// Reason
        reason: Rejection,
    },
}

impl Ingest {
    /// True when the sample made it into the buffer
    pub fn is_accepted(&self) -> bool {
        matches!(self, Ingest::Accepted { .. })
    }
}

/// Static sampler settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Ring buffer capacity
    pub resistances_to_keep: usize,
    /// Maximum relative deviation from the last stored count (0.02 = 2%)
    pub ignore_data_beyond_pct: f64,
    /// Rejection rule
    pub spike_policy: SpikePolicy,
    /// Added to the buffer mean by [`ResistanceSampler::average`] (ADC counts)
    pub average_offset: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            resistances_to_keep: 1000,
            ignore_data_beyond_pct: 0.02,
            spike_policy: SpikePolicy::ZeroOrDeviation,
            average_offset: 0.0,
        }
    }
}

/// Counters kept by the sampler
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SamplerStats {
    /// Samples written into the buffer
    pub accepted: u64,
    /// Zero counts dropped
    pub rejected_zero: u64,
    /// Deviating counts dropped
    pub rejected_spike: u64,
}

/// Decodes, filters and stores ADC counts
#[derive(Debug, Clone)]
pub struct ResistanceSampler {
    config: SamplerConfig,
    buffer: ResistanceBuffer,
    stats: SamplerStats,
}

impl ResistanceSampler {
    /// Create a sampler with an empty buffer sized from `config`
    pub fn new(config: SamplerConfig) -> Self {
        Self {
            buffer: ResistanceBuffer::new(config.resistances_to_keep),
            config,
            stats: SamplerStats::default(),
        }
    }

    /// Decode one ADC reply and store it unless it is a spike
    pub fn ingest(&mut self, reply: &AdcFrame) -> Ingest {
        self.ingest_count(decode_reply(reply))
    }

    /// Filter and store an already decoded count
    pub fn ingest_count(&mut self, count: u16) -> Ingest {
        if let Some(reason) = self.check(count) {
            match reason {
                Rejection::Deviation { .. } => self.stats.rejected_spike += 1,
                Rejection::Zero => self.stats.rejected_zero += 1,
            }
            log::trace!("rejected count {} ({:?})", count, reason);
            return Ingest::Rejected { count, reason };
        }

        let slot = self.buffer.cursor();
        self.buffer.push(count);
        self.stats.accepted += 1;
        Ingest::Accepted { count, slot }
    }

    /// Mean of the buffered counts plus the configured offset, 0 when empty
    pub fn average(&self) -> f64 {
        match self.buffer.mean() {
            Some(mean) => mean + self.config.average_offset,
            None => 0.0,
        }
    }

    /// Buffered counts
    pub fn buffer(&self) -> &ResistanceBuffer {
        &self.buffer
    }

    /// Settings in use
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Acceptance counters
    pub fn stats(&self) -> SamplerStats {
        self.stats
    }

    fn check(&self, count: u16) -> Option<Rejection> {
        if count == 0 {
            return Some(Rejection::Zero);
        }

        match self.config.spike_policy {
            SpikePolicy::ZeroOrDeviation => self
                .buffer
                .last()
                .and_then(|last| relative_deviation(count, last))
                .filter(|deviation| *deviation > self.config.ignore_data_beyond_pct)
                .map(|deviation| Rejection::Deviation { deviation }),
            SpikePolicy::ZeroAndDeviation => None,
        }
    }
}

/// `|value - last| / last`, `None` when `last` is zero
fn relative_deviation(value: u16, last: u16) -> Option<f64> {
    if last == 0 {
        return None;
    }
    Some((f64::from(value) - f64::from(last)).abs() / f64::from(last))
}
