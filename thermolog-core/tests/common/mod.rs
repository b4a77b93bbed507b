//! Shared helpers for thermolog-core integration tests

#![allow(dead_code)]

use thermolog_core::adc::encode_reply;
use thermolog_core::{AdcFrame, ResistanceSampler, SamplerConfig, SpikePolicy};

/// ADC replies that decode to `counts`
pub fn replies(counts: &[u16]) -> Vec<AdcFrame> {
    counts.iter().map(|&c| encode_reply(c)).collect()
}

/// Sampler with the given capacity and threshold, zero-or-deviation policy
pub fn sampler(capacity: usize, threshold: f64) -> ResistanceSampler {
    sampler_with_policy(capacity, threshold, SpikePolicy::ZeroOrDeviation)
}

/// Sampler with an explicit spike policy
pub fn sampler_with_policy(
    capacity: usize,
    threshold: f64,
    spike_policy: SpikePolicy,
) -> ResistanceSampler {
    ResistanceSampler::new(SamplerConfig {
        resistances_to_keep: capacity,
        ignore_data_beyond_pct: threshold,
        spike_policy,
        average_offset: 0.0,
    })
}
