//! Spike Rejection Walkthrough
//!
//! Feeds a short sequence of ADC counts through both spike policies and
//! converts the surviving average to a temperature.
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run -p thermolog-core --example 01_spike_rejection
//! ```

use thermolog_core::{
    adc::encode_reply, Ingest, ResistanceSampler, SamplerConfig, SpikePolicy,
    TemperatureConverter, ThermistorModel,
};

fn main() {
    println!("thermolog spike rejection example");
    println!("=================================\n");

    let counts = [500u16, 510, 495, 0, 1000, 502];
    let converter = TemperatureConverter::new(ThermistorModel::default());

    for policy in [SpikePolicy::ZeroOrDeviation, SpikePolicy::ZeroAndDeviation] {
        let mut sampler = ResistanceSampler::new(SamplerConfig {
            resistances_to_keep: 4,
            spike_policy: policy,
            ..SamplerConfig::default()
        });

        println!("{:?}:", policy);
        for &count in &counts {
            match sampler.ingest(&encode_reply(count)) {
                Ingest::Accepted { slot, .. } => println!("  {:4} -> slot {}", count, slot),
                Ingest::Rejected { reason, .. } => println!("  {:4} rejected ({:?})", count, reason),
            }
        }

        let buffered: Vec<u16> = sampler.buffer().iter().collect();
        println!("  buffer: {:?}", buffered);
        match converter.convert(sampler.average()) {
            Ok(c) => println!(
                "  average {:.2} -> {:.0} Ω -> {:.2} °C\n",
                c.average, c.resistance, c.temperature
            ),
            Err(e) => println!("  {}\n", e),
        }
    }
}
