//! ADC command framing and a simulated converter
//!
//! The converter is an MCP3008-style part: the host clocks out three bytes
//! and receives three back. The first command byte carries the start bit,
//! the second selects single-ended mode and the channel, the third is
//! padding. The 10-bit result arrives split over the low two bits of the
//! second reply byte and the whole third byte.
//!
//! ```text
//! command: 0000_0001  SCCC_0000  xxxx_xxxx     S = single-ended, C = channel
//! reply:   xxxx_xxxx  xxxx_x0BB  BBBB_BBBB     B = result bits 9..0
//! ```

use crate::constants::adc::{
    ADC_FULL_SCALE, ADC_HIGH_BITS_MASK, ADC_SINGLE_ENDED, ADC_START_BIT,
};
use crate::errors::AdcError;
use crate::traits::{AdcFrame, AdcTransport};

/// Build the single-ended read command for `channel`
pub fn read_command(channel: u8) -> AdcFrame {
    [ADC_START_BIT, (ADC_SINGLE_ENDED + (channel & 0x07)) << 4, 0]
}

/// Extract the 10-bit count from a reply frame
pub fn decode_reply(reply: &AdcFrame) -> u16 {
    (u16::from(reply[1] & ADC_HIGH_BITS_MASK) << 8) + u16::from(reply[2])
}

/// Inverse of [`decode_reply`], used by test transports
pub fn encode_reply(count: u16) -> AdcFrame {
    let count = count.min(ADC_FULL_SCALE);
    [0, (count >> 8) as u8 & ADC_HIGH_BITS_MASK, (count & 0xff) as u8]
}

/// Deterministic stand-in for the SPI converter
///
/// Produces a triangle sweep of `±amplitude` counts around `centre`, with a
/// zero reading every `dropout_every` exchanges and a full-scale spike every
/// `spike_every` exchanges so the spike filter has something to reject.
#[derive(Debug, Clone)]
pub struct SimulatedAdc {
    centre: u16,
    amplitude: u16,
    dropout_every: u64,
    spike_every: u64,
    exchanges: u64,
}

impl SimulatedAdc {
    /// Sweep around `centre` with the default disturbance pattern
    pub fn new(centre: u16) -> Self {
        Self {
            centre: centre.clamp(1, ADC_FULL_SCALE - 1),
            amplitude: 4,
            dropout_every: 97,
            spike_every: 151,
            exchanges: 0,
        }
    }

    /// Set the sweep half-width in counts
    pub fn with_amplitude(mut self, amplitude: u16) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Disable the injected zero and spike readings
    pub fn without_disturbances(mut self) -> Self {
        self.dropout_every = 0;
        self.spike_every = 0;
        self
    }

    /// Number of exchanges served so far
    pub fn exchanges(&self) -> u64 {
        self.exchanges
    }

    fn next_count(&mut self) -> u16 {
        self.exchanges += 1;
        let n = self.exchanges;

        if self.dropout_every > 0 && n % self.dropout_every == 0 {
            return 0;
        }
        if self.spike_every > 0 && n % self.spike_every == 0 {
            return ADC_FULL_SCALE;
        }
        if self.amplitude == 0 {
            return self.centre;
        }

        // Triangle wave with period 4 * amplitude
        let amplitude = i64::from(self.amplitude);
        let phase = (n as i64) % (4 * amplitude);
        let offset = if phase < 2 * amplitude {
            phase - amplitude
        } else {
            3 * amplitude - phase
        };

        (i64::from(self.centre) + offset).clamp(1, i64::from(ADC_FULL_SCALE - 1)) as u16
    }
}

impl AdcTransport for SimulatedAdc {
    fn transfer(&mut self, _command: &AdcFrame) -> Result<AdcFrame, AdcError> {
        Ok(encode_reply(self.next_count()))
    }
}
