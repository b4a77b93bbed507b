//! Core traits for hardware seams
//!
//! Keep them small: the pipeline only needs a byte exchange with the ADC.

use crate::constants::ADC_TRANSFER_LEN;
use crate::errors::AdcError;

/// One command/reply frame exchanged with the ADC
pub type AdcFrame = [u8; ADC_TRANSFER_LEN];

/// Full-duplex byte exchange with the converter
///
/// Implemented by the SPI adapter in `thermolog-connectors` and by
/// [`SimulatedAdc`](crate::adc::SimulatedAdc) for off-target runs.
pub trait AdcTransport: Send {
    /// Clock out `command` and return the bytes clocked in at the same time
    fn transfer(&mut self, command: &AdcFrame) -> Result<AdcFrame, AdcError>;
}

impl<T: AdcTransport + ?Sized> AdcTransport for Box<T> {
    fn transfer(&mut self, command: &AdcFrame) -> Result<AdcFrame, AdcError> {
        (**self).transfer(command)
    }
}

/// Trait for values that can be checked before they reach storage
pub trait Validatable {
    /// Check if the value is usable (not NaN, infinite, etc)
    fn is_valid(&self) -> bool;
}

impl Validatable for f64 {
    fn is_valid(&self) -> bool {
        self.is_finite()
    }
}
