//! MCP3008-style ADC over the Raspberry Pi SPI peripheral
//!
//! The device is named by its Linux node, `/dev/spidevB.S`, where `B` is
//! the bus and `S` the chip select.

use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use thermolog_core::constants::ADC_TRANSFER_LEN;
use thermolog_core::{AdcError, AdcFrame, AdcTransport};

/// ADC reached through `rppal`'s SPI driver
pub struct SpiAdc {
    spi: Spi,
}

impl SpiAdc {
    /// Open `/dev/spidevB.S` at `clock_hz` in SPI mode 0
    pub fn open(device: &str, clock_hz: u32) -> Result<Self, AdcError> {
        let (bus, slave) = parse_device(device)?;
        let spi = Spi::new(bus, slave, clock_hz, Mode::Mode0)
            .map_err(|e| AdcError::Open(format!("{}: {}", device, e)))?;
        log::info!("opened {} at {} Hz", device, clock_hz);
        Ok(Self { spi })
    }
}

impl AdcTransport for SpiAdc {
    fn transfer(&mut self, command: &AdcFrame) -> Result<AdcFrame, AdcError> {
        let mut reply = [0u8; ADC_TRANSFER_LEN];
        let n = self
            .spi
            .transfer(&mut reply, command)
            .map_err(|e| AdcError::Transfer(e.to_string()))?;
        if n != ADC_TRANSFER_LEN {
            return Err(AdcError::ShortReply {
                expected: ADC_TRANSFER_LEN,
                actual: n,
            });
        }
        Ok(reply)
    }
}

fn parse_device(device: &str) -> Result<(Bus, SlaveSelect), AdcError> {
    let invalid = || AdcError::Open(format!("expected /dev/spidevB.S, got {}", device));

    let suffix = device.strip_prefix("/dev/spidev").ok_or_else(invalid)?;
    let (bus, slave) = suffix.split_once('.').ok_or_else(invalid)?;
    let bus: u8 = bus.parse().map_err(|_| invalid())?;
    let slave: u8 = slave.parse().map_err(|_| invalid())?;

    let bus = match bus {
        0 => Bus::Spi0,
        1 => Bus::Spi1,
        2 => Bus::Spi2,
        3 => Bus::Spi3,
        4 => Bus::Spi4,
        5 => Bus::Spi5,
        6 => Bus::Spi6,
        _ => return Err(invalid()),
    };
    let slave = match slave {
        0 => SlaveSelect::Ss0,
        1 => SlaveSelect::Ss1,
        2 => SlaveSelect::Ss2,
        _ => return Err(invalid()),
    };
    Ok((bus, slave))
}
