//! The bus capability the driver is handed by its caller.
//!
//! Everything platform specific (spidev nodes, HAL peripherals, GPIO chips)
//! lives behind [`Transport`]; the driver only ever sees configured, full
//! duplex byte frames.
use core::fmt::Debug;
use core::time::Duration;

use crate::error::TransportError;

/// Identity of one chip on one bus, e.g. `/dev/spidev{device}.{chip_select}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BusId {
    pub device: u8,
    pub chip_select: u8,
}

impl BusId {
    pub const fn new(device: u8, chip_select: u8) -> Self {
        BusId {
            device,
            chip_select,
        }
    }
}

/// Clock polarity and phase
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiMode {
    /// CPOL = 0, CPHA = 0
    Mode0 = 0,
    /// CPOL = 0, CPHA = 1
    Mode1 = 1,
    /// CPOL = 1, CPHA = 0
    Mode2 = 2,
    /// CPOL = 1, CPHA = 1
    Mode3 = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOrder {
    MsbFirst,
    LsbFirst,
}

/// Everything the transport needs to open the bus for one chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    pub bus: BusId,
    /// Clock rate in Hz. There is no safe default for bring-up, so callers
    /// must pick one that matches their wiring.
    pub speed_hz: u32,
    pub mode: SpiMode,
    pub bit_order: BitOrder,
}

impl BusConfig {
    /// Mode 0, MSB first, which is how the ADF43xx parts are strapped out of reset
    pub const fn new(device: u8, chip_select: u8, speed_hz: u32) -> Self {
        BusConfig {
            bus: BusId::new(device, chip_select),
            speed_hz,
            mode: SpiMode::Mode0,
            bit_order: BitOrder::MsbFirst,
        }
    }
}

/// A GPIO line number as understood by the transport's platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioLine(pub u32);

/// Optional control lines. `None` means this driver instance leaves the line alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GpioLines {
    pub chip_enable: Option<GpioLine>,
    pub clkout1_enable: Option<GpioLine>,
    pub clkout2_enable: Option<GpioLine>,
}

impl GpioLines {
    pub(crate) fn iter(&self) -> impl Iterator<Item = GpioLine> {
        [self.chip_enable, self.clkout1_enable, self.clkout2_enable]
            .into_iter()
            .flatten()
    }
}

/// A blocking SPI bus bound to one chip select
pub trait Transport {
    type Error: Debug;

    /// Opens the bus and applies speed, mode and bit order
    fn open(&mut self, config: &BusConfig) -> Result<(), TransportError<Self::Error>>;

    /// Clocks `frame` out and replaces it with the bytes clocked in.
    ///
    /// With `Some(timeout)` the transfer must give up and return
    /// [`TransportError::Timeout`] once the timeout elapses.
    fn transfer(
        &mut self,
        frame: &mut [u8],
        timeout: Option<Duration>,
    ) -> Result<(), TransportError<Self::Error>>;

    /// Releases the bus
    fn close(&mut self) -> Result<(), TransportError<Self::Error>>;

    /// Blocks for at least `duration`. Used to let the chip settle after reset.
    fn delay(&mut self, _duration: Duration) {}

    /// Drives an auxiliary control line. Transports without GPIO access ignore it.
    fn set_line(&mut self, _line: GpioLine, _high: bool) -> Result<(), TransportError<Self::Error>> {
        Ok(())
    }
}
