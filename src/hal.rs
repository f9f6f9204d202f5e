//! [`Transport`] over an `embedded-hal` blocking SPI bus and a chip-select pin
use core::fmt;
use core::time::Duration;

use embedded_hal as hal;
use hal::blocking::spi::Transfer;
use hal::digital::v2::OutputPin;

use crate::error::TransportError;
use crate::transport::{BusConfig, Transport};

/// Errors from the wrapped HAL peripherals
pub enum HalError<SPI, CS>
where
    SPI: Transfer<u8>,
    CS: OutputPin,
{
    /// Error during SPI Transfer
    Transfer(<SPI as Transfer<u8>>::Error),
    /// Error driving chip select
    ChipSelect(<CS as OutputPin>::Error),
}

impl<SPI, CS> fmt::Debug for HalError<SPI, CS>
where
    SPI: Transfer<u8>,
    SPI::Error: fmt::Debug,
    CS: OutputPin,
    <CS as OutputPin>::Error: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HalError::Transfer(error) => write!(f, "Transfer({:?})", error),
            HalError::ChipSelect(error) => write!(f, "ChipSelect({:?})", error),
        }
    }
}

/// Speed, mode and bit order are properties of the HAL bus itself, so they
/// must already match the chip when the peripheral is handed over. Blocking
/// HAL transfers cannot be interrupted and the timeout is not enforced.
pub struct HalTransport<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI, CS> HalTransport<SPI, CS> {
    pub fn new(spi: SPI, cs: CS) -> Self {
        HalTransport { spi, cs }
    }

    /// Gives back the wrapped peripherals
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }
}

impl<SPI, CS> Transport for HalTransport<SPI, CS>
where
    SPI: Transfer<u8>,
    SPI::Error: fmt::Debug,
    CS: OutputPin,
    <CS as OutputPin>::Error: fmt::Debug,
{
    type Error = HalError<SPI, CS>;

    fn open(&mut self, config: &BusConfig) -> Result<(), TransportError<Self::Error>> {
        log::debug!(
            "using HAL bus for {:?} ({:?}, {:?}, {} Hz requested)",
            config.bus,
            config.mode,
            config.bit_order,
            config.speed_hz
        );
        self.cs
            .set_high()
            .map_err(|e| TransportError::Unavailable(HalError::ChipSelect(e)))
    }

    fn transfer(
        &mut self,
        frame: &mut [u8],
        _timeout: Option<Duration>,
    ) -> Result<(), TransportError<Self::Error>> {
        self.cs
            .set_low()
            .map_err(|e| TransportError::Transfer(HalError::ChipSelect(e)))?;
        let result = self
            .spi
            .transfer(frame)
            .map(|_| ())
            .map_err(|e| TransportError::Transfer(HalError::Transfer(e)));
        // Deselect even when the transfer failed so the chip resyncs on the next frame
        let deselect = self
            .cs
            .set_high()
            .map_err(|e| TransportError::Transfer(HalError::ChipSelect(e)));
        result.and(deselect)
    }

    fn close(&mut self) -> Result<(), TransportError<Self::Error>> {
        self.cs
            .set_high()
            .map_err(|e| TransportError::Transfer(HalError::ChipSelect(e)))
    }
}
