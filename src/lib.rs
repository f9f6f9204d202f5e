#![cfg_attr(not(test), no_std)]

//! A driver for the ADF43xx family of microwave PLL synthesizers
//! ([ADF4377](https://www.analog.com/en/products/adf4377.html),
//! [ADF4382](https://www.analog.com/en/products/adf4382.html) and
//! [ADF4368](https://www.analog.com/en/products/adf4368.html)).
//!
//! The bus is injected through the [`Transport`] trait. [`HalTransport`] adapts
//! any `embedded-hal` blocking SPI bus and chip-select pin.
//!
//! ```ignore
//! let registry = BusRegistry::new();
//! let mut param = InitParam::new(
//!     Variant::Adf4377,
//!     BusConfig::new(0, 0, 1_500_000),
//!     125_000_000,
//!     10_000_000_000,
//! );
//! param.ref_doubler = true;
//! let mut pll = Adf43xx::initialize(&registry, HalTransport::new(spi, cs), param)?;
//! pll.set_output_frequency(11_000_000_000)?;
//! pll.set_mux_output(Muxout::LockDetect)?;
//! pll.remove()?;
//! ```
//!
//! # Not yet implemented
//! * LUT-based VCO calibration
use core::time::Duration;

mod api;
mod config;
mod device;
mod error;
mod frequency;
mod hal;
#[cfg(test)]
mod mock;
mod registers;
mod registry;
mod spi;
mod transport;
mod variant;

pub use config::{ChargePumpCurrent, InitParam, Muxout, OutputAmplitude};
pub use error::{Error, ParameterError, TransportError, VerificationError};
pub use frequency::{solve, PllSolution, ReferencePath};
pub use hal::{HalError, HalTransport};
pub use registers::{Field, PhaseControl, RegisterMap};
pub use registry::{BusClaim, BusRegistry, MAX_BINDINGS};
pub use transport::{BitOrder, BusConfig, BusId, GpioLine, GpioLines, SpiMode, Transport};
pub use variant::{ChipInfo, FrequencyPlan, Modulation, Variant};

/// A running synthesizer.
///
/// Only [`Adf43xx::initialize`] creates one, and only after the chip has been
/// reset, identified and programmed. The handle owns its transport outright;
/// every register access takes `&mut self`, so read-modify-write sequences
/// can never interleave.
pub struct Adf43xx<'r, T: Transport> {
    /// `None` once removed
    transport: Option<T>,
    claim: Option<BusClaim<'r>>,
    variant: Variant,
    bus: BusConfig,
    timeout: Option<Duration>,
    gpio: GpioLines,
    /// Needed to scale phase adjustments
    cp_current: ChargePumpCurrent,
    reference: ReferencePath,
    /// Last successfully committed target
    frequency: u64,
    /// Divider words currently in the chip, `None` when unknown
    solution: Option<PllSolution>,
}
