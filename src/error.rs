use core::fmt;

use crate::transport::BusId;

/// Error type returned by every fallible driver operation
pub enum Error<E> {
    /// The transport failed to carry a transaction
    Bus(TransportError<E>),
    /// A bring-up readback did not match the expected constant
    Verification(VerificationError),
    /// A caller-supplied value is outside its valid domain
    Parameter(ParameterError),
    /// The bus/chip-select pair is already bound to a live handle
    ResourceConflict(BusId),
}

/// Transport-level failures
pub enum TransportError<E> {
    /// Opening or configuring the bus failed (missing node, permission denied)
    Unavailable(E),
    /// A transfer failed
    Transfer(E),
    /// A transfer did not complete within the requested timeout
    Timeout,
    /// The handle has been removed and no longer owns a transport
    Released,
}

/// The chip read back something other than what was expected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationError {
    /// Chip type register held an unexpected value
    ChipType { expected: u8, found: u8 },
    /// Scratchpad did not read back the written pattern
    Scratchpad { written: u8, found: u8 },
    /// Product ID registers held an unexpected value
    ProductId { expected: u16, found: u16 },
    /// A selector field holds a value outside its enumerated set
    UnknownSelector { control: &'static str, found: u8 },
}

/// Values rejected before any bus activity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterError {
    /// Bus speed must be non-zero
    BusSpeed,
    /// Reference input frequency outside the variant's range
    ReferenceFrequency(u64),
    /// Reference divider outside `1..=max`
    ReferenceDivider(u8),
    /// Phase-detector frequency above the variant's maximum
    PfdFrequency(u64),
    /// Output frequency outside the variant's range
    OutputFrequency(u64),
    /// The integer divide ratio needed for the output is not programmable
    DivideRatio(u64),
    /// Raw value is not a member of the selector's enumerated set
    Selector { control: &'static str, value: u8 },
    /// Bleed word must be 13 bits
    BleedWord(u16),
    /// Register address does not fit the 15-bit address phase
    Address(u16),
    /// Phase shift in ps needs more than the 8-bit adjustment word
    PhaseAdjust(u32),
    /// The variant has no such control
    Unsupported(&'static str),
}

impl<E> From<TransportError<E>> for Error<E> {
    fn from(error: TransportError<E>) -> Self {
        Error::Bus(error)
    }
}

impl<E> From<VerificationError> for Error<E> {
    fn from(error: VerificationError) -> Self {
        Error::Verification(error)
    }
}

impl<E> From<ParameterError> for Error<E> {
    fn from(error: ParameterError) -> Self {
        Error::Parameter(error)
    }
}

impl<E> Error<E> {
    /// True for bus timeouts, which bring-up treats like a verification failure
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Bus(TransportError::Timeout))
    }
}

impl<E: fmt::Debug> fmt::Debug for TransportError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TransportError::Unavailable(error) => write!(f, "Unavailable({:?})", error),
            TransportError::Transfer(error) => write!(f, "Transfer({:?})", error),
            TransportError::Timeout => write!(f, "Timeout"),
            TransportError::Released => write!(f, "Released"),
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Bus(error) => write!(f, "Bus({:?})", error),
            Error::Verification(error) => write!(f, "Verification({:?})", error),
            Error::Parameter(error) => write!(f, "Parameter({:?})", error),
            Error::ResourceConflict(bus) => write!(f, "ResourceConflict({:?})", bus),
        }
    }
}

impl fmt::Display for VerificationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VerificationError::ChipType { expected, found } => write!(
                f,
                "chip type mismatch: expected {:#04x}, found {:#04x}",
                expected, found
            ),
            VerificationError::Scratchpad { written, found } => write!(
                f,
                "scratchpad readback mismatch: wrote {:#04x}, read {:#04x}",
                written, found
            ),
            VerificationError::ProductId { expected, found } => write!(
                f,
                "product id mismatch: expected {:#06x}, found {:#06x}",
                expected, found
            ),
            VerificationError::UnknownSelector { control, found } => {
                write!(f, "{} register holds unknown value {:#04x}", control, found)
            }
        }
    }
}

impl fmt::Display for ParameterError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParameterError::BusSpeed => write!(f, "bus speed must be non-zero"),
            ParameterError::ReferenceFrequency(hz) => {
                write!(f, "reference frequency {} Hz out of range", hz)
            }
            ParameterError::ReferenceDivider(r) => write!(f, "reference divider {} out of range", r),
            ParameterError::PfdFrequency(hz) => {
                write!(f, "phase detector frequency {} Hz too high", hz)
            }
            ParameterError::OutputFrequency(hz) => {
                write!(f, "output frequency {} Hz out of range", hz)
            }
            ParameterError::DivideRatio(n) => write!(f, "divide ratio {} not programmable", n),
            ParameterError::Selector { control, value } => {
                write!(f, "{:#04x} is not a valid {} selector", value, control)
            }
            ParameterError::BleedWord(word) => write!(f, "bleed word {} exceeds 13 bits", word),
            ParameterError::Address(addr) => write!(f, "register address {:#06x} out of range", addr),
            ParameterError::PhaseAdjust(ps) => write!(f, "phase adjustment of {} ps out of range", ps),
            ParameterError::Unsupported(control) => write!(f, "{} not supported by this variant", control),
        }
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Bus(TransportError::Unavailable(error)) => {
                write!(f, "bus unavailable: {:?}", error)
            }
            Error::Bus(TransportError::Transfer(error)) => write!(f, "transfer failed: {:?}", error),
            Error::Bus(TransportError::Timeout) => write!(f, "transfer timed out"),
            Error::Bus(TransportError::Released) => write!(f, "device handle already removed"),
            Error::Verification(error) => write!(f, "verification failed: {}", error),
            Error::Parameter(error) => write!(f, "invalid parameter: {}", error),
            Error::ResourceConflict(bus) => write!(
                f,
                "spi bus {} chip select {} is already bound",
                bus.device, bus.chip_select
            ),
        }
    }
}
