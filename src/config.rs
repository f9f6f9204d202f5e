//! Bring-up parameters and the enumerated register controls
use core::time::Duration;

use crate::error::ParameterError;
use crate::transport::{BusConfig, GpioLines};
use crate::variant::Variant;

macro_rules! selector {
    ($(#[$meta:meta])*
     $name:ident ($control:literal) {
         $($(#[$vmeta:meta])* $variant:ident = $value:literal,)*
     }) => {
        $(#[$meta])*
        #[repr(u8)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value,)*
        }
        impl TryFrom<u8> for $name {
            type Error = ParameterError;
            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok($name::$variant),)*
                    _ => Err(ParameterError::Selector { control: $control, value }),
                }
            }
        }
        impl From<$name> for u8 {
            fn from(selector: $name) -> u8 {
                selector as u8
            }
        }
    };
}

selector!(
    /// Charge pump current
    ChargePumpCurrent ("charge pump current") {
        Ma0_7 = 0,
        Ma0_9 = 1,
        Ma1_1 = 2,
        Ma1_3 = 3,
        Ma1_4 = 4,
        Ma1_8 = 5,
        Ma2_2 = 6,
        Ma2_5 = 7,
        Ma2_9 = 8,
        Ma3_6 = 9,
        Ma4_3 = 10,
        Ma5_0 = 11,
        Ma5_7 = 12,
        Ma7_2 = 13,
        Ma8_6 = 14,
        Ma10_1 = 15,
    }
);

impl ChargePumpCurrent {
    /// Nominal current in µA
    pub fn microamps(self) -> u32 {
        const TABLE: [u32; 16] = [
            700, 900, 1100, 1300, 1400, 1800, 2200, 2500, 2900, 3600, 4300, 5000, 5700, 7200,
            8600, 10100,
        ];
        TABLE[self as usize]
    }
}

selector!(
    /// Differential clock output swing
    OutputAmplitude ("clock output amplitude") {
        Mv320 = 0,
        Mv420 = 1,
        Mv530 = 2,
        Mv640 = 3,
    }
);

selector!(
    /// Signal routed to the MUXOUT pin
    Muxout ("muxout") {
        HighZ = 0x0,
        /// Digital lock detect
        LockDetect = 0x1,
        Low = 0x2,
        /// Reference divider output / 2
        RefDiv2 = 0x4,
        /// Feedback divider output / 2
        NDiv2 = 0x5,
        High = 0x8,
    }
);

/// Everything `initialize` needs. Consumed by the bring-up.
#[derive(Debug, Clone)]
pub struct InitParam {
    pub variant: Variant,
    pub bus: BusConfig,
    /// Per-transaction timeout handed to the transport
    pub timeout: Option<Duration>,
    /// Reference input frequency in Hz
    pub ref_freq_hz: u64,
    /// Output frequency programmed during bring-up, in Hz
    pub freq_hz: u64,
    pub ref_doubler: bool,
    pub ref_div: u8,
    pub cp_current: ChargePumpCurrent,
    pub clkout_amplitude: OutputAmplitude,
    pub muxout: Muxout,
    /// 4-wire SPI (separate SDO). 3-wire reads come back on SDIO.
    pub spi_4wire: bool,
    /// 3.3 V CMOS levels on the digital outputs instead of 1.8 V
    pub cmos_3v3: bool,
    /// Bleed current word, left at the reset value when `None`
    pub bleed_word: Option<u16>,
    pub gpio: GpioLines,
}

impl InitParam {
    pub fn new(variant: Variant, bus: BusConfig, ref_freq_hz: u64, freq_hz: u64) -> Self {
        InitParam {
            variant,
            bus,
            timeout: None,
            ref_freq_hz,
            freq_hz,
            ref_doubler: false,
            ref_div: 1,
            cp_current: ChargePumpCurrent::Ma10_1,
            clkout_amplitude: OutputAmplitude::Mv640,
            muxout: Muxout::HighZ,
            spi_4wire: true,
            cmos_3v3: false,
            bleed_word: None,
            gpio: GpioLines::default(),
        }
    }

    /// Checks everything that can be checked without the frequency plan
    pub(crate) fn validate(&self) -> Result<(), ParameterError> {
        if self.bus.speed_hz == 0 {
            return Err(ParameterError::BusSpeed);
        }
        if let Some(word) = self.bleed_word {
            check_bleed_word(word)?;
        }
        Ok(())
    }
}

pub(crate) const BLEED_WORD_MAX: u16 = (1 << 13) - 1;

pub(crate) fn check_bleed_word(word: u16) -> Result<(), ParameterError> {
    if word > BLEED_WORD_MAX {
        Err(ParameterError::BleedWord(word))
    } else {
        Ok(())
    }
}
