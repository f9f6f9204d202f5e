//! Register addresses and bit fields.
//!
//! Every ADF43xx register is eight bits wide. Fields are described by the
//! register address and a contiguous mask; multi-register words (N_INT,
//! FRAC1, ...) are a list of fields ordered least significant first.

/// Highest address representable in the 15-bit address phase
pub const MAX_ADDRESS: u16 = 0x7FFF;

// Registers shared by the whole family (ADI SPI interface block)

/// Interface configuration A: soft reset, bit order and SDO enable
pub const INTERFACE_CONFIG_A: u16 = 0x00;
pub const CHIP_TYPE: u16 = 0x03;
pub const PRODUCT_ID_L: u16 = 0x04;
pub const PRODUCT_ID_H: u16 = 0x05;
pub const SCRATCHPAD: u16 = 0x0A;
pub const VENDOR_ID_L: u16 = 0x0C;
pub const VENDOR_ID_H: u16 = 0x0D;

/// SOFT_RESET with its mirror bit, so the command reads the same in either bit order
pub const SOFT_RESET: u8 = 0x81;
/// SDO_ACTIVE and its mirror: 4-wire operation
pub const SDO_ACTIVE: u8 = 0x18;
/// LSB_FIRST and its mirror
pub const LSB_FIRST: u8 = 0x42;

pub const CHIP_TYPE_PLL: u8 = 0x06;
pub const VENDOR_ID_ADI: u16 = 0x0456;
pub const SCRATCHPAD_PATTERN: u8 = 0xAA;

/// A contiguous group of bits inside one register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub addr: u16,
    pub mask: u8,
}

impl Field {
    pub const fn new(addr: u16, mask: u8) -> Self {
        Field { addr, mask }
    }

    pub fn shift(&self) -> u32 {
        self.mask.trailing_zeros()
    }

    pub fn width(&self) -> u32 {
        self.mask.count_ones()
    }

    /// True when the field covers the whole register and can be written blind
    pub fn is_full(&self) -> bool {
        self.mask == 0xFF
    }

    /// Positions `value` inside the register, dropping bits that do not fit
    pub fn encode(&self, value: u8) -> u8 {
        (value << self.shift()) & self.mask
    }

    pub fn decode(&self, register: u8) -> u8 {
        (register & self.mask) >> self.shift()
    }
}

/// Total width in bits of a multi-register word
pub fn word_width(fields: &[Field]) -> u32 {
    fields.iter().map(Field::width).sum()
}

/// Splits `value` over `fields`, least significant field first
pub fn split_word(fields: &[Field], value: u32) -> impl Iterator<Item = (Field, u8)> + '_ {
    fields.iter().scan(value, |rest, field| {
        let piece = (*rest & ((1u32 << field.width()) - 1)) as u8;
        *rest >>= field.width();
        Some((*field, piece))
    })
}

/// Bleed-current phase adjustment
#[derive(Debug)]
pub struct PhaseControl {
    /// EN_PHASE_RESYNC
    pub resync: Field,
    /// Delay mode, cleared to select bleed-current adjustment
    pub del_mode: Field,
    /// PHASE_ADJUSTMENT word
    pub word: Field,
    /// Applies the word when set. Self-clearing.
    pub apply: Field,
}

/// Where each variant keeps the fields the driver programs
#[derive(Debug)]
pub struct RegisterMap {
    /// Integer divide word. The first field's register latches the
    /// double-buffered divider words and starts VCO calibration when written.
    pub n_int: &'static [Field],
    pub frac1: &'static [Field],
    pub mod2: &'static [Field],
    pub frac2: &'static [Field],
    pub r_div: Field,
    pub ref_doubler: Field,
    /// Output divider, programmed as log2 of the ratio
    pub clkout_div: Field,
    pub cp_current: Field,
    pub clkout_amplitude: Field,
    pub muxout: Field,
    pub bleed: &'static [Field],
    pub cmos_3v3: Field,
    pub phase: Option<PhaseControl>,
    /// Loaded after every soft reset
    pub defaults: &'static [(u16, u8)],
    /// Last register worth dumping
    pub last: u16,
}

pub(crate) static ADF4377_MAP: RegisterMap = RegisterMap {
    n_int: &[Field::new(0x10, 0xFF), Field::new(0x11, 0x0F)],
    frac1: &[],
    mod2: &[],
    frac2: &[],
    r_div: Field::new(0x12, 0x3F),
    ref_doubler: Field::new(0x11, 0x40),
    clkout_div: Field::new(0x12, 0xC0),
    cp_current: Field::new(0x15, 0xF0),
    clkout_amplitude: Field::new(0x19, 0x30),
    muxout: Field::new(0x1D, 0xF0),
    bleed: &[Field::new(0x13, 0xFF), Field::new(0x14, 0x1F)],
    cmos_3v3: Field::new(0x1C, 0x08),
    phase: None,
    defaults: &[
        // EN_AUTOCAL
        (0x11, 0x80),
        // lock detect count, LD_CLK_SEL
        (0x1E, 0x0A),
        // VCO band select divider
        (0x20, 0x14),
        // DCLK mode
        (0x26, 0x04),
    ],
    last: 0x54,
};

/// Shared by the ADF4382 and ADF4368
pub(crate) static ADF438X_MAP: RegisterMap = RegisterMap {
    n_int: &[Field::new(0x10, 0xFF), Field::new(0x11, 0xFF)],
    frac1: &[
        Field::new(0x12, 0xFF),
        Field::new(0x13, 0xFF),
        Field::new(0x14, 0xFF),
        Field::new(0x15, 0x01),
    ],
    mod2: &[
        Field::new(0x16, 0xFF),
        Field::new(0x17, 0xFF),
        Field::new(0x18, 0xFF),
    ],
    frac2: &[
        Field::new(0x19, 0xFF),
        Field::new(0x1A, 0xFF),
        Field::new(0x1B, 0xFF),
    ],
    r_div: Field::new(0x1E, 0x3F),
    ref_doubler: Field::new(0x1E, 0x40),
    clkout_div: Field::new(0x28, 0x07),
    cp_current: Field::new(0x1F, 0x0F),
    clkout_amplitude: Field::new(0x29, 0x0F),
    muxout: Field::new(0x2E, 0xF0),
    bleed: &[Field::new(0x1C, 0xFF), Field::new(0x1D, 0x1F)],
    cmos_3v3: Field::new(0x3D, 0x20),
    phase: Some(PhaseControl {
        resync: Field::new(0x1E, 0x80),
        del_mode: Field::new(0x32, 0x01),
        word: Field::new(0x33, 0xFF),
        apply: Field::new(0x34, 0x01),
    }),
    defaults: &[
        // EN_AUTOCAL, EN_DNCLK
        (0x20, 0xC1),
        // lock detect count
        (0x2C, 0x0A),
        // VCO band select divider
        (0x31, 0x09),
        // LUT calibration disabled
        (0x3E, 0x00),
    ],
    last: 0x63,
};
