use crate::registers::{RegisterMap, ADF4377_MAP, ADF438X_MAP, CHIP_TYPE_PLL};

/// The chip models this driver can bring up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Integer-N, 800 MHz to 12.8 GHz
    Adf4377,
    /// Fractional-N, 687.5 MHz to 22 GHz
    Adf4382,
    /// Fractional-N, 800 MHz to 12.8 GHz
    Adf4368,
}

/// How the feedback divider realizes non-integer ratios
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modulation {
    IntegerN,
    /// N = N_INT + (FRAC1 + FRAC2 / MOD2) / 2^mod1_bits
    FractionalN { mod1_bits: u32, mod2_max: u32 },
}

/// Frequency limits and divider ranges of one variant, all in Hz
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyPlan {
    pub ref_min: u64,
    pub ref_max: u64,
    pub pfd_max: u64,
    pub vco_min: u64,
    pub vco_max: u64,
    pub out_min: u64,
    pub out_max: u64,
    /// Output divider ratios are 1, 2, 4, ... 2^max_div_log2
    pub max_div_log2: u8,
    pub n_int_min: u32,
    pub n_int_max: u32,
    pub r_div_max: u8,
    pub modulation: Modulation,
}

/// Constant description of a variant: identity bytes, frequency plan, register map
#[derive(Debug)]
pub struct ChipInfo {
    pub name: &'static str,
    pub chip_type: u8,
    pub product_id: u16,
    pub plan: FrequencyPlan,
    pub map: &'static RegisterMap,
}

static ADF4377: ChipInfo = ChipInfo {
    name: "ADF4377",
    chip_type: CHIP_TYPE_PLL,
    product_id: 0x0005,
    plan: FrequencyPlan {
        ref_min: 10_000_000,
        ref_max: 1_000_000_000,
        pfd_max: 500_000_000,
        vco_min: 6_400_000_000,
        vco_max: 12_800_000_000,
        out_min: 800_000_000,
        out_max: 12_800_000_000,
        max_div_log2: 3,
        n_int_min: 16,
        n_int_max: 4095,
        r_div_max: 63,
        modulation: Modulation::IntegerN,
    },
    map: &ADF4377_MAP,
};

static ADF4382: ChipInfo = ChipInfo {
    name: "ADF4382",
    chip_type: CHIP_TYPE_PLL,
    product_id: 0x0505,
    plan: FrequencyPlan {
        ref_min: 10_000_000,
        ref_max: 1_000_000_000,
        pfd_max: 625_000_000,
        vco_min: 11_000_000_000,
        vco_max: 22_000_000_000,
        out_min: 687_500_000,
        out_max: 22_000_000_000,
        max_div_log2: 4,
        n_int_min: 19,
        n_int_max: 4095,
        r_div_max: 63,
        modulation: Modulation::FractionalN {
            mod1_bits: 25,
            mod2_max: (1 << 24) - 1,
        },
    },
    map: &ADF438X_MAP,
};

static ADF4368: ChipInfo = ChipInfo {
    name: "ADF4368",
    chip_type: CHIP_TYPE_PLL,
    product_id: 0x0405,
    plan: FrequencyPlan {
        ref_min: 10_000_000,
        ref_max: 1_000_000_000,
        pfd_max: 625_000_000,
        vco_min: 6_400_000_000,
        vco_max: 12_800_000_000,
        out_min: 800_000_000,
        out_max: 12_800_000_000,
        max_div_log2: 3,
        n_int_min: 19,
        n_int_max: 4095,
        r_div_max: 63,
        modulation: Modulation::FractionalN {
            mod1_bits: 25,
            mod2_max: (1 << 24) - 1,
        },
    },
    map: &ADF438X_MAP,
};

impl Variant {
    pub fn info(self) -> &'static ChipInfo {
        match self {
            Variant::Adf4377 => &ADF4377,
            Variant::Adf4382 => &ADF4382,
            Variant::Adf4368 => &ADF4368,
        }
    }

    pub fn plan(self) -> &'static FrequencyPlan {
        &self.info().plan
    }

    pub fn map(self) -> &'static RegisterMap {
        self.info().map
    }
}
