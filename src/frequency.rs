//! Frequency planning and the divider commit sequence.
//!
//! f_PFD = f_REF × (1 + D) / R
//! f_VCO = f_PFD × (N_INT + (FRAC1 + FRAC2 / MOD2) / MOD1)
//! f_OUT = f_VCO / 2^CLKOUT_DIV
//!
//! Integer-N parts have no fractional words, which is the same equation with
//! MOD1 = MOD2 = 1 and both FRAC words zero.
use crate::error::{Error, ParameterError};
use crate::transport::Transport;
use crate::variant::{FrequencyPlan, Modulation, Variant};
use crate::Adf43xx;

/// Reference input conditioning ahead of the phase detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferencePath {
    pub ref_freq_hz: u64,
    pub doubler: bool,
    pub r_div: u8,
}

impl ReferencePath {
    fn multiplied(&self) -> u64 {
        self.ref_freq_hz << (self.doubler as u32)
    }

    /// Phase detector frequency in Hz, rounded down
    pub fn pfd_hz(&self) -> u64 {
        self.multiplied() / u64::from(self.r_div.max(1))
    }

    fn check(&self, plan: &FrequencyPlan) -> Result<(), ParameterError> {
        if !(plan.ref_min..=plan.ref_max).contains(&self.ref_freq_hz) {
            return Err(ParameterError::ReferenceFrequency(self.ref_freq_hz));
        }
        if !(1..=plan.r_div_max).contains(&self.r_div) {
            return Err(ParameterError::ReferenceDivider(self.r_div));
        }
        if self.multiplied() > plan.pfd_max * u64::from(self.r_div) {
            return Err(ParameterError::PfdFrequency(self.pfd_hz()));
        }
        Ok(())
    }
}

/// Divider settings realizing one output frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PllSolution {
    pub reference: ReferencePath,
    /// Output divider as a power of two
    pub div_log2: u8,
    pub n_int: u32,
    pub frac1: u32,
    pub frac2: u32,
    pub mod2: u32,
    /// MOD1 = 2^mod1_bits, zero for integer-N
    pub mod1_bits: u32,
}

impl PllSolution {
    /// Output divider ratio
    pub fn output_divider(&self) -> u32 {
        1 << self.div_log2
    }

    /// The frequency these settings actually produce, rounded to the nearest Hz
    pub fn output_hz(&self) -> u64 {
        self.divided_hz(self.div_log2)
    }

    /// VCO frequency, rounded to the nearest Hz
    pub fn vco_hz(&self) -> u64 {
        self.divided_hz(0)
    }

    fn divided_hz(&self, div_log2: u8) -> u64 {
        let mod1 = 1u128 << self.mod1_bits;
        let mod2 = u128::from(self.mod2);
        let ratio = (u128::from(self.n_int) * mod1 + u128::from(self.frac1)) * mod2
            + u128::from(self.frac2);
        let num = u128::from(self.reference.multiplied()) * ratio;
        let den = (u128::from(self.reference.r_div) * mod1 * mod2) << div_log2;
        ((num + den / 2) / den) as u64
    }

    /// Spacing between adjacent programmable output frequencies
    pub fn resolution_hz(&self) -> u64 {
        if self.mod1_bits == 0 {
            (self.reference.pfd_hz() >> self.div_log2).max(1)
        } else {
            1
        }
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// FRAC2/MOD2 for the residue `rem / den`, exact when the reduced fraction
/// fits in MOD2, otherwise the nearest value at the largest MOD2
fn residue(rem: u128, den: u128, mod2_max: u32) -> (u32, u32) {
    if rem == 0 {
        return (0, 1);
    }
    let g = gcd(rem, den);
    if den / g <= u128::from(mod2_max) {
        return ((rem / g) as u32, (den / g) as u32);
    }
    let max = u128::from(mod2_max);
    let frac2 = ((rem * max + den / 2) / den).min(max - 1);
    (frac2 as u32, mod2_max)
}

/// Closest integer-N setting, over every output divider, whose rounded VCO
/// frequency stays inside the VCO range. Returns `(div_log2, n)`.
fn integer_n(
    plan: &FrequencyPlan,
    reference: &ReferencePath,
    target_hz: u64,
) -> Result<(u8, u128), ParameterError> {
    // Everything is scaled by R so the PFD frequency stays exact
    let r = u128::from(reference.r_div);
    let step = u128::from(reference.multiplied());
    let vco_range = u128::from(plan.vco_min) * r..=u128::from(plan.vco_max) * r;
    let n_range = u128::from(plan.n_int_min)..=u128::from(plan.n_int_max);

    let mut best: Option<(u128, u8, u128)> = None;
    let mut out_of_range_n = None;
    for d in 0..=plan.max_div_log2 {
        let wanted = (u128::from(target_hz) << d) * r;
        let below = wanted / step;
        for n in [below, below + 1] {
            let vco = n * step;
            if !vco_range.contains(&vco) {
                continue;
            }
            if !n_range.contains(&n) {
                out_of_range_n.get_or_insert(n);
                continue;
            }
            // Output error, on a common scale across dividers
            let error = vco.abs_diff(wanted) << (plan.max_div_log2 - d);
            if best.map_or(true, |(e, _, _)| error < e) {
                best = Some((error, d, n));
            }
        }
    }
    match (best, out_of_range_n) {
        (Some((_, d, n)), _) => Ok((d, n)),
        (None, Some(n)) => Err(ParameterError::DivideRatio(n as u64)),
        (None, None) => Err(ParameterError::OutputFrequency(target_hz)),
    }
}

/// Works out the divider words for `target_hz` without touching any hardware
pub fn solve(
    variant: Variant,
    reference: ReferencePath,
    target_hz: u64,
) -> Result<PllSolution, ParameterError> {
    let plan = variant.plan();
    reference.check(plan)?;
    if !(plan.out_min..=plan.out_max).contains(&target_hz) {
        return Err(ParameterError::OutputFrequency(target_hz));
    }

    let (mod1_bits, mod2_max) = match plan.modulation {
        Modulation::IntegerN => {
            let (div_log2, n_int) = integer_n(plan, &reference, target_hz)?;
            return Ok(PllSolution {
                reference,
                div_log2,
                n_int: n_int as u32,
                frac1: 0,
                frac2: 0,
                mod2: 1,
                mod1_bits: 0,
            });
        }
        Modulation::FractionalN {
            mod1_bits,
            mod2_max,
        } => (mod1_bits, mod2_max),
    };

    // Smallest output divider that lifts the VCO into range
    let div_log2 = (0..=plan.max_div_log2)
        .find(|&d| target_hz << d >= plan.vco_min)
        .ok_or(ParameterError::OutputFrequency(target_hz))?;
    let vco_hz = target_hz << div_log2;
    if vco_hz > plan.vco_max {
        return Err(ParameterError::OutputFrequency(target_hz));
    }

    // N = f_VCO × R / (f_REF × (1 + D))
    let num = u128::from(vco_hz) * u128::from(reference.r_div);
    let den = u128::from(reference.multiplied());
    let n_int = num / den;
    if n_int < u128::from(plan.n_int_min) || n_int > u128::from(plan.n_int_max) {
        return Err(ParameterError::DivideRatio(n_int as u64));
    }
    let scaled = (num % den) << mod1_bits;
    let (frac2, mod2) = residue(scaled % den, den, mod2_max);

    Ok(PllSolution {
        reference,
        div_log2,
        n_int: n_int as u32,
        frac1: (scaled / den) as u32,
        frac2,
        mod2,
        mod1_bits,
    })
}

impl<T: Transport> Adf43xx<'_, T> {
    /// Programs a new output frequency in Hz.
    ///
    /// Out-of-range targets are rejected before any bus traffic. If the commit
    /// fails part way, the chip holds a mix of old and new words and the value
    /// reported by [`Adf43xx::get_output_frequency`] is stale until the next
    /// successful call.
    pub fn set_output_frequency(&mut self, target_hz: u64) -> Result<(), Error<T::Error>> {
        let solution = solve(self.variant, self.reference, target_hz)?;
        self.program(&solution)?;
        self.frequency = target_hz;
        Ok(())
    }

    /// Last successfully programmed target, without bus activity. Writes that
    /// bypass the driver are not reflected.
    pub fn get_output_frequency(&self) -> u64 {
        self.frequency
    }

    /// Frequency realized by the divider words in the chip, `None` after a
    /// failed commit
    pub fn actual_output_frequency(&self) -> Option<u64> {
        self.solution.map(|s| s.output_hz())
    }

    /// Divider words currently in the chip, `None` when unknown
    pub fn solution(&self) -> Option<&PllSolution> {
        self.solution.as_ref()
    }

    /// Reference path the current divider words were solved for
    pub fn reference(&self) -> ReferencePath {
        self.reference
    }

    /// Switches to a new reference path and re-programs the current target through it
    pub fn set_reference(
        &mut self,
        ref_freq_hz: u64,
        doubler: bool,
        r_div: u8,
    ) -> Result<(), Error<T::Error>> {
        let reference = ReferencePath {
            ref_freq_hz,
            doubler,
            r_div,
        };
        let solution = solve(self.variant, reference, self.frequency)?;
        self.program(&solution)?;
        self.reference = reference;
        Ok(())
    }

    /// Commits `solution`. The N_INT LSB register goes last: writing it
    /// latches the double-buffered words and starts VCO calibration.
    pub(crate) fn program(&mut self, solution: &PllSolution) -> Result<(), Error<T::Error>> {
        let map = self.variant.map();
        // Unknown until every word has landed
        let previous = self.solution.take();

        if previous.map(|p| p.reference) != Some(solution.reference) {
            self.write_field(map.ref_doubler, solution.reference.doubler as u8)?;
            self.write_field(map.r_div, solution.reference.r_div)?;
        }
        if previous.map(|p| p.div_log2) != Some(solution.div_log2) {
            self.write_field(map.clkout_div, solution.div_log2)?;
        }
        if solution.mod1_bits != 0 {
            self.write_word(map.mod2, solution.mod2)?;
            self.write_word(map.frac2, solution.frac2)?;
            self.write_word(map.frac1, solution.frac1)?;
        }
        if let Some((latch, upper)) = map.n_int.split_first() {
            self.write_word(upper, solution.n_int >> latch.width())?;
            self.write_word(core::slice::from_ref(latch), solution.n_int)?;
        }

        log::debug!(
            "{}: N_INT {} FRAC1 {} FRAC2/MOD2 {}/{} div {} -> {} Hz",
            self.variant.info().name,
            solution.n_int,
            solution.frac1,
            solution.frac2,
            solution.mod2,
            solution.output_divider(),
            solution.output_hz()
        );
        self.solution = Some(*solution);
        Ok(())
    }
}
