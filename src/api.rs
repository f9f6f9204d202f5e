use crate::config::{check_bleed_word, ChargePumpCurrent, Muxout, OutputAmplitude};
use crate::error::{Error, ParameterError, VerificationError};
use crate::registers::*;
use crate::transport::{BusConfig, Transport};
use crate::variant::Variant;
use crate::Adf43xx;

/// Bleed current of one PHASE_ADJUSTMENT step, in nA
const PHASE_STEP_NA: u128 = 1_000;

/// A bleed current I shifts the loop by Δt = T_PFD × I / I_CP, so the
/// word is Δt × f_PFD × I_CP / I_step
fn phase_word(phase_ps: u32, pfd_hz: u64, cp: ChargePumpCurrent) -> Result<u8, ParameterError> {
    let num = u128::from(phase_ps) * u128::from(pfd_hz) * u128::from(cp.microamps()) * 1_000;
    let den = 1_000_000_000_000 * PHASE_STEP_NA;
    u8::try_from((num + den / 2) / den).map_err(|_| ParameterError::PhaseAdjust(phase_ps))
}

impl<T: Transport> Adf43xx<'_, T> {
    /// The chip model this handle was brought up as
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Bus settings the transport was opened with
    pub fn bus(&self) -> &BusConfig {
        &self.bus
    }

    /// Reads one register
    pub fn read_register(&mut self, addr: u16) -> Result<u8, Error<T::Error>> {
        self.read(addr)
    }

    /// Writes one register. Divider words written this way are not reflected
    /// in [`Adf43xx::get_output_frequency`].
    pub fn write_register(&mut self, addr: u16, value: u8) -> Result<(), Error<T::Error>> {
        self.write(addr, value)
    }

    /// Replaces the bits of `addr` selected by `mask` with those of `value`
    pub fn update_register_bits(
        &mut self,
        addr: u16,
        mask: u8,
        value: u8,
    ) -> Result<(), Error<T::Error>> {
        self.update_bits(addr, mask, value)
    }

    /// Routes a signal to the MUXOUT pin. Raw values convert with `Muxout::try_from`.
    pub fn set_mux_output(&mut self, muxout: Muxout) -> Result<(), Error<T::Error>> {
        self.write_field(self.variant.map().muxout, muxout.into())
    }

    /// Reads back the MUXOUT selection. A value outside [`Muxout`] is a
    /// [`VerificationError::UnknownSelector`].
    pub fn get_mux_output(&mut self) -> Result<Muxout, Error<T::Error>> {
        let found = self.read_field(self.variant.map().muxout)?;
        Muxout::try_from(found).map_err(|_| {
            VerificationError::UnknownSelector {
                control: "muxout",
                found,
            }
            .into()
        })
    }

    /// Sets the charge pump current. Later phase adjustments are scaled to it.
    pub fn set_charge_pump_current(
        &mut self,
        current: ChargePumpCurrent,
    ) -> Result<(), Error<T::Error>> {
        self.write_field(self.variant.map().cp_current, current.into())?;
        self.cp_current = current;
        Ok(())
    }

    /// Sets the differential clock output swing
    pub fn set_output_amplitude(
        &mut self,
        amplitude: OutputAmplitude,
    ) -> Result<(), Error<T::Error>> {
        self.write_field(self.variant.map().clkout_amplitude, amplitude.into())
    }

    /// Sets the 13-bit charge pump bleed current word
    pub fn set_bleed_word(&mut self, word: u16) -> Result<(), Error<T::Error>> {
        check_bleed_word(word)?;
        self.write_word(self.variant.map().bleed, word.into())
    }

    /// Selects 3.3 V instead of 1.8 V CMOS levels on the digital outputs
    pub fn set_cmos_output_3v3(&mut self, enable: bool) -> Result<(), Error<T::Error>> {
        self.write_field(self.variant.map().cmos_3v3, enable as u8)
    }

    /// Shifts the output phase later by `phase_ps` picoseconds with bleed
    /// current pulses. Only the fractional-N parts have this control.
    pub fn set_phase_adjust(&mut self, phase_ps: u32) -> Result<(), Error<T::Error>> {
        let control = self
            .variant
            .map()
            .phase
            .as_ref()
            .ok_or(ParameterError::Unsupported("phase adjustment"))?;
        let word = phase_word(phase_ps, self.reference.pfd_hz(), self.cp_current)?;

        self.write_field(control.resync, 1)?;
        self.write_field(control.del_mode, 0)?;
        self.write_field(control.word, word)?;
        self.write_field(control.apply, 1)?;
        log::debug!("phase adjust {} ps, word {}", phase_ps, word);
        Ok(())
    }

    /// Retrieves the chip type, 0x06 for every PLL in the family
    pub fn chip_type(&mut self) -> Result<u8, Error<T::Error>> {
        self.read(CHIP_TYPE)
    }

    /// Retrieves the 16-bit product ID
    pub fn product_id(&mut self) -> Result<u16, Error<T::Error>> {
        self.read_u16(PRODUCT_ID_L, PRODUCT_ID_H)
    }

    /// Retrieves the vendor ID, 0x0456 for every Analog Devices part
    pub fn vendor_id(&mut self) -> Result<u16, Error<T::Error>> {
        self.read_u16(VENDOR_ID_L, VENDOR_ID_H)
    }

    /// Logs every register of the variant's map at debug level
    pub fn dump_registers(&mut self) -> Result<(), Error<T::Error>> {
        let name = self.variant.info().name;
        for addr in 0..=self.variant.map().last {
            let value = self.read(addr)?;
            log::debug!("{} {:#06x}: {:#04x}", name, addr, value);
        }
        Ok(())
    }
}
