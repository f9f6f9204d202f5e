//! Bring-up and release of a device handle
use core::time::Duration;

use crate::config::InitParam;
use crate::error::{Error, TransportError, VerificationError};
use crate::frequency::{solve, PllSolution, ReferencePath};
use crate::registers::*;
use crate::registry::BusRegistry;
use crate::transport::{BitOrder, Transport};
use crate::Adf43xx;

/// Settle time after a soft reset
const RESET_DELAY: Duration = Duration::from_millis(10);

/// Bring-up milestones, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    BusConfigured,
    Reset,
    ChipIdentityVerified,
    ScratchpadVerified,
    DeviceIdVerified,
    Configured,
}

impl<'r, T: Transport> Adf43xx<'r, T> {
    /// Takes ownership of `transport`, binds the bus in `registry` and brings
    /// the chip up: soft reset, identity checks, then programming of the
    /// frequency and auxiliary controls from `param`.
    ///
    /// Parameters are fully validated before the bus is touched. If any later
    /// step fails, the transport is closed and the binding released before
    /// the error is returned.
    pub fn initialize(
        registry: &'r BusRegistry,
        mut transport: T,
        param: InitParam,
    ) -> Result<Self, Error<T::Error>> {
        param.validate()?;
        let reference = ReferencePath {
            ref_freq_hz: param.ref_freq_hz,
            doubler: param.ref_doubler,
            r_div: param.ref_div,
        };
        let solution = solve(param.variant, reference, param.freq_hz)?;

        let claim = registry
            .claim(param.bus.bus)
            .map_err(Error::ResourceConflict)?;
        transport.open(&param.bus)?;

        let mut device = Adf43xx {
            transport: Some(transport),
            claim: Some(claim),
            variant: param.variant,
            bus: param.bus,
            timeout: param.timeout,
            gpio: param.gpio,
            cp_current: param.cp_current,
            reference,
            frequency: 0,
            solution: None,
        };
        match device.bring_up(&param, &solution) {
            Ok(()) => Ok(device),
            Err(e) => {
                log::debug!("{}: bring-up failed: {:?}", param.variant.info().name, e);
                device.teardown();
                Err(e)
            }
        }
    }

    fn bring_up(&mut self, param: &InitParam, solution: &PllSolution) -> Result<(), Error<T::Error>> {
        let gpio = self.gpio;
        for line in gpio.iter() {
            self.transport()?.set_line(line, true)?;
        }
        self.stage(Stage::BusConfigured);

        self.reset(param)?;
        self.stage(Stage::Reset);

        self.verify()?;

        let map = self.variant.map();
        self.program(solution)?;
        self.frequency = param.freq_hz;
        self.write_field(map.muxout, param.muxout.into())?;
        self.write_field(map.cp_current, param.cp_current.into())?;
        self.write_field(map.clkout_amplitude, param.clkout_amplitude.into())?;
        if let Some(word) = param.bleed_word {
            self.write_word(map.bleed, word.into())?;
        }
        self.write_field(map.cmos_3v3, param.cmos_3v3 as u8)?;
        self.stage(Stage::Configured);
        Ok(())
    }

    fn reset(&mut self, param: &InitParam) -> Result<(), Error<T::Error>> {
        self.write(INTERFACE_CONFIG_A, SOFT_RESET)?;
        self.transport()?.delay(RESET_DELAY);

        let mut interface = 0;
        if param.spi_4wire {
            interface |= SDO_ACTIVE;
        }
        if param.bus.bit_order == BitOrder::LsbFirst {
            interface |= LSB_FIRST;
        }
        self.write(INTERFACE_CONFIG_A, interface)?;

        for &(addr, value) in self.variant.map().defaults {
            self.write(addr, value)?;
        }
        Ok(())
    }

    fn verify(&mut self) -> Result<(), Error<T::Error>> {
        let info = self.variant.info();

        let found = self.read(CHIP_TYPE)?;
        if found != info.chip_type {
            return Err(VerificationError::ChipType {
                expected: info.chip_type,
                found,
            }
            .into());
        }
        self.stage(Stage::ChipIdentityVerified);

        self.write(SCRATCHPAD, SCRATCHPAD_PATTERN)?;
        let found = self.read(SCRATCHPAD)?;
        if found != SCRATCHPAD_PATTERN {
            return Err(VerificationError::Scratchpad {
                written: SCRATCHPAD_PATTERN,
                found,
            }
            .into());
        }
        self.stage(Stage::ScratchpadVerified);

        let found = self.read_u16(PRODUCT_ID_L, PRODUCT_ID_H)?;
        if found != info.product_id {
            return Err(VerificationError::ProductId {
                expected: info.product_id,
                found,
            }
            .into());
        }
        self.stage(Stage::DeviceIdVerified);
        Ok(())
    }

    fn stage(&self, stage: Stage) {
        log::debug!(
            "{} on {:?}: {:?}",
            self.variant.info().name,
            self.bus.bus,
            stage
        );
    }

    pub(crate) fn read_u16(&mut self, low: u16, high: u16) -> Result<u16, Error<T::Error>> {
        let low = self.read(low)?;
        let high = self.read(high)?;
        Ok(u16::from_le_bytes([low, high]))
    }

    pub(crate) fn transport(&mut self) -> Result<&mut T, TransportError<T::Error>> {
        self.transport.as_mut().ok_or(TransportError::Released)
    }

    /// Deasserts the control lines, closes the transport and unbinds the bus.
    ///
    /// Calling it again is a no-op. Failures while closing are logged and
    /// otherwise ignored, so this always succeeds.
    pub fn remove(&mut self) -> Result<(), Error<T::Error>> {
        self.teardown();
        Ok(())
    }

    /// True once [`Adf43xx::remove`] has released the transport
    pub fn is_removed(&self) -> bool {
        self.transport.is_none()
    }

    fn teardown(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            let name = self.variant.info().name;
            for line in self.gpio.iter() {
                if let Err(e) = transport.set_line(line, false) {
                    log::warn!("{}: failed to release {:?}: {:?}", name, line, e);
                }
            }
            if let Err(e) = transport.close() {
                log::warn!("{}: failed to close {:?}: {:?}", name, self.bus.bus, e);
            }
            log::debug!("{}: released {:?}", name, self.bus.bus);
        }
        self.solution = None;
        self.claim = None;
    }
}

impl<T: Transport> Drop for Adf43xx<'_, T> {
    fn drop(&mut self) {
        self.teardown();
    }
}
