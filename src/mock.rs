//! A simulated ADF43xx register file behind the `Transport` trait
use std::cell::{RefCell, RefMut};
use std::rc::Rc;
use std::vec::Vec;

use core::time::Duration;

use crate::config::{ChargePumpCurrent, InitParam};
use crate::error::TransportError;
use crate::frequency::ReferencePath;
use crate::registers::*;
use crate::transport::{BusConfig, GpioLine, GpioLines, Transport};
use crate::variant::Variant;
use crate::Adf43xx;

const SIZE: usize = 0x100;

#[derive(Debug, Clone, PartialEq)]
pub enum MockError {
    NoDevice,
    NotOpen,
    Address(u16),
    FrameLength(usize),
}

pub struct SimChip {
    pub registers: [u8; SIZE],
    power_on: [u8; SIZE],
    /// Transfers attempted, including failed ones
    pub transactions: usize,
    pub opens: usize,
    pub closes: usize,
    pub is_open: bool,
    pub resets: usize,
    pub writes: Vec<(u16, u8)>,
    pub lines: Vec<(GpioLine, bool)>,
    pub delays: Vec<Duration>,
    pub fail_open: bool,
    pub fail_close: bool,
    /// Writes to the scratchpad are lost, like a broken MOSI line
    pub stuck_scratchpad: bool,
    pub timeout_on_read: Option<u16>,
    /// Every transfer after this many fails
    pub fail_after: Option<usize>,
}

impl SimChip {
    fn new(variant: Variant) -> Self {
        let info = variant.info();
        let mut power_on = [0u8; SIZE];
        power_on[CHIP_TYPE as usize] = info.chip_type;
        power_on[PRODUCT_ID_L as usize] = info.product_id as u8;
        power_on[PRODUCT_ID_H as usize] = (info.product_id >> 8) as u8;
        power_on[VENDOR_ID_L as usize] = VENDOR_ID_ADI as u8;
        power_on[VENDOR_ID_H as usize] = (VENDOR_ID_ADI >> 8) as u8;
        SimChip {
            registers: power_on,
            power_on,
            transactions: 0,
            opens: 0,
            closes: 0,
            is_open: false,
            resets: 0,
            writes: Vec::new(),
            lines: Vec::new(),
            delays: Vec::new(),
            fail_open: false,
            fail_close: false,
            stuck_scratchpad: false,
            timeout_on_read: None,
            fail_after: None,
        }
    }

    /// Patches a read-only register so it survives soft resets
    pub fn set_identity(&mut self, addr: u16, value: u8) {
        self.power_on[addr as usize] = value;
        self.registers[addr as usize] = value;
    }

    pub fn lsb_first(&self) -> bool {
        self.registers[INTERFACE_CONFIG_A as usize] & LSB_FIRST == LSB_FIRST
    }

    fn read_only(addr: u16) -> bool {
        matches!(
            addr,
            CHIP_TYPE | PRODUCT_ID_L | PRODUCT_ID_H | VENDOR_ID_L | VENDOR_ID_H
        )
    }

    fn store(&mut self, addr: u16, value: u8) {
        self.writes.push((addr, value));
        if addr == INTERFACE_CONFIG_A && value & SOFT_RESET == SOFT_RESET {
            // Reset bits self-clear
            self.registers = self.power_on;
            self.resets += 1;
        } else if !(Self::read_only(addr) || (addr == SCRATCHPAD && self.stuck_scratchpad)) {
            self.registers[addr as usize] = value;
        }
    }

    /// Writes that landed on `addr`, oldest first
    pub fn writes_to(&self, addr: u16) -> Vec<u8> {
        self.writes
            .iter()
            .filter(|(a, _)| *a == addr)
            .map(|(_, v)| *v)
            .collect()
    }
}

#[derive(Clone)]
pub struct SimTransport {
    chip: Rc<RefCell<SimChip>>,
}

impl SimTransport {
    pub fn new(variant: Variant) -> Self {
        SimTransport {
            chip: Rc::new(RefCell::new(SimChip::new(variant))),
        }
    }

    pub fn chip(&self) -> RefMut<'_, SimChip> {
        self.chip.borrow_mut()
    }
}

impl Transport for SimTransport {
    type Error = MockError;

    fn open(&mut self, _config: &BusConfig) -> Result<(), TransportError<MockError>> {
        let mut chip = self.chip();
        if chip.fail_open {
            return Err(TransportError::Unavailable(MockError::NoDevice));
        }
        chip.opens += 1;
        chip.is_open = true;
        Ok(())
    }

    fn transfer(
        &mut self,
        frame: &mut [u8],
        _timeout: Option<Duration>,
    ) -> Result<(), TransportError<MockError>> {
        let mut chip = self.chip();
        chip.transactions += 1;
        if !chip.is_open {
            return Err(TransportError::Transfer(MockError::NotOpen));
        }
        if chip.fail_after.map_or(false, |n| chip.transactions > n) {
            return Err(TransportError::Timeout);
        }
        if frame.len() != 3 {
            return Err(TransportError::Transfer(MockError::FrameLength(frame.len())));
        }
        // Bit mirroring is the transport's job, so an LSB-first chip sees the
        // address bytes swapped
        let (command, low) = if chip.lsb_first() {
            (frame[1], frame[0])
        } else {
            (frame[0], frame[1])
        };
        let read = command & 0x80 != 0;
        let addr = u16::from_be_bytes([command & 0x7F, low]);
        if addr as usize >= SIZE {
            return Err(TransportError::Transfer(MockError::Address(addr)));
        }
        if read {
            if chip.timeout_on_read == Some(addr) {
                return Err(TransportError::Timeout);
            }
            frame[2] = chip.registers[addr as usize];
        } else {
            chip.store(addr, frame[2]);
            frame[2] = 0;
        }
        frame[0] = 0;
        frame[1] = 0;
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError<MockError>> {
        let mut chip = self.chip();
        chip.closes += 1;
        chip.is_open = false;
        if chip.fail_close {
            return Err(TransportError::Transfer(MockError::NoDevice));
        }
        Ok(())
    }

    fn set_line(&mut self, line: GpioLine, high: bool) -> Result<(), TransportError<MockError>> {
        self.chip().lines.push((line, high));
        Ok(())
    }

    fn delay(&mut self, duration: Duration) {
        self.chip().delays.push(duration);
    }
}

/// Configurations taken from the evaluation projects for each part
pub fn init_param(variant: Variant) -> InitParam {
    let bus = BusConfig::new(0, 0, 1_500_000);
    let mut param = match variant {
        Variant::Adf4377 => InitParam::new(variant, bus, 125_000_000, 10_000_000_000),
        Variant::Adf4382 => {
            let mut param = InitParam::new(variant, bus, 125_000_000, 20_000_000_000);
            param.bleed_word = Some(4903);
            param.cmos_3v3 = true;
            param
        }
        Variant::Adf4368 => InitParam::new(variant, bus, 100_000_000, 2_400_000_000),
    };
    param.ref_doubler = variant != Variant::Adf4368;
    param
}

/// A handle on an already open simulated chip, skipping bring-up
pub fn attached(variant: Variant) -> (Adf43xx<'static, SimTransport>, SimTransport) {
    let sim = SimTransport::new(variant);
    let param = init_param(variant);
    let mut transport = sim.clone();
    transport.open(&param.bus).unwrap();
    let pll = Adf43xx {
        transport: Some(transport),
        claim: None,
        variant,
        bus: param.bus,
        timeout: None,
        gpio: GpioLines::default(),
        cp_current: ChargePumpCurrent::Ma10_1,
        reference: ReferencePath {
            ref_freq_hz: param.ref_freq_hz,
            doubler: param.ref_doubler,
            r_div: param.ref_div,
        },
        frequency: 0,
        solution: None,
    };
    (pll, sim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock() {
        let mut sim = SimTransport::new(Variant::Adf4377);
        sim.open(&BusConfig::new(0, 0, 1_000_000)).unwrap();
        sim.transfer(&mut [0x00, 0x0A, 0x5A], None).unwrap();
        let mut read = [0x80, 0x0A, 0x00];
        sim.transfer(&mut read, None).unwrap();
        assert_eq!(read[2], 0x5A);

        sim.transfer(&mut [0x00, 0x00, 0x81], None).unwrap();
        let mut read = [0x80, 0x0A, 0x00];
        sim.transfer(&mut read, None).unwrap();
        assert_eq!(read[2], 0x00);

        let mut read = [0x80, 0x03, 0x00];
        sim.transfer(&mut read, None).unwrap();
        assert_eq!(read[2], 0x06);
    }
}
