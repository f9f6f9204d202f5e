use crate::error::{Error, ParameterError, TransportError};
use crate::registers::{split_word, Field, MAX_ADDRESS};
use crate::transport::{BitOrder, Transport};
use crate::Adf43xx;

#[repr(u8)]
#[derive(Debug, PartialEq, Clone, Copy)]
enum AccessMode {
    Write = 0,
    Read = 1,
}

impl<T: Transport> Adf43xx<'_, T> {
    fn operate(&mut self, addr: u16, data: u8, mode: AccessMode) -> Result<u8, Error<T::Error>> {
        let mut frame = pack(addr, data, mode, self.bus.bit_order)?;
        let timeout = self.timeout;
        let transport = self.transport.as_mut().ok_or(TransportError::Released)?;
        transport.transfer(&mut frame, timeout)?;
        let value = if mode == AccessMode::Read { frame[2] } else { data };
        log::trace!("{:?} {:#06x} = {:#04x}", mode, addr, value);
        Ok(value)
    }

    pub(crate) fn read(&mut self, addr: u16) -> Result<u8, Error<T::Error>> {
        self.operate(addr, 0, AccessMode::Read)
    }

    pub(crate) fn write(&mut self, addr: u16, value: u8) -> Result<(), Error<T::Error>> {
        self.operate(addr, value, AccessMode::Write)?;
        Ok(())
    }

    /// Read-modify-write. On error the register may hold either value.
    pub(crate) fn update_bits(
        &mut self,
        addr: u16,
        mask: u8,
        value: u8,
    ) -> Result<(), Error<T::Error>> {
        let current = self.read(addr)?;
        self.write(addr, merge(current, mask, value))
    }

    pub(crate) fn write_field(&mut self, field: Field, value: u8) -> Result<(), Error<T::Error>> {
        if field.is_full() {
            self.write(field.addr, value)
        } else {
            self.update_bits(field.addr, field.mask, field.encode(value))
        }
    }

    pub(crate) fn read_field(&mut self, field: Field) -> Result<u8, Error<T::Error>> {
        self.read(field.addr).map(|r| field.decode(r))
    }

    /// Writes a word spread over several registers, least significant register first
    pub(crate) fn write_word(&mut self, fields: &[Field], value: u32) -> Result<(), Error<T::Error>> {
        for (field, piece) in split_word(fields, value) {
            self.write_field(field, piece)?;
        }
        Ok(())
    }
}

/// Bits of `value` under `mask` replace those of `current`; the rest are kept
pub(crate) fn merge(current: u8, mask: u8, value: u8) -> u8 {
    (current & !mask) | (value & mask)
}

/// Zeroth index gets sent first. MSB first the frame is R/W, A14..A0, data.
/// LSB first the transport mirrors every byte, so the address bytes swap
/// places to put A0 on the wire first and R/W last.
fn pack(addr: u16, data: u8, mode: AccessMode, order: BitOrder) -> Result<[u8; 3], ParameterError> {
    if addr > MAX_ADDRESS {
        return Err(ParameterError::Address(addr));
    }
    let [high, low] = addr.to_be_bytes();
    let command = ((mode as u8) << 7) | high;
    Ok(match order {
        BitOrder::MsbFirst => [command, low, data],
        BitOrder::LsbFirst => [low, command, data],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{attached, MockError};
    use crate::variant::Variant;
    use proptest::prelude::*;

    #[test]
    fn access_mode() {
        assert_eq!(AccessMode::Write as u8, 0);
        assert_eq!(AccessMode::Read as u8, 1);
    }

    #[test]
    fn payload() {
        let msb = BitOrder::MsbFirst;
        assert_eq!(pack(0x0003, 0, AccessMode::Read, msb), Ok([0x80, 0x03, 0x00]));
        assert_eq!(pack(0x0000, 0x81, AccessMode::Write, msb), Ok([0x00, 0x00, 0x81]));
        assert_eq!(pack(0x7FFF, 0x5A, AccessMode::Write, msb), Ok([0x7F, 0xFF, 0x5A]));
        assert_eq!(
            pack(0x8000, 0, AccessMode::Read, msb),
            Err(ParameterError::Address(0x8000))
        );
    }

    #[test]
    fn lsb_first_payload() {
        let lsb = BitOrder::LsbFirst;
        // A0 leads and R/W trails once the transport mirrors each byte
        assert_eq!(pack(0x0003, 0, AccessMode::Read, lsb), Ok([0x03, 0x80, 0x00]));
        assert_eq!(pack(0x0123, 0x5A, AccessMode::Write, lsb), Ok([0x23, 0x01, 0x5A]));
        // The reset frame is the same either way
        assert_eq!(
            pack(0x0000, 0x81, AccessMode::Write, lsb),
            pack(0x0000, 0x81, AccessMode::Write, BitOrder::MsbFirst)
        );
    }

    #[test]
    fn muxout_nibble_scenario() {
        let (mut pll, sim) = attached(Variant::Adf4377);
        pll.write(0x1D, 0x00).unwrap();

        pll.update_bits(0x1D, 0xF0, 0x80).unwrap();
        assert_eq!(sim.chip().registers[0x1D], 0x80);

        pll.write(0x1D, 0x55).unwrap();
        assert_eq!(sim.chip().registers[0x1D], 0x55);

        pll.update_bits(0x1D, 0x0F, 0x02).unwrap();
        assert_eq!(sim.chip().registers[0x1D], 0x52);
    }

    #[test]
    fn update_bits_is_read_then_write() {
        let (mut pll, sim) = attached(Variant::Adf4382);
        sim.chip().registers[0x1E] = 0x3F;
        let before = sim.chip().transactions;

        pll.update_bits(0x1E, 0x40, 0xFF).unwrap();

        let chip = sim.chip();
        assert_eq!(chip.transactions - before, 2);
        assert_eq!(chip.writes.last(), Some(&(0x1E, 0x7F)));
    }

    #[test]
    fn failed_read_aborts_update() {
        let (mut pll, sim) = attached(Variant::Adf4377);
        sim.chip().timeout_on_read = Some(0x15);
        let writes = sim.chip().writes.len();

        let err = pll.update_bits(0x15, 0xF0, 0x30).unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(sim.chip().writes.len(), writes);
    }

    #[test]
    fn bus_errors_propagate() {
        let (mut pll, _sim) = attached(Variant::Adf4377);
        match pll.read(0x0100) {
            Err(Error::Bus(TransportError::Transfer(MockError::Address(0x0100)))) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn word_writes_preserve_neighbours() {
        let (mut pll, sim) = attached(Variant::Adf4377);
        // EN_AUTOCAL and the doubler share the N_INT MSB register
        sim.chip().registers[0x11] = 0xC0;
        pll.write_word(Variant::Adf4377.map().n_int, 0x0ABC).unwrap();
        let chip = sim.chip();
        assert_eq!(chip.registers[0x10], 0xBC);
        assert_eq!(chip.registers[0x11], 0xCA);
    }

    proptest! {
        #[test]
        fn write_read_round_trip(addr in 0x10u16..0x100, value: u8) {
            let (mut pll, _sim) = attached(Variant::Adf4382);
            pll.write(addr, value).unwrap();
            prop_assert_eq!(pll.read(addr).unwrap(), value);
        }

        #[test]
        fn update_bits_preserves_unmasked(
            addr in 0x10u16..0x100,
            prior: u8,
            mask: u8,
            value: u8,
        ) {
            let (mut pll, sim) = attached(Variant::Adf4377);
            pll.write(addr, prior).unwrap();
            pll.update_bits(addr, mask, value).unwrap();
            let after = sim.chip().registers[addr as usize];
            prop_assert_eq!(after, (prior & !mask) | (value & mask));
            prop_assert_eq!(after & !mask, prior & !mask);
        }
    }
}
