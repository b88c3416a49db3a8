//! Addressing-mode resolution.

use specbolt_core::IoBus;

use super::Z80;
use crate::decode::{Operand, Reg8};

/// Where a resolved 8-bit operand lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Location {
    Register(Reg8),
    Memory(u16),
    /// Already fetched from the instruction stream. Read-only.
    Immediate(u8),
}

impl<B: IoBus> Z80<B> {
    /// Resolve an operand, consuming any displacement, immediate or address
    /// bytes from the stream. Indexed operands latch their address in WZ.
    pub(super) fn resolve(&mut self, operand: Operand) -> Location {
        match operand {
            Operand::Reg(r) => Location::Register(r),
            Operand::Imm => Location::Immediate(self.fetch_byte()),
            Operand::Indirect(pair) => Location::Memory(self.regs.reg16(pair)),
            Operand::Indexed(index) => {
                let displacement = self.fetch_byte() as i8;
                let address = self
                    .regs
                    .reg16(index.pair())
                    .wrapping_add_signed(i16::from(displacement));
                self.regs.wz = address;
                Location::Memory(address)
            }
            Operand::Absolute => Location::Memory(self.fetch_word()),
        }
    }

    pub(super) fn load(&mut self, location: Location) -> u8 {
        match location {
            Location::Register(r) => self.regs.reg8(r),
            Location::Memory(address) => self.bus.read(address),
            Location::Immediate(value) => value,
        }
    }

    /// Write back a result. Immediates cannot be written; the decoder
    /// tables never produce that combination.
    pub(super) fn store(&mut self, location: Location, value: u8) {
        debug_assert!(
            !matches!(location, Location::Immediate(_)),
            "{}",
            crate::CpuError::InvalidAddressingCombination("store to immediate operand"),
        );
        match location {
            Location::Register(r) => self.regs.set_reg8(r, value),
            Location::Memory(address) => self.bus.write(address, value),
            Location::Immediate(_) => {}
        }
    }
}
