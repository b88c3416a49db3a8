//! Z80 register file.

use crate::decode::{Reg16, Reg8};

/// Complete register state, also used as the debugging snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Registers {
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,

    // Shadow bank, swapped in by EX AF,AF' and EXX.
    pub a_alt: u8,
    pub f_alt: u8,
    pub b_alt: u8,
    pub c_alt: u8,
    pub d_alt: u8,
    pub e_alt: u8,
    pub h_alt: u8,
    pub l_alt: u8,

    pub ix: u16,
    pub iy: u16,
    pub sp: u16,
    pub pc: u16,
    /// Interrupt vector base.
    pub i: u8,
    /// Memory refresh counter.
    pub r: u8,
    /// WZ/MEMPTR. Only visible through the X/Y flags of BIT n,(HL).
    pub wz: u16,

    pub iff1: bool,
    pub iff2: bool,
    pub im: u8,
    pub halted: bool,
}

const fn join(hi: u8, lo: u8) -> u16 {
    (hi as u16) << 8 | lo as u16
}

const fn split(value: u16) -> (u8, u8) {
    ((value >> 8) as u8, value as u8)
}

impl Registers {
    /// State after /RESET.
    #[must_use]
    pub const fn power_on() -> Self {
        Self {
            a: 0,
            f: 0,
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
            a_alt: 0,
            f_alt: 0,
            b_alt: 0,
            c_alt: 0,
            d_alt: 0,
            e_alt: 0,
            h_alt: 0,
            l_alt: 0,
            ix: 0,
            iy: 0,
            sp: 0xFFFF,
            pc: 0,
            i: 0,
            r: 0,
            wz: 0,
            iff1: false,
            iff2: false,
            im: 0,
            halted: false,
        }
    }

    #[must_use]
    pub const fn af(&self) -> u16 {
        join(self.a, self.f)
    }

    #[must_use]
    pub const fn bc(&self) -> u16 {
        join(self.b, self.c)
    }

    #[must_use]
    pub const fn de(&self) -> u16 {
        join(self.d, self.e)
    }

    #[must_use]
    pub const fn hl(&self) -> u16 {
        join(self.h, self.l)
    }

    #[must_use]
    pub const fn af_alt(&self) -> u16 {
        join(self.a_alt, self.f_alt)
    }

    #[must_use]
    pub const fn bc_alt(&self) -> u16 {
        join(self.b_alt, self.c_alt)
    }

    #[must_use]
    pub const fn de_alt(&self) -> u16 {
        join(self.d_alt, self.e_alt)
    }

    #[must_use]
    pub const fn hl_alt(&self) -> u16 {
        join(self.h_alt, self.l_alt)
    }

    pub fn set_af(&mut self, value: u16) {
        (self.a, self.f) = split(value);
    }

    pub fn set_bc(&mut self, value: u16) {
        (self.b, self.c) = split(value);
    }

    pub fn set_de(&mut self, value: u16) {
        (self.d, self.e) = split(value);
    }

    pub fn set_hl(&mut self, value: u16) {
        (self.h, self.l) = split(value);
    }

    #[must_use]
    pub fn reg8(&self, r: Reg8) -> u8 {
        match r {
            Reg8::A => self.a,
            Reg8::B => self.b,
            Reg8::C => self.c,
            Reg8::D => self.d,
            Reg8::E => self.e,
            Reg8::H => self.h,
            Reg8::L => self.l,
            Reg8::Ixh => (self.ix >> 8) as u8,
            Reg8::Ixl => self.ix as u8,
            Reg8::Iyh => (self.iy >> 8) as u8,
            Reg8::Iyl => self.iy as u8,
        }
    }

    pub fn set_reg8(&mut self, r: Reg8, value: u8) {
        match r {
            Reg8::A => self.a = value,
            Reg8::B => self.b = value,
            Reg8::C => self.c = value,
            Reg8::D => self.d = value,
            Reg8::E => self.e = value,
            Reg8::H => self.h = value,
            Reg8::L => self.l = value,
            Reg8::Ixh => self.ix = join(value, self.ix as u8),
            Reg8::Ixl => self.ix = join((self.ix >> 8) as u8, value),
            Reg8::Iyh => self.iy = join(value, self.iy as u8),
            Reg8::Iyl => self.iy = join((self.iy >> 8) as u8, value),
        }
    }

    #[must_use]
    pub fn reg16(&self, r: Reg16) -> u16 {
        match r {
            Reg16::AF => self.af(),
            Reg16::BC => self.bc(),
            Reg16::DE => self.de(),
            Reg16::HL => self.hl(),
            Reg16::SP => self.sp,
            Reg16::IX => self.ix,
            Reg16::IY => self.iy,
        }
    }

    pub fn set_reg16(&mut self, r: Reg16, value: u16) {
        match r {
            Reg16::AF => self.set_af(value),
            Reg16::BC => self.set_bc(value),
            Reg16::DE => self.set_de(value),
            Reg16::HL => self.set_hl(value),
            Reg16::SP => self.sp = value,
            Reg16::IX => self.ix = value,
            Reg16::IY => self.iy = value,
        }
    }

    /// EX AF,AF'
    pub fn exchange_af(&mut self) {
        std::mem::swap(&mut self.a, &mut self.a_alt);
        std::mem::swap(&mut self.f, &mut self.f_alt);
    }

    /// EXX: BC, DE and HL swap with their shadows as a unit.
    pub fn exchange_all(&mut self) {
        std::mem::swap(&mut self.b, &mut self.b_alt);
        std::mem::swap(&mut self.c, &mut self.c_alt);
        std::mem::swap(&mut self.d, &mut self.d_alt);
        std::mem::swap(&mut self.e, &mut self.e_alt);
        std::mem::swap(&mut self.h, &mut self.h_alt);
        std::mem::swap(&mut self.l, &mut self.l_alt);
    }

    /// Bump the refresh counter for one M1 cycle. Bit 7 only changes
    /// through LD R,A.
    pub fn inc_r(&mut self) {
        self.r = (self.r & 0x80) | (self.r.wrapping_add(1) & 0x7F);
    }

    #[must_use]
    pub const fn flag(&self, mask: u8) -> bool {
        self.f & mask != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_split_into_halves() {
        let mut regs = Registers::power_on();
        regs.set_bc(0x1234);
        assert_eq!((regs.b, regs.c), (0x12, 0x34));
        regs.set_reg8(Reg8::Ixh, 0xAB);
        regs.set_reg8(Reg8::Ixl, 0xCD);
        assert_eq!(regs.ix, 0xABCD);
        assert_eq!(regs.reg16(Reg16::IX), 0xABCD);
    }

    #[test]
    fn exx_leaves_af_alone() {
        let mut regs = Registers::power_on();
        regs.set_af(0x1111);
        regs.set_hl(0x2222);
        regs.exchange_all();
        assert_eq!(regs.af(), 0x1111);
        assert_eq!(regs.hl(), 0);
        assert_eq!(regs.hl_alt(), 0x2222);
    }

    #[test]
    fn refresh_keeps_bit_seven() {
        let mut regs = Registers::power_on();
        regs.r = 0xFF;
        regs.inc_r();
        assert_eq!(regs.r, 0x80);
    }
}
