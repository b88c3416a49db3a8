//! Z80 flag register bits.

/// Sign (bit 7): copy of the result's top bit.
pub const SF: u8 = 0b1000_0000;

/// Zero (bit 6).
pub const ZF: u8 = 0b0100_0000;

/// Undocumented (bit 5): usually a copy of result bit 5.
pub const YF: u8 = 0b0010_0000;

/// Half-carry (bit 4): carry or borrow between bits 3 and 4.
pub const HF: u8 = 0b0001_0000;

/// Undocumented (bit 3): usually a copy of result bit 3.
pub const XF: u8 = 0b0000_1000;

/// Parity/Overflow (bit 2): parity for logic, signed overflow for arithmetic.
pub const PF: u8 = 0b0000_0100;

/// Add/Subtract (bit 1): set by subtractions, consumed by DAA.
pub const NF: u8 = 0b0000_0010;

/// Carry (bit 0).
pub const CF: u8 = 0b0000_0001;

/// True if the byte has an even number of set bits.
#[must_use]
pub const fn parity(value: u8) -> bool {
    value.count_ones() & 1 == 0
}

/// S, Z and the two undocumented bits for an 8-bit result.
#[must_use]
pub const fn sz53(value: u8) -> u8 {
    let mut f = value & (SF | YF | XF);
    if value == 0 {
        f |= ZF;
    }
    f
}

/// [`sz53`] plus parity in P/V.
#[must_use]
pub const fn sz53p(value: u8) -> u8 {
    if parity(value) {
        sz53(value) | PF
    } else {
        sz53(value)
    }
}

/// Flag bit for a condition.
#[must_use]
pub const fn when(condition: bool, flag: u8) -> u8 {
    if condition { flag } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sz53p_of_zero() {
        assert_eq!(sz53p(0), ZF | PF);
    }

    #[test]
    fn sz53_copies_undocumented_bits() {
        assert_eq!(sz53(0xA8), SF | YF | XF);
        assert_eq!(sz53p(0x01), 0);
    }
}
