//! ALU operations for the Z80.
//!
//! Everything here is pure: operands (and the incoming flags where an
//! instruction preserves some of them) go in, a result and a complete flag
//! byte come out. Callers write both back.

use crate::decode::ShiftOp;
use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF, parity, sz53, sz53p, when};

/// Result of an 8-bit ALU operation with flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult {
    pub value: u8,
    pub flags: u8,
}

impl AluResult {
    const fn new(value: u8, flags: u8) -> Self {
        Self { value, flags }
    }
}

/// ADD / ADC.
#[must_use]
pub fn add8(a: u8, b: u8, carry: bool) -> AluResult {
    let c = u8::from(carry);
    let wide = u16::from(a) + u16::from(b) + u16::from(c);
    let result = wide as u8;
    let flags = sz53(result)
        | when((a & 0x0F) + (b & 0x0F) + c > 0x0F, HF)
        | when((a ^ result) & (b ^ result) & 0x80 != 0, PF)
        | when(wide > 0xFF, CF);
    AluResult::new(result, flags)
}

/// SUB / SBC / NEG.
#[must_use]
pub fn sub8(a: u8, b: u8, carry: bool) -> AluResult {
    let c = u8::from(carry);
    let result = a.wrapping_sub(b).wrapping_sub(c);
    let flags = sz53(result)
        | NF
        | when(u16::from(a & 0x0F) < u16::from(b & 0x0F) + u16::from(c), HF)
        | when((a ^ b) & (a ^ result) & 0x80 != 0, PF)
        | when(u16::from(a) < u16::from(b) + u16::from(c), CF);
    AluResult::new(result, flags)
}

/// CP: a subtraction whose X/Y flags come from the operand.
#[must_use]
pub fn cp8(a: u8, b: u8) -> AluResult {
    let diff = sub8(a, b, false);
    AluResult::new(a, (diff.flags & !(YF | XF)) | (b & (YF | XF)))
}

#[must_use]
pub fn and8(a: u8, b: u8) -> AluResult {
    let result = a & b;
    AluResult::new(result, sz53p(result) | HF)
}

#[must_use]
pub fn or8(a: u8, b: u8) -> AluResult {
    let result = a | b;
    AluResult::new(result, sz53p(result))
}

#[must_use]
pub fn xor8(a: u8, b: u8) -> AluResult {
    let result = a ^ b;
    AluResult::new(result, sz53p(result))
}

/// 8-bit INC. The caller keeps the old carry.
#[must_use]
pub fn inc8(a: u8) -> AluResult {
    let result = a.wrapping_add(1);
    let flags = sz53(result) | when(a & 0x0F == 0x0F, HF) | when(a == 0x7F, PF);
    AluResult::new(result, flags)
}

/// 8-bit DEC. The caller keeps the old carry.
#[must_use]
pub fn dec8(a: u8) -> AluResult {
    let result = a.wrapping_sub(1);
    let flags = sz53(result) | NF | when(a & 0x0F == 0, HF) | when(a == 0x80, PF);
    AluResult::new(result, flags)
}

/// CB-group rotate or shift. S, Z and parity come from the result.
#[must_use]
pub fn shift(op: ShiftOp, a: u8, carry: bool) -> AluResult {
    let (result, out) = match op {
        ShiftOp::Rlc => (a.rotate_left(1), a & 0x80 != 0),
        ShiftOp::Rrc => (a.rotate_right(1), a & 1 != 0),
        ShiftOp::Rl => ((a << 1) | u8::from(carry), a & 0x80 != 0),
        ShiftOp::Rr => ((a >> 1) | (u8::from(carry) << 7), a & 1 != 0),
        ShiftOp::Sla => (a << 1, a & 0x80 != 0),
        ShiftOp::Sra => ((a >> 1) | (a & 0x80), a & 1 != 0),
        ShiftOp::Sll => ((a << 1) | 1, a & 0x80 != 0),
        ShiftOp::Srl => (a >> 1, a & 1 != 0),
    };
    AluResult::new(result, sz53p(result) | when(out, CF))
}

/// Accumulator rotate (RLCA, RRCA, RLA, RRA). S, Z and P/V are kept from
/// `flags`; only C, H, N and the undocumented bits change.
#[must_use]
pub fn rotate_a(op: ShiftOp, a: u8, flags: u8) -> AluResult {
    let r = shift(op, a, flags & CF != 0);
    let flags = (flags & (SF | ZF | PF)) | (r.value & (YF | XF)) | (r.flags & CF);
    AluResult::new(r.value, flags)
}

/// BIT n. `xy` supplies the undocumented bits: the operand for registers,
/// the high byte of the effective address (or WZ) for memory forms.
/// The caller keeps the old carry.
#[must_use]
pub fn bit(n: u8, value: u8, xy: u8) -> u8 {
    let tested = value & (1 << n);
    let mut flags = HF | (xy & (YF | XF));
    if tested == 0 {
        flags |= ZF | PF;
    }
    if n == 7 && tested != 0 {
        flags |= SF;
    }
    flags
}

/// DAA, using N, H and C from `flags`.
#[must_use]
pub fn daa(a: u8, flags: u8) -> AluResult {
    let subtract = flags & NF != 0;
    let mut correction = 0;
    let mut carry = flags & CF != 0;
    if flags & HF != 0 || a & 0x0F > 9 {
        correction |= 0x06;
    }
    if carry || a > 0x99 {
        correction |= 0x60;
        carry = true;
    }
    let result = if subtract {
        a.wrapping_sub(correction)
    } else {
        a.wrapping_add(correction)
    };
    let half = if subtract {
        flags & HF != 0 && a & 0x0F < 6
    } else {
        a & 0x0F > 9
    };
    AluResult::new(
        result,
        sz53p(result) | when(half, HF) | when(subtract, NF) | when(carry, CF),
    )
}

/// CPL. C, S, Z and P/V are kept.
#[must_use]
pub fn cpl(a: u8, flags: u8) -> AluResult {
    let result = !a;
    AluResult::new(
        result,
        (flags & (SF | ZF | PF | CF)) | HF | NF | (result & (YF | XF)),
    )
}

/// SCF flags.
#[must_use]
pub fn scf(a: u8, flags: u8) -> u8 {
    (flags & (SF | ZF | PF)) | (a & (YF | XF)) | CF
}

/// CCF flags: H takes the old carry.
#[must_use]
pub fn ccf(a: u8, flags: u8) -> u8 {
    let old = flags & CF != 0;
    (flags & (SF | ZF | PF)) | (a & (YF | XF)) | when(old, HF) | when(!old, CF)
}

/// ADD HL/IX/IY,rr. Returns the result and the flags that change
/// (H, N, C, X/Y); S, Z and P/V are the caller's to keep.
#[must_use]
pub fn add16(a: u16, b: u16) -> (u16, u8) {
    let wide = u32::from(a) + u32::from(b);
    let result = wide as u16;
    let flags = ((result >> 8) as u8 & (YF | XF))
        | when((a & 0x0FFF) + (b & 0x0FFF) > 0x0FFF, HF)
        | when(wide > 0xFFFF, CF);
    (result, flags)
}

/// ADC HL,rr: every flag is computed over 16 bits.
#[must_use]
pub fn adc16(a: u16, b: u16, carry: bool) -> (u16, u8) {
    let c = u16::from(carry);
    let wide = u32::from(a) + u32::from(b) + u32::from(c);
    let result = wide as u16;
    let flags = high_flags(result)
        | when((a & 0x0FFF) + (b & 0x0FFF) + c > 0x0FFF, HF)
        | when((a ^ result) & (b ^ result) & 0x8000 != 0, PF)
        | when(wide > 0xFFFF, CF);
    (result, flags)
}

/// SBC HL,rr.
#[must_use]
pub fn sbc16(a: u16, b: u16, carry: bool) -> (u16, u8) {
    let c = u16::from(carry);
    let result = a.wrapping_sub(b).wrapping_sub(c);
    let flags = high_flags(result)
        | NF
        | when(u32::from(a & 0x0FFF) < u32::from(b & 0x0FFF) + u32::from(c), HF)
        | when((a ^ b) & (a ^ result) & 0x8000 != 0, PF)
        | when(u32::from(a) < u32::from(b) + u32::from(c), CF);
    (result, flags)
}

/// S and X/Y from the high byte, Z over all 16 bits.
fn high_flags(result: u16) -> u8 {
    ((result >> 8) as u8 & (SF | YF | XF)) | when(result == 0, ZF)
}

/// Flags shared by INI/IND/OUTI/OUTD and their repeats. `k` is the
/// transferred byte plus C+-1 (input) or plus L (output).
#[must_use]
pub fn block_io_flags(value: u8, b: u8, k: u16) -> u8 {
    sz53(b)
        | when(value & 0x80 != 0, NF)
        | when(k > 0xFF, HF | CF)
        | when(parity((k as u8 & 7) ^ b), PF)
}
