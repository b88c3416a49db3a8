//! Instruction descriptors and the opcode lookup tables.
//!
//! Every opcode of every prefix group decodes to an immutable [`Instruction`]
//! built at compile time. The executor looks descriptors up by
//! (table, opcode) and never allocates.
//!
//! Cycle counts are totals for the whole instruction, prefixes included.
//! Conditional instructions carry a second count used when the branch is
//! taken (or the block instruction repeats).

use std::fmt;

/// 8-bit registers, including the undocumented index halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg8 {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
    Ixh,
    Ixl,
    Iyh,
    Iyl,
}

/// 16-bit register pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg16 {
    BC,
    DE,
    HL,
    SP,
    AF,
    IX,
    IY,
}

/// Index register selected by a DD or FD prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Index {
    IX,
    IY,
}

impl Index {
    #[must_use]
    pub const fn pair(self) -> Reg16 {
        match self {
            Index::IX => Reg16::IX,
            Index::IY => Reg16::IY,
        }
    }
}

/// Branch conditions, in encoding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    NZ,
    Z,
    NC,
    C,
    PO,
    PE,
    P,
    M,
}

/// Operand addressing mode for 8-bit operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// Register direct.
    Reg(Reg8),
    /// Byte following the opcode.
    Imm,
    /// Memory at the address held in a pair: (BC), (DE), (HL).
    Indirect(Reg16),
    /// Memory at IX/IY plus a signed displacement from the stream.
    Indexed(Index),
    /// Memory at a 16-bit address from the stream: (nn).
    Absolute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

/// CB-group rotates and shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOp {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    /// Undocumented: shift left, bit 0 set.
    Sll,
    Srl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Ld,
    Cp,
    In,
    Out,
}

/// ED block transfer, compare and I/O instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    /// HL (and DE) count down instead of up.
    pub decrement: bool,
    pub repeat: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    CB,
    DD,
    ED,
    FD,
}

/// Decoded operation with its operand addressing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Nop,
    Halt,
    Di,
    Ei,
    ExAf,
    Exx,
    ExDeHl,
    /// EX (SP),HL / IX / IY.
    ExSp(Reg16),
    Ld(Operand, Operand),
    LdImm16(Reg16),
    /// LD rr,(nn)
    LdLoad16(Reg16),
    /// LD (nn),rr
    LdStore16(Reg16),
    /// LD SP,HL / IX / IY.
    LdSp(Reg16),
    LdAI,
    LdAR,
    LdIA,
    LdRA,
    Push(Reg16),
    Pop(Reg16),
    Alu(AluOp, Operand),
    Inc(Operand),
    Dec(Operand),
    Inc16(Reg16),
    Dec16(Reg16),
    Add16(Reg16, Reg16),
    Adc16(Reg16),
    Sbc16(Reg16),
    Rlca,
    Rrca,
    Rla,
    Rra,
    Daa,
    Cpl,
    Scf,
    Ccf,
    Neg,
    Shift(ShiftOp, Operand),
    Bit(u8, Operand),
    Res(u8, Operand),
    Set(u8, Operand),
    /// DDCB/FDCB forms. The effective address is latched in WZ before
    /// dispatch; non-BIT forms also copy the result into a register.
    IndexedShift(ShiftOp, Option<Reg8>),
    IndexedBit(u8),
    IndexedRes(u8, Option<Reg8>),
    IndexedSet(u8, Option<Reg8>),
    Jp(Option<Condition>),
    /// JP (HL) / (IX) / (IY).
    JpInd(Reg16),
    Jr(Option<Condition>),
    Djnz,
    Call(Option<Condition>),
    Ret(Option<Condition>),
    Reti,
    Retn,
    Rst(u8),
    /// IN A,(n)
    InImm,
    /// OUT (n),A
    OutImm,
    /// IN r,(C); `None` only sets flags.
    In(Option<Reg8>),
    /// OUT (C),r; `None` writes zero.
    Out(Option<Reg8>),
    Im(u8),
    Rrd,
    Rld,
    Block(Block),
    Prefix(Prefix),
    /// ED hole. Runs as an 8 T-state no-op on real silicon.
    Undefined,
}

/// Immutable instruction descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub op: Op,
    /// Encoded length in bytes, prefixes included.
    pub len: u8,
    /// T-states, or the not-taken cost for conditional instructions.
    pub cycles: u8,
    /// T-states when the branch is taken or the block op repeats.
    pub taken: u8,
}

impl Instruction {
    const fn new(op: Op, len: u8, cycles: u8) -> Self {
        Self {
            op,
            len,
            cycles,
            taken: cycles,
        }
    }

    const fn branch(op: Op, len: u8, not_taken: u8, taken: u8) -> Self {
        Self {
            op,
            len,
            cycles: not_taken,
            taken,
        }
    }

    /// Cycle cost given whether the branch was taken.
    #[must_use]
    pub const fn cost(&self, taken: bool) -> u32 {
        if taken {
            self.taken as u32
        } else {
            self.cycles as u32
        }
    }
}

/// Lookup table selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Base,
    Cb,
    Ed,
    Dd,
    Fd,
    /// Shared by DDCB and FDCB; the address is resolved before lookup.
    IndexedCb,
}

/// O(1) descriptor lookup.
#[must_use]
pub fn lookup(table: Table, opcode: u8) -> Instruction {
    let i = usize::from(opcode);
    match table {
        Table::Base => BASE[i],
        Table::Cb => CB[i],
        Table::Ed => ED[i],
        Table::Dd => DD[i],
        Table::Fd => FD[i],
        Table::IndexedCb => INDEXED_CB[i],
    }
}

pub(crate) static BASE: [Instruction; 256] = build(Table::Base);
pub(crate) static CB: [Instruction; 256] = build(Table::Cb);
pub(crate) static ED: [Instruction; 256] = build(Table::Ed);
pub(crate) static DD: [Instruction; 256] = build(Table::Dd);
pub(crate) static FD: [Instruction; 256] = build(Table::Fd);
pub(crate) static INDEXED_CB: [Instruction; 256] = build(Table::IndexedCb);

const fn build(table: Table) -> [Instruction; 256] {
    let mut out = [Instruction::new(Op::Nop, 1, 4); 256];
    let mut i = 0;
    while i < 256 {
        let opcode = i as u8;
        out[i] = match table {
            Table::Base => base(opcode),
            Table::Cb => cb(opcode),
            Table::Ed => ed(opcode),
            Table::Dd => indexed(opcode, Index::IX),
            Table::Fd => indexed(opcode, Index::IY),
            Table::IndexedCb => indexed_cb(opcode),
        };
        i += 1;
    }
    out
}

const fn reg(code: u8) -> Reg8 {
    match code & 7 {
        0 => Reg8::B,
        1 => Reg8::C,
        2 => Reg8::D,
        3 => Reg8::E,
        4 => Reg8::H,
        5 => Reg8::L,
        _ => Reg8::A,
    }
}

/// r[code] with 6 meaning (HL).
const fn operand(code: u8) -> Operand {
    if code & 7 == 6 {
        Operand::Indirect(Reg16::HL)
    } else {
        Operand::Reg(reg(code))
    }
}

const fn pair(p: u8) -> Reg16 {
    match p & 3 {
        0 => Reg16::BC,
        1 => Reg16::DE,
        2 => Reg16::HL,
        _ => Reg16::SP,
    }
}

/// Pair table used by PUSH and POP: AF replaces SP.
const fn stack_pair(p: u8) -> Reg16 {
    match p & 3 {
        3 => Reg16::AF,
        other => pair(other),
    }
}

const fn condition(code: u8) -> Condition {
    match code & 7 {
        0 => Condition::NZ,
        1 => Condition::Z,
        2 => Condition::NC,
        3 => Condition::C,
        4 => Condition::PO,
        5 => Condition::PE,
        6 => Condition::P,
        _ => Condition::M,
    }
}

const fn alu_op(code: u8) -> AluOp {
    match code & 7 {
        0 => AluOp::Add,
        1 => AluOp::Adc,
        2 => AluOp::Sub,
        3 => AluOp::Sbc,
        4 => AluOp::And,
        5 => AluOp::Xor,
        6 => AluOp::Or,
        _ => AluOp::Cp,
    }
}

const fn shift_op(code: u8) -> ShiftOp {
    match code & 7 {
        0 => ShiftOp::Rlc,
        1 => ShiftOp::Rrc,
        2 => ShiftOp::Rl,
        3 => ShiftOp::Rr,
        4 => ShiftOp::Sla,
        5 => ShiftOp::Sra,
        6 => ShiftOp::Sll,
        _ => ShiftOp::Srl,
    }
}

/// Instructions addressing (HL) pay for the extra memory cycle.
const fn mem_cost(code: u8, fast: u8, slow: u8) -> u8 {
    if code == 6 { slow } else { fast }
}

const fn base(opcode: u8) -> Instruction {
    let x = opcode >> 6;
    let y = (opcode >> 3) & 7;
    let z = opcode & 7;
    let p = y >> 1;
    let q = y & 1;
    match x {
        0 => match z {
            0 => match y {
                0 => Instruction::new(Op::Nop, 1, 4),
                1 => Instruction::new(Op::ExAf, 1, 4),
                2 => Instruction::branch(Op::Djnz, 2, 8, 13),
                3 => Instruction::new(Op::Jr(None), 2, 12),
                _ => Instruction::branch(Op::Jr(Some(condition(y - 4))), 2, 7, 12),
            },
            1 => {
                if q == 0 {
                    Instruction::new(Op::LdImm16(pair(p)), 3, 10)
                } else {
                    Instruction::new(Op::Add16(Reg16::HL, pair(p)), 1, 11)
                }
            }
            2 => {
                let a = Operand::Reg(Reg8::A);
                match (q, p) {
                    (0, 0) => Instruction::new(Op::Ld(Operand::Indirect(Reg16::BC), a), 1, 7),
                    (0, 1) => Instruction::new(Op::Ld(Operand::Indirect(Reg16::DE), a), 1, 7),
                    (0, 2) => Instruction::new(Op::LdStore16(Reg16::HL), 3, 16),
                    (0, _) => Instruction::new(Op::Ld(Operand::Absolute, a), 3, 13),
                    (_, 0) => Instruction::new(Op::Ld(a, Operand::Indirect(Reg16::BC)), 1, 7),
                    (_, 1) => Instruction::new(Op::Ld(a, Operand::Indirect(Reg16::DE)), 1, 7),
                    (_, 2) => Instruction::new(Op::LdLoad16(Reg16::HL), 3, 16),
                    (_, _) => Instruction::new(Op::Ld(a, Operand::Absolute), 3, 13),
                }
            }
            3 => {
                if q == 0 {
                    Instruction::new(Op::Inc16(pair(p)), 1, 6)
                } else {
                    Instruction::new(Op::Dec16(pair(p)), 1, 6)
                }
            }
            4 => Instruction::new(Op::Inc(operand(y)), 1, mem_cost(y, 4, 11)),
            5 => Instruction::new(Op::Dec(operand(y)), 1, mem_cost(y, 4, 11)),
            6 => Instruction::new(Op::Ld(operand(y), Operand::Imm), 2, mem_cost(y, 7, 10)),
            _ => {
                let op = match y {
                    0 => Op::Rlca,
                    1 => Op::Rrca,
                    2 => Op::Rla,
                    3 => Op::Rra,
                    4 => Op::Daa,
                    5 => Op::Cpl,
                    6 => Op::Scf,
                    _ => Op::Ccf,
                };
                Instruction::new(op, 1, 4)
            }
        },
        1 => {
            if y == 6 && z == 6 {
                Instruction::new(Op::Halt, 1, 4)
            } else {
                let cycles = if y == 6 || z == 6 { 7 } else { 4 };
                Instruction::new(Op::Ld(operand(y), operand(z)), 1, cycles)
            }
        }
        2 => Instruction::new(Op::Alu(alu_op(y), operand(z)), 1, mem_cost(z, 4, 7)),
        _ => match z {
            0 => Instruction::branch(Op::Ret(Some(condition(y))), 1, 5, 11),
            1 => match (q, p) {
                (0, _) => Instruction::new(Op::Pop(stack_pair(p)), 1, 10),
                (_, 0) => Instruction::new(Op::Ret(None), 1, 10),
                (_, 1) => Instruction::new(Op::Exx, 1, 4),
                (_, 2) => Instruction::new(Op::JpInd(Reg16::HL), 1, 4),
                (_, _) => Instruction::new(Op::LdSp(Reg16::HL), 1, 6),
            },
            2 => Instruction::new(Op::Jp(Some(condition(y))), 3, 10),
            3 => match y {
                0 => Instruction::new(Op::Jp(None), 3, 10),
                1 => Instruction::new(Op::Prefix(Prefix::CB), 1, 4),
                2 => Instruction::new(Op::OutImm, 2, 11),
                3 => Instruction::new(Op::InImm, 2, 11),
                4 => Instruction::new(Op::ExSp(Reg16::HL), 1, 19),
                5 => Instruction::new(Op::ExDeHl, 1, 4),
                6 => Instruction::new(Op::Di, 1, 4),
                _ => Instruction::new(Op::Ei, 1, 4),
            },
            4 => Instruction::branch(Op::Call(Some(condition(y))), 3, 10, 17),
            5 => match (q, p) {
                (0, _) => Instruction::new(Op::Push(stack_pair(p)), 1, 11),
                (_, 0) => Instruction::new(Op::Call(None), 3, 17),
                (_, 1) => Instruction::new(Op::Prefix(Prefix::DD), 1, 4),
                (_, 2) => Instruction::new(Op::Prefix(Prefix::ED), 1, 4),
                (_, _) => Instruction::new(Op::Prefix(Prefix::FD), 1, 4),
            },
            6 => Instruction::new(Op::Alu(alu_op(y), Operand::Imm), 2, 7),
            _ => Instruction::new(Op::Rst(y * 8), 1, 11),
        },
    }
}

const fn cb(opcode: u8) -> Instruction {
    let y = (opcode >> 3) & 7;
    let z = opcode & 7;
    let target = operand(z);
    let (op, fast, slow) = match opcode >> 6 {
        0 => (Op::Shift(shift_op(y), target), 8, 15),
        1 => (Op::Bit(y, target), 8, 12),
        2 => (Op::Res(y, target), 8, 15),
        _ => (Op::Set(y, target), 8, 15),
    };
    Instruction::new(op, 2, if z == 6 { slow } else { fast })
}

const fn indexed_cb(opcode: u8) -> Instruction {
    let y = (opcode >> 3) & 7;
    let z = opcode & 7;
    let copy = if z == 6 { None } else { Some(reg(z)) };
    match opcode >> 6 {
        0 => Instruction::new(Op::IndexedShift(shift_op(y), copy), 4, 23),
        1 => Instruction::new(Op::IndexedBit(y), 4, 20),
        2 => Instruction::new(Op::IndexedRes(y, copy), 4, 23),
        _ => Instruction::new(Op::IndexedSet(y, copy), 4, 23),
    }
}

const fn ed(opcode: u8) -> Instruction {
    let x = opcode >> 6;
    let y = (opcode >> 3) & 7;
    let z = opcode & 7;
    let p = y >> 1;
    let q = y & 1;
    let io_reg = if y == 6 { None } else { Some(reg(y)) };

    match x {
        1 => match z {
            0 => Instruction::new(Op::In(io_reg), 2, 12),
            1 => Instruction::new(Op::Out(io_reg), 2, 12),
            2 => {
                if q == 0 {
                    Instruction::new(Op::Sbc16(pair(p)), 2, 15)
                } else {
                    Instruction::new(Op::Adc16(pair(p)), 2, 15)
                }
            }
            3 => {
                if q == 0 {
                    Instruction::new(Op::LdStore16(pair(p)), 4, 20)
                } else {
                    Instruction::new(Op::LdLoad16(pair(p)), 4, 20)
                }
            }
            4 => Instruction::new(Op::Neg, 2, 8),
            5 => {
                if y == 1 {
                    Instruction::new(Op::Reti, 2, 14)
                } else {
                    Instruction::new(Op::Retn, 2, 14)
                }
            }
            6 => {
                let mode = match y & 3 {
                    0 | 1 => 0,
                    2 => 1,
                    _ => 2,
                };
                Instruction::new(Op::Im(mode), 2, 8)
            }
            _ => match y {
                0 => Instruction::new(Op::LdIA, 2, 9),
                1 => Instruction::new(Op::LdRA, 2, 9),
                2 => Instruction::new(Op::LdAI, 2, 9),
                3 => Instruction::new(Op::LdAR, 2, 9),
                4 => Instruction::new(Op::Rrd, 2, 18),
                5 => Instruction::new(Op::Rld, 2, 18),
                _ => Instruction::new(Op::Undefined, 2, 8),
            },
        },
        2 if z <= 3 && y >= 4 => {
            let kind = match z {
                0 => BlockKind::Ld,
                1 => BlockKind::Cp,
                2 => BlockKind::In,
                _ => BlockKind::Out,
            };
            let block = Block {
                kind,
                decrement: y & 1 == 1,
                repeat: y >= 6,
            };
            if block.repeat {
                Instruction::branch(Op::Block(block), 2, 16, 21)
            } else {
                Instruction::new(Op::Block(block), 2, 16)
            }
        }
        _ => Instruction::new(Op::Undefined, 2, 8),
    }
}

const fn index_reg16(r: Reg16, index: Index) -> Reg16 {
    match r {
        Reg16::HL => index.pair(),
        other => other,
    }
}

/// Rewrite an unprefixed operand for a DD/FD prefix. `keep_hl` is set when
/// the same instruction also addresses (IX+d): H and L then stay real.
const fn index_operand(o: Operand, index: Index, keep_hl: bool) -> Operand {
    match o {
        Operand::Indirect(Reg16::HL) => Operand::Indexed(index),
        Operand::Reg(Reg8::H) if !keep_hl => Operand::Reg(match index {
            Index::IX => Reg8::Ixh,
            Index::IY => Reg8::Iyh,
        }),
        Operand::Reg(Reg8::L) if !keep_hl => Operand::Reg(match index {
            Index::IX => Reg8::Ixl,
            Index::IY => Reg8::Iyl,
        }),
        other => other,
    }
}

/// DD/FD table entry: the unprefixed instruction with HL replaced by the
/// index register. Opcodes that never touch HL run unchanged after the
/// 4 T-state prefix fetch.
const fn indexed(opcode: u8, index: Index) -> Instruction {
    let plain = base(opcode);
    if matches!(plain.op, Op::Prefix(_)) {
        return plain;
    }

    let mut displaced = false;
    let op = match plain.op {
        Op::Ld(dst, src) => {
            let mem = matches!(dst, Operand::Indirect(Reg16::HL))
                || matches!(src, Operand::Indirect(Reg16::HL));
            displaced = mem;
            Op::Ld(
                index_operand(dst, index, mem),
                index_operand(src, index, mem),
            )
        }
        Op::Alu(alu, o) => {
            displaced = matches!(o, Operand::Indirect(Reg16::HL));
            Op::Alu(alu, index_operand(o, index, false))
        }
        Op::Inc(o) => {
            displaced = matches!(o, Operand::Indirect(Reg16::HL));
            Op::Inc(index_operand(o, index, false))
        }
        Op::Dec(o) => {
            displaced = matches!(o, Operand::Indirect(Reg16::HL));
            Op::Dec(index_operand(o, index, false))
        }
        Op::LdImm16(r) => Op::LdImm16(index_reg16(r, index)),
        Op::LdLoad16(r) => Op::LdLoad16(index_reg16(r, index)),
        Op::LdStore16(r) => Op::LdStore16(index_reg16(r, index)),
        Op::Inc16(r) => Op::Inc16(index_reg16(r, index)),
        Op::Dec16(r) => Op::Dec16(index_reg16(r, index)),
        Op::Add16(dst, src) => Op::Add16(index_reg16(dst, index), index_reg16(src, index)),
        Op::Push(r) => Op::Push(index_reg16(r, index)),
        Op::Pop(r) => Op::Pop(index_reg16(r, index)),
        Op::JpInd(r) => Op::JpInd(index_reg16(r, index)),
        Op::LdSp(r) => Op::LdSp(index_reg16(r, index)),
        Op::ExSp(r) => Op::ExSp(index_reg16(r, index)),
        other => other,
    };

    let mut cycles = plain.cycles + 4;
    let mut taken = plain.taken + 4;
    let mut len = plain.len + 1;
    if displaced {
        // LD (IX+d),n overlaps the displacement add with the operand read.
        let extra = if matches!(op, Op::Ld(Operand::Indexed(_), Operand::Imm)) {
            5
        } else {
            8
        };
        cycles += extra;
        taken += extra;
        len += 1;
    }

    Instruction {
        op,
        len,
        cycles,
        taken,
    }
}

impl fmt::Display for Reg8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Reg8::A => "A",
            Reg8::B => "B",
            Reg8::C => "C",
            Reg8::D => "D",
            Reg8::E => "E",
            Reg8::H => "H",
            Reg8::L => "L",
            Reg8::Ixh => "IXH",
            Reg8::Ixl => "IXL",
            Reg8::Iyh => "IYH",
            Reg8::Iyl => "IYL",
        })
    }
}

impl fmt::Display for Reg16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Reg16::BC => "BC",
            Reg16::DE => "DE",
            Reg16::HL => "HL",
            Reg16::SP => "SP",
            Reg16::AF => "AF",
            Reg16::IX => "IX",
            Reg16::IY => "IY",
        })
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Condition::NZ => "NZ",
            Condition::Z => "Z",
            Condition::NC => "NC",
            Condition::C => "C",
            Condition::PO => "PO",
            Condition::PE => "PE",
            Condition::P => "P",
            Condition::M => "M",
        })
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(r) => write!(f, "{r}"),
            Operand::Imm => f.write_str("n"),
            Operand::Indirect(r) => write!(f, "({r})"),
            Operand::Indexed(i) => write!(f, "({}+d)", i.pair()),
            Operand::Absolute => f.write_str("(nn)"),
        }
    }
}

impl fmt::Display for ShiftOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShiftOp::Rlc => "RLC",
            ShiftOp::Rrc => "RRC",
            ShiftOp::Rl => "RL",
            ShiftOp::Rr => "RR",
            ShiftOp::Sla => "SLA",
            ShiftOp::Sra => "SRA",
            ShiftOp::Sll => "SLL",
            ShiftOp::Srl => "SRL",
        })
    }
}

fn with_condition(f: &mut fmt::Formatter<'_>, name: &str, cc: Option<Condition>, tail: &str) -> fmt::Result {
    match (cc, tail.is_empty()) {
        (Some(cc), true) => write!(f, "{name} {cc}"),
        (Some(cc), false) => write!(f, "{name} {cc},{tail}"),
        (None, true) => f.write_str(name),
        (None, false) => write!(f, "{name} {tail}"),
    }
}

fn with_copy(f: &mut fmt::Formatter<'_>, text: fmt::Arguments<'_>, copy: Option<Reg8>) -> fmt::Result {
    match copy {
        Some(r) => write!(f, "{text},{r}"),
        None => write!(f, "{text}"),
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Op::Nop => f.write_str("NOP"),
            Op::Halt => f.write_str("HALT"),
            Op::Di => f.write_str("DI"),
            Op::Ei => f.write_str("EI"),
            Op::ExAf => f.write_str("EX AF,AF'"),
            Op::Exx => f.write_str("EXX"),
            Op::ExDeHl => f.write_str("EX DE,HL"),
            Op::ExSp(r) => write!(f, "EX (SP),{r}"),
            Op::Ld(dst, src) => write!(f, "LD {dst},{src}"),
            Op::LdImm16(r) => write!(f, "LD {r},nn"),
            Op::LdLoad16(r) => write!(f, "LD {r},(nn)"),
            Op::LdStore16(r) => write!(f, "LD (nn),{r}"),
            Op::LdSp(r) => write!(f, "LD SP,{r}"),
            Op::LdAI => f.write_str("LD A,I"),
            Op::LdAR => f.write_str("LD A,R"),
            Op::LdIA => f.write_str("LD I,A"),
            Op::LdRA => f.write_str("LD R,A"),
            Op::Push(r) => write!(f, "PUSH {r}"),
            Op::Pop(r) => write!(f, "POP {r}"),
            Op::Alu(op, o) => match op {
                AluOp::Add => write!(f, "ADD A,{o}"),
                AluOp::Adc => write!(f, "ADC A,{o}"),
                AluOp::Sub => write!(f, "SUB {o}"),
                AluOp::Sbc => write!(f, "SBC A,{o}"),
                AluOp::And => write!(f, "AND {o}"),
                AluOp::Xor => write!(f, "XOR {o}"),
                AluOp::Or => write!(f, "OR {o}"),
                AluOp::Cp => write!(f, "CP {o}"),
            },
            Op::Inc(o) => write!(f, "INC {o}"),
            Op::Dec(o) => write!(f, "DEC {o}"),
            Op::Inc16(r) => write!(f, "INC {r}"),
            Op::Dec16(r) => write!(f, "DEC {r}"),
            Op::Add16(dst, src) => write!(f, "ADD {dst},{src}"),
            Op::Adc16(r) => write!(f, "ADC HL,{r}"),
            Op::Sbc16(r) => write!(f, "SBC HL,{r}"),
            Op::Rlca => f.write_str("RLCA"),
            Op::Rrca => f.write_str("RRCA"),
            Op::Rla => f.write_str("RLA"),
            Op::Rra => f.write_str("RRA"),
            Op::Daa => f.write_str("DAA"),
            Op::Cpl => f.write_str("CPL"),
            Op::Scf => f.write_str("SCF"),
            Op::Ccf => f.write_str("CCF"),
            Op::Neg => f.write_str("NEG"),
            Op::Shift(op, o) => write!(f, "{op} {o}"),
            Op::Bit(b, o) => write!(f, "BIT {b},{o}"),
            Op::Res(b, o) => write!(f, "RES {b},{o}"),
            Op::Set(b, o) => write!(f, "SET {b},{o}"),
            Op::IndexedShift(op, copy) => with_copy(f, format_args!("{op} (XY+d)"), copy),
            Op::IndexedBit(b) => write!(f, "BIT {b},(XY+d)"),
            Op::IndexedRes(b, copy) => with_copy(f, format_args!("RES {b},(XY+d)"), copy),
            Op::IndexedSet(b, copy) => with_copy(f, format_args!("SET {b},(XY+d)"), copy),
            Op::Jp(cc) => with_condition(f, "JP", cc, "nn"),
            Op::JpInd(r) => write!(f, "JP ({r})"),
            Op::Jr(cc) => with_condition(f, "JR", cc, "e"),
            Op::Djnz => f.write_str("DJNZ e"),
            Op::Call(cc) => with_condition(f, "CALL", cc, "nn"),
            Op::Ret(cc) => with_condition(f, "RET", cc, ""),
            Op::Reti => f.write_str("RETI"),
            Op::Retn => f.write_str("RETN"),
            Op::Rst(n) => write!(f, "RST {n:02X}H"),
            Op::InImm => f.write_str("IN A,(n)"),
            Op::OutImm => f.write_str("OUT (n),A"),
            Op::In(Some(r)) => write!(f, "IN {r},(C)"),
            Op::In(None) => f.write_str("IN (C)"),
            Op::Out(Some(r)) => write!(f, "OUT (C),{r}"),
            Op::Out(None) => f.write_str("OUT (C),0"),
            Op::Im(m) => write!(f, "IM {m}"),
            Op::Rrd => f.write_str("RRD"),
            Op::Rld => f.write_str("RLD"),
            Op::Block(b) => {
                let stem = match b.kind {
                    BlockKind::Ld => "LD",
                    BlockKind::Cp => "CP",
                    BlockKind::In => "IN",
                    BlockKind::Out if b.repeat => "OT",
                    BlockKind::Out => "OUT",
                };
                let dir = if b.decrement { "D" } else { "I" };
                let rep = if b.repeat { "R" } else { "" };
                write!(f, "{stem}{dir}{rep}")
            }
            Op::Prefix(p) => write!(f, "prefix {p:?}"),
            Op::Undefined => f.write_str("NOP*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_timings() {
        assert_eq!(lookup(Table::Base, 0x00).cycles, 4);
        assert_eq!(lookup(Table::Base, 0x01).cycles, 10);
        assert_eq!(lookup(Table::Base, 0x03).cycles, 6);
        assert_eq!(lookup(Table::Base, 0x09).cycles, 11);
        assert_eq!(lookup(Table::Base, 0x18).cycles, 12);
        assert_eq!(lookup(Table::Base, 0x34).cycles, 11);
        assert_eq!(lookup(Table::Base, 0x36).cycles, 10);
        assert_eq!(lookup(Table::Base, 0x7E).cycles, 7);
        assert_eq!(lookup(Table::Base, 0xE3).cycles, 19);
        assert_eq!(lookup(Table::Base, 0xFF).cycles, 11);
    }

    #[test]
    fn conditional_costs() {
        let jr_nz = lookup(Table::Base, 0x20);
        assert_eq!((jr_nz.cycles, jr_nz.taken), (7, 12));
        let djnz = lookup(Table::Base, 0x10);
        assert_eq!((djnz.cycles, djnz.taken), (8, 13));
        let call_z = lookup(Table::Base, 0xCC);
        assert_eq!((call_z.cycles, call_z.taken), (10, 17));
        let ret_c = lookup(Table::Base, 0xD8);
        assert_eq!((ret_c.cycles, ret_c.taken), (5, 11));
        let ldir = lookup(Table::Ed, 0xB0);
        assert_eq!((ldir.cycles, ldir.taken), (16, 21));
    }

    #[test]
    fn halt_replaces_ld_hl_hl() {
        assert_eq!(lookup(Table::Base, 0x76).op, Op::Halt);
        assert_eq!(lookup(Table::Dd, 0x76).op, Op::Halt);
    }

    #[test]
    fn indexed_memory_keeps_real_h_and_l() {
        let ld = lookup(Table::Dd, 0x66);
        assert_eq!(
            ld.op,
            Op::Ld(Operand::Reg(Reg8::H), Operand::Indexed(Index::IX))
        );
        assert_eq!((ld.len, ld.cycles), (3, 19));

        let ld = lookup(Table::Fd, 0x74);
        assert_eq!(
            ld.op,
            Op::Ld(Operand::Indexed(Index::IY), Operand::Reg(Reg8::H))
        );
    }

    #[test]
    fn indexed_register_forms_use_halves() {
        let ld = lookup(Table::Dd, 0x65);
        assert_eq!(
            ld.op,
            Op::Ld(Operand::Reg(Reg8::Ixh), Operand::Reg(Reg8::Ixl))
        );
        assert_eq!(ld.cycles, 8);
        assert_eq!(
            lookup(Table::Fd, 0x29).op,
            Op::Add16(Reg16::IY, Reg16::IY)
        );
        assert_eq!(lookup(Table::Fd, 0x29).cycles, 15);
    }

    #[test]
    fn indexed_timings() {
        assert_eq!(lookup(Table::Dd, 0x21).cycles, 14);
        assert_eq!(lookup(Table::Dd, 0x22).cycles, 20);
        assert_eq!(lookup(Table::Dd, 0x34).cycles, 23);
        let ld = lookup(Table::Dd, 0x36);
        assert_eq!((ld.len, ld.cycles), (4, 19));
        assert_eq!(lookup(Table::Dd, 0x86).cycles, 19);
        assert_eq!(lookup(Table::Dd, 0xE1).cycles, 14);
        assert_eq!(lookup(Table::Dd, 0xE5).cycles, 15);
        assert_eq!(lookup(Table::Dd, 0xE9).cycles, 8);
        assert_eq!(lookup(Table::Dd, 0xE3).cycles, 23);
        assert_eq!(lookup(Table::Dd, 0xF9).cycles, 10);
    }

    #[test]
    fn unrelated_opcodes_pass_through_index_prefix() {
        let ex = lookup(Table::Dd, 0xEB);
        assert_eq!(ex.op, Op::ExDeHl);
        assert_eq!((ex.len, ex.cycles), (2, 8));
        let ld = lookup(Table::Dd, 0x01);
        assert_eq!(ld.op, Op::LdImm16(Reg16::BC));
        assert_eq!(ld.cycles, 14);
    }

    #[test]
    fn cb_group() {
        assert_eq!(lookup(Table::Cb, 0x00).op, Op::Shift(ShiftOp::Rlc, Operand::Reg(Reg8::B)));
        assert_eq!(lookup(Table::Cb, 0x36).op, Op::Shift(ShiftOp::Sll, Operand::Indirect(Reg16::HL)));
        assert_eq!(lookup(Table::Cb, 0x46).cycles, 12);
        assert_eq!(lookup(Table::Cb, 0xC6).cycles, 15);
        assert_eq!(lookup(Table::Cb, 0xFF).op, Op::Set(7, Operand::Reg(Reg8::A)));
    }

    #[test]
    fn indexed_cb_group() {
        assert_eq!(lookup(Table::IndexedCb, 0x06).op, Op::IndexedShift(ShiftOp::Rlc, None));
        assert_eq!(lookup(Table::IndexedCb, 0x00).op, Op::IndexedShift(ShiftOp::Rlc, Some(Reg8::B)));
        assert_eq!(lookup(Table::IndexedCb, 0x46).cycles, 20);
        assert_eq!(lookup(Table::IndexedCb, 0x41).op, Op::IndexedBit(0));
        assert_eq!(lookup(Table::IndexedCb, 0xFE).cycles, 23);
    }

    #[test]
    fn ed_group() {
        assert_eq!(lookup(Table::Ed, 0x42).op, Op::Sbc16(Reg16::BC));
        assert_eq!(lookup(Table::Ed, 0x4A).op, Op::Adc16(Reg16::BC));
        assert_eq!(lookup(Table::Ed, 0x73).op, Op::LdStore16(Reg16::SP));
        assert_eq!(lookup(Table::Ed, 0x73).len, 4);
        assert_eq!(lookup(Table::Ed, 0x4D).op, Op::Reti);
        assert_eq!(lookup(Table::Ed, 0x5E).op, Op::Im(2));
        assert_eq!(lookup(Table::Ed, 0x56).op, Op::Im(1));
        assert_eq!(lookup(Table::Ed, 0x70).op, Op::In(None));
        assert_eq!(lookup(Table::Ed, 0x71).op, Op::Out(None));
        assert_eq!(lookup(Table::Ed, 0x6F).cycles, 18);
        assert_eq!(lookup(Table::Ed, 0x00).op, Op::Undefined);
        assert_eq!(lookup(Table::Ed, 0xA4).op, Op::Undefined);
        assert_eq!(lookup(Table::Ed, 0xFF).cycles, 8);
    }

    #[test]
    fn mnemonics() {
        assert_eq!(lookup(Table::Base, 0x01).op.to_string(), "LD BC,nn");
        assert_eq!(lookup(Table::Base, 0x20).op.to_string(), "JR NZ,e");
        assert_eq!(lookup(Table::Base, 0xC9).op.to_string(), "RET");
        assert_eq!(lookup(Table::Dd, 0x86).op.to_string(), "ADD A,(IX+d)");
        assert_eq!(lookup(Table::Ed, 0xB3).op.to_string(), "OTIR");
        assert_eq!(lookup(Table::Ed, 0xA8).op.to_string(), "LDD");
        assert_eq!(lookup(Table::IndexedCb, 0x02).op.to_string(), "RLC (XY+d),D");
    }
}
