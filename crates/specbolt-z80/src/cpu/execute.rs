//! Instruction semantics.

use specbolt_core::IoBus;

use super::Z80;
use super::operand::Location;
use crate::alu::{self, AluResult};
use crate::decode::{
    AluOp, Block, BlockKind, Condition, Op, Operand, Reg8, Reg16, ShiftOp,
};
use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF, sz53, sz53p, when};

impl<B: IoBus> Z80<B> {
    /// Execute a decoded operation. Returns true when a conditional branch
    /// was taken or a block instruction repeats.
    pub(super) fn execute(&mut self, op: Op) -> bool {
        match op {
            Op::Nop | Op::Prefix(_) | Op::Undefined => {}
            Op::Halt => self.regs.halted = true,
            Op::Di => {
                self.regs.iff1 = false;
                self.regs.iff2 = false;
            }
            Op::Ei => {
                self.regs.iff1 = true;
                self.regs.iff2 = true;
                self.ints.enable_after_next();
                self.ints.leave_service();
            }
            Op::ExAf => self.regs.exchange_af(),
            Op::Exx => self.regs.exchange_all(),
            Op::ExDeHl => {
                let de = self.regs.de();
                self.regs.set_de(self.regs.hl());
                self.regs.set_hl(de);
            }
            Op::ExSp(r) => {
                let sp = self.regs.sp;
                let value = self.read_word(sp);
                self.write_word(sp, self.regs.reg16(r));
                self.regs.set_reg16(r, value);
                self.regs.wz = value;
            }

            Op::Ld(dst, src) => self.ld(dst, src),
            Op::LdImm16(r) => {
                let value = self.fetch_word();
                self.regs.set_reg16(r, value);
            }
            Op::LdLoad16(r) => {
                let address = self.fetch_word();
                let value = self.read_word(address);
                self.regs.set_reg16(r, value);
                self.regs.wz = address.wrapping_add(1);
            }
            Op::LdStore16(r) => {
                let address = self.fetch_word();
                self.write_word(address, self.regs.reg16(r));
                self.regs.wz = address.wrapping_add(1);
            }
            Op::LdSp(r) => self.regs.sp = self.regs.reg16(r),
            Op::LdAI => self.ld_a_special(self.regs.i),
            Op::LdAR => self.ld_a_special(self.regs.r),
            Op::LdIA => self.regs.i = self.regs.a,
            Op::LdRA => self.regs.r = self.regs.a,
            Op::Push(r) => self.push(self.regs.reg16(r)),
            Op::Pop(r) => {
                let value = self.pop();
                self.regs.set_reg16(r, value);
            }

            Op::Alu(alu_op, operand) => {
                let location = self.resolve(operand);
                let value = self.load(location);
                self.alu(alu_op, value);
            }
            Op::Inc(operand) => self.inc_dec(operand, alu::inc8),
            Op::Dec(operand) => self.inc_dec(operand, alu::dec8),
            Op::Inc16(r) => self.regs.set_reg16(r, self.regs.reg16(r).wrapping_add(1)),
            Op::Dec16(r) => self.regs.set_reg16(r, self.regs.reg16(r).wrapping_sub(1)),
            Op::Add16(dst, src) => {
                let a = self.regs.reg16(dst);
                let (result, flags) = alu::add16(a, self.regs.reg16(src));
                self.regs.set_reg16(dst, result);
                self.regs.f = (self.regs.f & (SF | ZF | PF)) | flags;
                self.regs.wz = a.wrapping_add(1);
            }
            Op::Adc16(r) => {
                let hl = self.regs.hl();
                let (result, flags) = alu::adc16(hl, self.regs.reg16(r), self.regs.flag(CF));
                self.regs.set_hl(result);
                self.regs.f = flags;
                self.regs.wz = hl.wrapping_add(1);
            }
            Op::Sbc16(r) => {
                let hl = self.regs.hl();
                let (result, flags) = alu::sbc16(hl, self.regs.reg16(r), self.regs.flag(CF));
                self.regs.set_hl(result);
                self.regs.f = flags;
                self.regs.wz = hl.wrapping_add(1);
            }

            Op::Rlca => self.rotate_a(ShiftOp::Rlc),
            Op::Rrca => self.rotate_a(ShiftOp::Rrc),
            Op::Rla => self.rotate_a(ShiftOp::Rl),
            Op::Rra => self.rotate_a(ShiftOp::Rr),
            Op::Daa => self.set_a(alu::daa(self.regs.a, self.regs.f)),
            Op::Cpl => self.set_a(alu::cpl(self.regs.a, self.regs.f)),
            Op::Scf => self.regs.f = alu::scf(self.regs.a, self.regs.f),
            Op::Ccf => self.regs.f = alu::ccf(self.regs.a, self.regs.f),
            Op::Neg => self.set_a(alu::sub8(0, self.regs.a, false)),

            Op::Shift(shift, operand) => {
                let location = self.resolve(operand);
                let value = self.load(location);
                let r = alu::shift(shift, value, self.regs.flag(CF));
                self.store(location, r.value);
                self.regs.f = r.flags;
            }
            Op::Bit(n, operand) => {
                let location = self.resolve(operand);
                let value = self.load(location);
                let xy = match location {
                    Location::Memory(_) => (self.regs.wz >> 8) as u8,
                    Location::Register(_) | Location::Immediate(_) => value,
                };
                self.regs.f = alu::bit(n, value, xy) | (self.regs.f & CF);
            }
            Op::Res(n, operand) => self.modify(operand, |v| v & !(1 << n)),
            Op::Set(n, operand) => self.modify(operand, |v| v | (1 << n)),
            Op::IndexedShift(shift, copy) => {
                let address = self.regs.wz;
                let r = alu::shift(shift, self.bus.read(address), self.regs.flag(CF));
                self.regs.f = r.flags;
                self.indexed_write_back(address, r.value, copy);
            }
            Op::IndexedBit(n) => {
                let value = self.bus.read(self.regs.wz);
                let xy = (self.regs.wz >> 8) as u8;
                self.regs.f = alu::bit(n, value, xy) | (self.regs.f & CF);
            }
            Op::IndexedRes(n, copy) => {
                let address = self.regs.wz;
                let value = self.bus.read(address) & !(1 << n);
                self.indexed_write_back(address, value, copy);
            }
            Op::IndexedSet(n, copy) => {
                let address = self.regs.wz;
                let value = self.bus.read(address) | (1 << n);
                self.indexed_write_back(address, value, copy);
            }

            Op::Jp(condition) => {
                let target = self.fetch_word();
                self.regs.wz = target;
                if self.condition_met(condition) {
                    self.regs.pc = target;
                    return true;
                }
            }
            Op::JpInd(r) => self.regs.pc = self.regs.reg16(r),
            Op::Jr(condition) => {
                let offset = self.fetch_byte() as i8;
                if self.condition_met(condition) {
                    self.jump_relative(offset);
                    return true;
                }
            }
            Op::Djnz => {
                let offset = self.fetch_byte() as i8;
                self.regs.b = self.regs.b.wrapping_sub(1);
                if self.regs.b != 0 {
                    self.jump_relative(offset);
                    return true;
                }
            }
            Op::Call(condition) => {
                let target = self.fetch_word();
                self.regs.wz = target;
                if self.condition_met(condition) {
                    self.call(target);
                    return true;
                }
            }
            Op::Ret(condition) => {
                if self.condition_met(condition) {
                    self.ret();
                    return true;
                }
            }
            Op::Reti | Op::Retn => {
                self.regs.iff1 = self.regs.iff2;
                self.ints.leave_service();
                self.ret();
            }
            Op::Rst(target) => self.call(u16::from(target)),

            Op::InImm => {
                let n = self.fetch_byte();
                let port = u16::from_be_bytes([self.regs.a, n]);
                self.regs.a = self.bus.read_io(port);
                self.regs.wz = port.wrapping_add(1);
            }
            Op::OutImm => {
                let n = self.fetch_byte();
                let a = self.regs.a;
                self.bus.write_io(u16::from_be_bytes([a, n]), a);
                self.regs.wz = u16::from_be_bytes([a, n.wrapping_add(1)]);
            }
            Op::In(target) => {
                let port = self.regs.bc();
                let value = self.bus.read_io(port);
                if let Some(r) = target {
                    self.regs.set_reg8(r, value);
                }
                self.regs.f = sz53p(value) | (self.regs.f & CF);
                self.regs.wz = port.wrapping_add(1);
            }
            Op::Out(source) => {
                let port = self.regs.bc();
                let value = source.map_or(0, |r| self.regs.reg8(r));
                self.bus.write_io(port, value);
                self.regs.wz = port.wrapping_add(1);
            }

            Op::Im(mode) => self.regs.im = mode,
            Op::Rrd => self.rotate_digit(false),
            Op::Rld => self.rotate_digit(true),
            Op::Block(block) => return self.block(block),
        }
        false
    }

    fn ld(&mut self, dst: Operand, src: Operand) {
        let to = self.resolve(dst);
        let from = self.resolve(src);
        let value = self.load(from);
        self.store(to, value);

        // Accumulator loads through (BC), (DE) and (nn) leave a trace in WZ.
        let via_pointer = |o: Operand| matches!(o, Operand::Absolute | Operand::Indirect(Reg16::BC | Reg16::DE));
        match (to, from) {
            (Location::Register(Reg8::A), Location::Memory(address)) if via_pointer(src) => {
                self.regs.wz = address.wrapping_add(1);
            }
            (Location::Memory(address), Location::Register(Reg8::A)) if via_pointer(dst) => {
                self.regs.wz = u16::from_be_bytes([self.regs.a, address.wrapping_add(1) as u8]);
            }
            _ => {}
        }
    }

    /// LD A,I and LD A,R: P/V reports IFF2.
    fn ld_a_special(&mut self, value: u8) {
        self.regs.a = value;
        self.regs.f = sz53(value) | when(self.regs.iff2, PF) | (self.regs.f & CF);
    }

    fn alu(&mut self, op: AluOp, value: u8) {
        let a = self.regs.a;
        let carry = self.regs.flag(CF);
        let r = match op {
            AluOp::Add => alu::add8(a, value, false),
            AluOp::Adc => alu::add8(a, value, carry),
            AluOp::Sub => alu::sub8(a, value, false),
            AluOp::Sbc => alu::sub8(a, value, carry),
            AluOp::And => alu::and8(a, value),
            AluOp::Xor => alu::xor8(a, value),
            AluOp::Or => alu::or8(a, value),
            AluOp::Cp => alu::cp8(a, value),
        };
        self.set_a(r);
    }

    fn set_a(&mut self, r: AluResult) {
        self.regs.a = r.value;
        self.regs.f = r.flags;
    }

    fn inc_dec(&mut self, operand: Operand, op: fn(u8) -> AluResult) {
        let location = self.resolve(operand);
        let r = op(self.load(location));
        self.store(location, r.value);
        self.regs.f = r.flags | (self.regs.f & CF);
    }

    fn modify(&mut self, operand: Operand, op: impl FnOnce(u8) -> u8) {
        let location = self.resolve(operand);
        let value = op(self.load(location));
        self.store(location, value);
    }

    fn rotate_a(&mut self, op: ShiftOp) {
        let r = alu::rotate_a(op, self.regs.a, self.regs.f);
        self.set_a(r);
    }

    /// DDCB results go back to memory and, for the undocumented forms, to a
    /// register as well.
    fn indexed_write_back(&mut self, address: u16, value: u8, copy: Option<Reg8>) {
        self.bus.write(address, value);
        if let Some(r) = copy {
            self.regs.set_reg8(r, value);
        }
    }

    fn condition_met(&self, condition: Option<Condition>) -> bool {
        let Some(condition) = condition else {
            return true;
        };
        match condition {
            Condition::NZ => !self.regs.flag(ZF),
            Condition::Z => self.regs.flag(ZF),
            Condition::NC => !self.regs.flag(CF),
            Condition::C => self.regs.flag(CF),
            Condition::PO => !self.regs.flag(PF),
            Condition::PE => self.regs.flag(PF),
            Condition::P => !self.regs.flag(SF),
            Condition::M => self.regs.flag(SF),
        }
    }

    fn jump_relative(&mut self, offset: i8) {
        self.regs.pc = self.regs.pc.wrapping_add_signed(i16::from(offset));
        self.regs.wz = self.regs.pc;
    }

    fn ret(&mut self) {
        self.regs.pc = self.pop();
        self.regs.wz = self.regs.pc;
    }

    /// RLD (`left`) and RRD: rotate BCD digits between A and (HL).
    fn rotate_digit(&mut self, left: bool) {
        let hl = self.regs.hl();
        let m = self.bus.read(hl);
        let a = self.regs.a;
        let (memory, low) = if left {
            ((m << 4) | (a & 0x0F), m >> 4)
        } else {
            ((a << 4) | (m >> 4), m & 0x0F)
        };
        self.bus.write(hl, memory);
        self.regs.a = (a & 0xF0) | low;
        self.regs.f = sz53p(self.regs.a) | (self.regs.f & CF);
        self.regs.wz = hl.wrapping_add(1);
    }

    /// Post-increment (or decrement) HL, returning the old value.
    fn step_hl(&mut self, decrement: bool) -> u16 {
        let hl = self.regs.hl();
        let next = if decrement {
            hl.wrapping_sub(1)
        } else {
            hl.wrapping_add(1)
        };
        self.regs.set_hl(next);
        hl
    }

    /// One iteration of an ED block instruction. Repeating forms rewind PC
    /// to run again and report `true` while the loop continues.
    fn block(&mut self, block: Block) -> bool {
        let dec = block.decrement;
        let again = match block.kind {
            BlockKind::Ld => {
                let source = self.step_hl(dec);
                let value = self.bus.read(source);
                let de = self.regs.de();
                self.bus.write(de, value);
                self.regs
                    .set_de(if dec { de.wrapping_sub(1) } else { de.wrapping_add(1) });
                let bc = self.regs.bc().wrapping_sub(1);
                self.regs.set_bc(bc);

                let n = value.wrapping_add(self.regs.a);
                self.regs.f = (self.regs.f & (SF | ZF | CF))
                    | (n & XF)
                    | ((n << 4) & YF)
                    | when(bc != 0, PF);
                bc != 0
            }
            BlockKind::Cp => {
                let source = self.step_hl(dec);
                let value = self.bus.read(source);
                let bc = self.regs.bc().wrapping_sub(1);
                self.regs.set_bc(bc);
                self.regs.wz = if dec {
                    self.regs.wz.wrapping_sub(1)
                } else {
                    self.regs.wz.wrapping_add(1)
                };

                let diff = alu::sub8(self.regs.a, value, false);
                let n = diff.value.wrapping_sub(u8::from(diff.flags & HF != 0));
                self.regs.f = (diff.flags & (SF | ZF | HF))
                    | NF
                    | (self.regs.f & CF)
                    | (n & XF)
                    | ((n << 4) & YF)
                    | when(bc != 0, PF);
                bc != 0 && diff.value != 0
            }
            BlockKind::In => {
                let port = self.regs.bc();
                let value = self.bus.read_io(port);
                let target = self.step_hl(dec);
                self.bus.write(target, value);
                self.regs.b = self.regs.b.wrapping_sub(1);
                self.regs.wz = if dec {
                    port.wrapping_sub(1)
                } else {
                    port.wrapping_add(1)
                };

                let c = if dec {
                    self.regs.c.wrapping_sub(1)
                } else {
                    self.regs.c.wrapping_add(1)
                };
                let k = u16::from(value) + u16::from(c);
                self.regs.f = alu::block_io_flags(value, self.regs.b, k);
                self.regs.b != 0
            }
            BlockKind::Out => {
                let source = self.step_hl(dec);
                let value = self.bus.read(source);
                self.regs.b = self.regs.b.wrapping_sub(1);
                let port = self.regs.bc();
                self.bus.write_io(port, value);
                self.regs.wz = if dec {
                    port.wrapping_sub(1)
                } else {
                    port.wrapping_add(1)
                };

                let k = u16::from(value) + u16::from(self.regs.l);
                self.regs.f = alu::block_io_flags(value, self.regs.b, k);
                self.regs.b != 0
            }
        };

        if block.repeat && again {
            self.regs.pc = self.regs.pc.wrapping_sub(2);
            if matches!(block.kind, BlockKind::Ld | BlockKind::Cp) {
                self.regs.wz = self.regs.pc.wrapping_add(1);
            }
            true
        } else {
            false
        }
    }
}
