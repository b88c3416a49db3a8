//! Z80 execution driver.
//!
//! `step()` runs one whole instruction at a time: fetch, prefix escape,
//! table lookup, operand resolution and write-back, then returns the
//! T-states the instruction took on real hardware. Interrupt requests are
//! latched by the host and honoured only between instructions.

mod execute;
mod operand;

use std::collections::BTreeSet;

use specbolt_core::{
    Cpu, IoBus, Level, LogSink, MasterClock, Observable, Ticks, TracingSink, Value,
};

use crate::config::Z80Config;
use crate::decode::{self, Index, Instruction, Op, Prefix};
use crate::error::CpuError;
use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF};
use crate::interrupt::{Acknowledge, InterruptController, InterruptState};
use crate::registers::Registers;

/// T-states for one halted machine cycle.
const HALT_CYCLES: u32 = 4;
/// T-states for a DD/FD prefix that another prefix overrides.
const PREFIX_CYCLES: u32 = 4;

/// Why `run()` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    BudgetExhausted,
    /// Halted with nothing that can wake it, or on any HALT when
    /// [`Z80Config::stop_on_halt`] is set.
    Halted,
    /// PC reached a breakpoint address.
    Breakpoint(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// T-states actually executed; may overshoot the budget by part of an
    /// instruction.
    pub cycles: u64,
    pub reason: StopReason,
}

/// Z80 CPU that owns its memory and I/O bus.
pub struct Z80<B: IoBus> {
    regs: Registers,
    bus: B,
    ints: InterruptController,
    config: Z80Config,
    sink: Box<dyn LogSink>,
    /// Most recent recoverable fault, until taken by the host.
    fault: Option<CpuError>,
    total_ticks: Ticks,
    breakpoints: BTreeSet<u16>,
    /// T-states the previous frame ran past its end.
    frame_overshoot: u64,
}

impl<B: IoBus> Z80<B> {
    /// Create a CPU in power-on state that logs through `tracing`.
    pub fn new(bus: B) -> Self {
        Self::with_config(bus, Z80Config::default(), Box::new(TracingSink))
    }

    pub fn with_config(bus: B, config: Z80Config, sink: Box<dyn LogSink>) -> Self {
        Self {
            regs: Registers::power_on(),
            bus,
            ints: InterruptController::default(),
            config,
            sink,
            fault: None,
            total_ticks: Ticks::ZERO,
            breakpoints: BTreeSet::new(),
            frame_overshoot: 0,
        }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn into_bus(self) -> B {
        self.bus
    }

    #[must_use]
    pub fn config(&self) -> &Z80Config {
        &self.config
    }

    /// Register snapshot for debugging and tests.
    #[must_use]
    pub fn snapshot(&self) -> Registers {
        self.regs
    }

    /// Total T-states executed since construction.
    #[must_use]
    pub fn total_ticks(&self) -> Ticks {
        self.total_ticks
    }

    /// Take the last recoverable fault, if any.
    pub fn take_fault(&mut self) -> Option<CpuError> {
        self.fault.take()
    }

    pub fn read_memory(&mut self, address: u16) -> u8 {
        self.bus.read(address)
    }

    pub fn write_memory(&mut self, address: u16, value: u8) {
        self.bus.write(address, value);
    }

    pub fn read_port(&mut self, port: u16) -> u8 {
        self.bus.read_io(port)
    }

    pub fn write_port(&mut self, port: u16, value: u8) {
        self.bus.write_io(port, value);
    }

    /// Assert INT. `None` puts 0xFF on the data bus, as an idle bus would.
    pub fn request_interrupt(&mut self, data: Option<u8>) {
        self.ints.request_int(data.unwrap_or(0xFF));
    }

    /// Withdraw an INT request that has not been accepted yet.
    pub fn clear_interrupt(&mut self) {
        self.ints.clear_int();
    }

    pub fn request_nmi(&mut self) {
        self.ints.request_nmi();
    }

    #[must_use]
    pub fn interrupt_state(&self) -> InterruptState {
        self.ints.state(self.regs.iff1)
    }

    pub fn add_breakpoint(&mut self, address: u16) {
        self.breakpoints.insert(address);
    }

    pub fn remove_breakpoint(&mut self, address: u16) -> bool {
        self.breakpoints.remove(&address)
    }

    /// Set PC directly.
    #[cfg(feature = "test-utils")]
    pub fn set_pc(&mut self, value: u16) {
        self.regs.pc = value;
    }

    /// Set SP directly.
    #[cfg(feature = "test-utils")]
    pub fn set_sp(&mut self, value: u16) {
        self.regs.sp = value;
    }

    /// Mutable access to the whole register file, for loading test states.
    #[cfg(feature = "test-utils")]
    pub fn regs_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    /// Execute one instruction, interrupt acknowledge or halted cycle.
    pub fn step(&mut self) -> u32 {
        let cycles = if let Some(ack) = self.ints.poll(self.regs.iff1) {
            self.acknowledge(ack)
        } else if self.regs.halted {
            self.regs.inc_r();
            HALT_CYCLES
        } else {
            self.execute_next()
        };
        self.total_ticks += cycles;
        cycles
    }

    /// Step until `budget` T-states have run, the CPU halts for good, or a
    /// breakpoint is reached.
    pub fn run(&mut self, budget: u64) -> RunOutcome {
        let mut cycles = 0;
        while cycles < budget {
            cycles += u64::from(self.step());
            if self.regs.halted && (self.config.stop_on_halt || !self.can_wake()) {
                return RunOutcome {
                    cycles,
                    reason: StopReason::Halted,
                };
            }
            if self.breakpoints.contains(&self.regs.pc) {
                return RunOutcome {
                    cycles,
                    reason: StopReason::Breakpoint(self.regs.pc),
                };
            }
        }
        RunOutcome {
            cycles,
            reason: StopReason::BudgetExhausted,
        }
    }

    /// Run one video frame. Overshoot from the previous frame is deducted so
    /// frames stay locked to the master clock on average. A frame rate of
    /// zero is treated as one frame per second.
    pub fn run_frame(&mut self, clock: &MasterClock, frames_per_second: u64) -> RunOutcome {
        let frame = clock.ticks_per_frame(frames_per_second.max(1)).get();
        let budget = frame.saturating_sub(self.frame_overshoot);
        let outcome = self.run(budget);
        // An overshoot longer than a frame spills into the frames after.
        self.frame_overshoot = match outcome.reason {
            StopReason::BudgetExhausted => self.frame_overshoot + outcome.cycles - frame,
            StopReason::Halted | StopReason::Breakpoint(_) => 0,
        };
        outcome
    }

    /// A halted CPU wakes on NMI, or on INT while IFF1 is set.
    fn can_wake(&self) -> bool {
        self.ints.nmi_pending() || self.regs.iff1
    }

    fn acknowledge(&mut self, ack: Acknowledge) -> u32 {
        self.regs.halted = false;
        self.regs.inc_r();
        match ack {
            Acknowledge::Nmi => {
                self.regs.iff1 = false;
                self.call(0x0066);
                11
            }
            Acknowledge::Int(data) => {
                self.regs.iff1 = false;
                self.regs.iff2 = false;
                match self.regs.im {
                    0 => self.acknowledge_mode0(data),
                    1 => {
                        self.call(0x0038);
                        13
                    }
                    _ => {
                        let vector = u16::from_be_bytes([self.regs.i, data]);
                        let target = self.read_word(vector);
                        self.call(target);
                        19
                    }
                }
            }
        }
    }

    /// Mode 0 executes the byte on the data bus. Only single-byte
    /// instructions can be supplied this way.
    fn acknowledge_mode0(&mut self, data: u8) -> u32 {
        let instr = decode::BASE[usize::from(data)];
        match instr.op {
            Op::Rst(target) => {
                self.call(u16::from(target));
                13
            }
            Op::Prefix(_) => {
                self.report(0x00, data, self.regs.pc);
                6
            }
            _ if instr.len > 1 => {
                self.report(0x00, data, self.regs.pc);
                6
            }
            _ => 2 + self.dispatch(instr, self.regs.pc),
        }
    }

    fn execute_next(&mut self) -> u32 {
        let start = self.regs.pc;
        let instr = decode::BASE[usize::from(self.fetch_opcode())];
        match instr.op {
            Op::Prefix(prefix) => self.execute_prefixed(prefix, start),
            _ => self.dispatch(instr, start),
        }
    }

    /// Run the instruction a prefix selects.
    ///
    /// A DD or FD followed by another DD, FD or ED byte selects nothing. It
    /// runs on its own as a 4 T-state no-op, and the next step starts at the
    /// overriding prefix with interrupts held off for that one boundary.
    fn execute_prefixed(&mut self, prefix: Prefix, start: u16) -> u32 {
        let (table, index) = match prefix {
            Prefix::CB => {
                let instr = decode::CB[usize::from(self.fetch_opcode())];
                return self.dispatch(instr, start);
            }
            Prefix::ED => {
                let opcode = self.fetch_opcode();
                let instr = decode::ED[usize::from(opcode)];
                if matches!(instr.op, Op::Undefined) {
                    self.report(0xED, opcode, self.regs.pc.wrapping_sub(2));
                }
                return self.dispatch(instr, start);
            }
            Prefix::DD => (&decode::DD, Index::IX),
            Prefix::FD => (&decode::FD, Index::IY),
        };

        let next = self.bus.read(self.regs.pc);
        if matches!(next, 0xDD | 0xED | 0xFD) {
            tracing::trace!(target: "specbolt::z80", pc = start, "prefix {prefix:?} overridden");
            self.ints.hold_next();
            return PREFIX_CYCLES;
        }

        let instr = table[usize::from(self.fetch_opcode())];
        match instr.op {
            Op::Prefix(Prefix::CB) => self.execute_indexed_cb(index, start),
            _ => self.dispatch(instr, start),
        }
    }

    /// DDCB/FDCB: displacement and opcode follow the CB byte and are read
    /// without M1 cycles, so R only counted the two prefixes.
    fn execute_indexed_cb(&mut self, index: Index, start: u16) -> u32 {
        let displacement = self.fetch_byte() as i8;
        let opcode = self.fetch_byte();
        self.regs.wz = self
            .regs
            .reg16(index.pair())
            .wrapping_add_signed(i16::from(displacement));
        self.dispatch(decode::INDEXED_CB[usize::from(opcode)], start)
    }

    fn dispatch(&mut self, instr: Instruction, start: u16) -> u32 {
        tracing::trace!(target: "specbolt::z80", pc = start, "{}", instr.op);
        let taken = self.execute(instr.op);
        instr.cost(taken)
    }

    fn report(&mut self, prefix: u8, opcode: u8, pc: u16) {
        if !self.config.report_undefined {
            return;
        }
        let fault = CpuError::UnimplementedOpcode { prefix, opcode, pc };
        if self.sink.enabled(Level::Warning) {
            self.sink.log(Level::Warning, &fault.to_string());
        }
        self.fault = Some(fault);
    }

    fn fetch_opcode(&mut self) -> u8 {
        self.regs.inc_r();
        self.fetch_byte()
    }

    fn fetch_byte(&mut self) -> u8 {
        let value = self.bus.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    fn fetch_word(&mut self) -> u16 {
        let lo = self.fetch_byte();
        let hi = self.fetch_byte();
        u16::from_le_bytes([lo, hi])
    }

    fn read_word(&mut self, address: u16) -> u16 {
        let lo = self.bus.read(address);
        let hi = self.bus.read(address.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    fn write_word(&mut self, address: u16, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.bus.write(address, lo);
        self.bus.write(address.wrapping_add(1), hi);
    }

    fn push(&mut self, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.bus.write(self.regs.sp, hi);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.bus.write(self.regs.sp, lo);
    }

    fn pop(&mut self) -> u16 {
        let value = self.read_word(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(2);
        value
    }

    /// Push PC and jump.
    fn call(&mut self, target: u16) {
        self.push(self.regs.pc);
        self.regs.pc = target;
        self.regs.wz = target;
    }
}

impl<B: IoBus> Cpu for Z80<B> {
    type Registers = Registers;

    fn step(&mut self) -> u32 {
        Z80::step(self)
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn registers(&self) -> Self::Registers {
        self.regs
    }

    fn is_halted(&self) -> bool {
        self.regs.halted
    }

    fn interrupt(&mut self, data: u8) {
        self.ints.request_int(data);
    }

    fn nmi(&mut self) {
        self.ints.request_nmi();
    }

    fn reset(&mut self) {
        self.regs = Registers::power_on();
        self.ints.reset();
        self.bus.reset();
        self.fault = None;
        self.frame_overshoot = 0;
    }
}

/// All query paths supported by the Z80.
const Z80_QUERY_PATHS: &[&str] = &[
    // Main registers
    "a", "f", "b", "c", "d", "e", "h", "l",
    // Register pairs
    "af", "bc", "de", "hl",
    // Alternate registers
    "af'", "bc'", "de'", "hl'",
    // Index registers
    "ix", "iy", "ixh", "ixl", "iyh", "iyl",
    // Other registers
    "sp", "pc", "i", "r", "wz",
    // Flags (individual)
    "flags.s", "flags.z", "flags.y", "flags.h",
    "flags.x", "flags.p", "flags.n", "flags.c",
    // Interrupt state
    "iff1", "iff2", "im", "int.pending", "nmi.pending", "int.in_service",
    // CPU state
    "halted", "ticks",
];

impl<B: IoBus> Observable for Z80<B> {
    fn query(&self, path: &str) -> Option<Value> {
        let regs = &self.regs;
        match path {
            "a" => Some(regs.a.into()),
            "f" => Some(regs.f.into()),
            "b" => Some(regs.b.into()),
            "c" => Some(regs.c.into()),
            "d" => Some(regs.d.into()),
            "e" => Some(regs.e.into()),
            "h" => Some(regs.h.into()),
            "l" => Some(regs.l.into()),

            "af" => Some(regs.af().into()),
            "bc" => Some(regs.bc().into()),
            "de" => Some(regs.de().into()),
            "hl" => Some(regs.hl().into()),

            "af'" => Some(regs.af_alt().into()),
            "bc'" => Some(regs.bc_alt().into()),
            "de'" => Some(regs.de_alt().into()),
            "hl'" => Some(regs.hl_alt().into()),

            "ix" => Some(regs.ix.into()),
            "iy" => Some(regs.iy.into()),
            "ixh" => Some(((regs.ix >> 8) as u8).into()),
            "ixl" => Some((regs.ix as u8).into()),
            "iyh" => Some(((regs.iy >> 8) as u8).into()),
            "iyl" => Some((regs.iy as u8).into()),

            "sp" => Some(regs.sp.into()),
            "pc" => Some(regs.pc.into()),
            "i" => Some(regs.i.into()),
            "r" => Some(regs.r.into()),
            "wz" => Some(regs.wz.into()),

            "flags.s" => Some(regs.flag(SF).into()),
            "flags.z" => Some(regs.flag(ZF).into()),
            "flags.y" => Some(regs.flag(YF).into()),
            "flags.h" => Some(regs.flag(HF).into()),
            "flags.x" => Some(regs.flag(XF).into()),
            "flags.p" => Some(regs.flag(PF).into()),
            "flags.n" => Some(regs.flag(NF).into()),
            "flags.c" => Some(regs.flag(CF).into()),

            "iff1" => Some(regs.iff1.into()),
            "iff2" => Some(regs.iff2.into()),
            "im" => Some(regs.im.into()),
            "int.pending" => Some(self.ints.int_pending().into()),
            "nmi.pending" => Some(self.ints.nmi_pending().into()),
            "int.in_service" => {
                Some((self.interrupt_state() == InterruptState::InService).into())
            }

            "halted" => Some(regs.halted.into()),
            "ticks" => Some(self.total_ticks.get().into()),

            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        Z80_QUERY_PATHS
    }
}
