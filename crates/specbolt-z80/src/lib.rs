//! Instruction-stepped Z80 CPU emulator.
//!
//! Each call to `step()` runs one whole instruction and returns the T-states
//! it took, including the undocumented flag bits, WZ and the index-register
//! halves.

pub mod alu;
mod config;
mod cpu;
pub mod decode;
mod error;
pub mod flags;
mod interrupt;
mod registers;

pub use config::Z80Config;
pub use cpu::{RunOutcome, StopReason, Z80};
pub use decode::{Instruction, Op, Table, lookup};
pub use error::CpuError;
pub use flags::{CF, HF, NF, PF, SF, XF, YF, ZF};
pub use interrupt::InterruptState;
pub use registers::Registers;
