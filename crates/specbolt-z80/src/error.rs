//! Errors reported by the Z80 core.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    /// Opcode with no defined behaviour in its table. Execution continues
    /// as a no-op.
    #[error("unimplemented opcode {prefix:#04X} {opcode:#04X} at {pc:#06X}")]
    UnimplementedOpcode { prefix: u8, opcode: u8, pc: u16 },

    /// Write to an operand that cannot be written, such as an immediate.
    /// Indicates a decoder table bug, never guest behaviour.
    #[error("invalid addressing combination: {0}")]
    InvalidAddressingCombination(&'static str),
}
