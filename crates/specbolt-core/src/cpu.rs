//! CPU core trait.

/// A CPU core that owns its bus.
///
/// Each `step()` runs exactly one instruction (or one interrupt acknowledge,
/// or one halted machine cycle) and reports the T-states it took. Requests
/// from peripherals are latched and honoured at the next instruction
/// boundary.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Execute one instruction and return the T-states consumed.
    fn step(&mut self) -> u32;

    /// Returns the current program counter.
    fn pc(&self) -> u16;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Returns true if the CPU is halted.
    fn is_halted(&self) -> bool;

    /// Assert the maskable interrupt line with the byte the peripheral
    /// places on the data bus during acknowledge.
    fn interrupt(&mut self, data: u8);

    /// Request a non-maskable interrupt.
    fn nmi(&mut self);

    /// Reset the CPU (and the memory it owns) to power-on state.
    fn reset(&mut self);
}
