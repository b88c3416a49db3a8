//! Memory and I/O bus interface.

/// Memory bus interface.
///
/// The address space is 16 bits wide and wraps naturally, so there is no
/// out-of-range access to report.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);

    /// Return bus-owned state to power-on. RAM-backed buses zero-fill.
    fn reset(&mut self) {}
}

/// A bus that also supports a separate I/O port space.
///
/// The Z80 drives all 16 address lines during IN and OUT, so ports are
/// 16-bit. Many peripherals only decode the low byte.
pub trait IoBus: Bus {
    /// Read a byte from the given I/O port.
    fn read_io(&mut self, port: u16) -> u8;

    /// Write a byte to the given I/O port.
    fn write_io(&mut self, port: u16, value: u8);
}
