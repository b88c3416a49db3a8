//! Flat 64K address space with port-mapped I/O hooks.

use crate::{Bus, IoBus};

/// Size of the 16-bit address space.
pub const ADDRESS_SPACE: usize = 0x1_0000;

/// Peripheral attached to the I/O port space.
pub trait PortHandler {
    fn read(&mut self, port: u16) -> u8;
    fn write(&mut self, port: u16, value: u8);
}

/// Nothing attached: reads float high, writes vanish.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenBus;

impl PortHandler for OpenBus {
    fn read(&mut self, _port: u16) -> u8 {
        0xFF
    }

    fn write(&mut self, _port: u16, _value: u8) {}
}

/// Plain RAM covering the whole address space.
///
/// The buffer is private to the bus (and therefore to the CPU that owns the
/// bus). A host that wants to supply its own allocation passes it in with
/// [`FlatBus::with_memory`] and takes it back with [`FlatBus::into_memory`].
pub struct FlatBus<P = OpenBus> {
    memory: Box<[u8; ADDRESS_SPACE]>,
    ports: P,
}

impl FlatBus<OpenBus> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_ports(OpenBus)
    }
}

impl Default for FlatBus<OpenBus> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PortHandler> FlatBus<P> {
    #[must_use]
    pub fn with_ports(ports: P) -> Self {
        Self::with_memory(Box::new([0; ADDRESS_SPACE]), ports)
    }

    /// Wrap a host-supplied buffer. Its contents are kept as-is.
    #[must_use]
    pub fn with_memory(memory: Box<[u8; ADDRESS_SPACE]>, ports: P) -> Self {
        Self { memory, ports }
    }

    /// Copy `data` into memory starting at `address`, wrapping at the top.
    pub fn load(&mut self, address: u16, data: &[u8]) {
        let mut addr = address;
        for &byte in data {
            self.memory[usize::from(addr)] = byte;
            addr = addr.wrapping_add(1);
        }
    }

    /// Read without side effects.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.memory[usize::from(address)]
    }

    /// Copy `len` bytes starting at `start`, wrapping at the top.
    ///
    /// Intended for presentation hand-off at a frame boundary.
    #[must_use]
    pub fn copy_region(&self, start: u16, len: usize) -> Vec<u8> {
        let start = usize::from(start);
        (0..len)
            .map(|i| self.memory[(start + i) % ADDRESS_SPACE])
            .collect()
    }

    #[must_use]
    pub fn memory(&self) -> &[u8; ADDRESS_SPACE] {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut [u8; ADDRESS_SPACE] {
        &mut self.memory
    }

    pub fn ports(&self) -> &P {
        &self.ports
    }

    pub fn ports_mut(&mut self) -> &mut P {
        &mut self.ports
    }

    /// Give the buffer back to the host.
    #[must_use]
    pub fn into_memory(self) -> Box<[u8; ADDRESS_SPACE]> {
        self.memory
    }
}

impl<P: PortHandler> Bus for FlatBus<P> {
    fn read(&mut self, address: u16) -> u8 {
        self.memory[usize::from(address)]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.memory[usize::from(address)] = value;
    }

    fn reset(&mut self) {
        self.memory.fill(0);
    }
}

impl<P: PortHandler> IoBus for FlatBus<P> {
    fn read_io(&mut self, port: u16) -> u8 {
        self.ports.read(port)
    }

    fn write_io(&mut self, port: u16, value: u8) {
        self.ports.write(port, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Latch {
        last: Option<(u16, u8)>,
    }

    impl PortHandler for Latch {
        fn read(&mut self, port: u16) -> u8 {
            port as u8
        }

        fn write(&mut self, port: u16, value: u8) {
            self.last = Some((port, value));
        }
    }

    #[test]
    fn load_wraps_at_top_of_memory() {
        let mut bus = FlatBus::new();
        bus.load(0xFFFF, &[0xAA, 0xBB]);
        assert_eq!(bus.peek(0xFFFF), 0xAA);
        assert_eq!(bus.peek(0x0000), 0xBB);
    }

    #[test]
    fn copy_region_wraps() {
        let mut bus = FlatBus::new();
        bus.load(0xFFFE, &[1, 2, 3]);
        assert_eq!(bus.copy_region(0xFFFE, 3), vec![1, 2, 3]);
    }

    #[test]
    fn reset_zero_fills() {
        let mut bus = FlatBus::new();
        bus.write(0x4000, 0x55);
        Bus::reset(&mut bus);
        assert!(bus.memory().iter().all(|&b| b == 0));
    }

    #[test]
    fn open_bus_floats_high() {
        let mut bus = FlatBus::new();
        assert_eq!(bus.read_io(0x00FE), 0xFF);
    }

    #[test]
    fn ports_route_to_handler() {
        let mut bus = FlatBus::with_ports(Latch::default());
        bus.write_io(0x12FE, 0x07);
        assert_eq!(bus.ports().last, Some((0x12FE, 0x07)));
        assert_eq!(bus.read_io(0x00FE), 0xFE);
    }

    #[test]
    fn host_buffer_round_trips() {
        let mut buffer = Box::new([0u8; ADDRESS_SPACE]);
        buffer[0x100] = 0xC9;
        let mut bus = FlatBus::with_memory(buffer, OpenBus);
        assert_eq!(bus.read(0x100), 0xC9);
        bus.write(0x101, 0x76);
        let buffer = bus.into_memory();
        assert_eq!(buffer[0x101], 0x76);
    }
}
