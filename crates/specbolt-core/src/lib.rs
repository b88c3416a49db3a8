//! Core traits and types for the specbolt emulator.
//!
//! The CPU owns its bus. Hosts wire peripherals in through the bus traits and
//! receive diagnostics through an injected [`LogSink`].

mod bus;
mod clock;
mod cpu;
pub mod log;
mod memory;
mod observable;
mod ticks;

pub use bus::{Bus, IoBus};
pub use clock::MasterClock;
pub use cpu::Cpu;
pub use log::{Level, LogSink, NullSink, TracingSink};
pub use memory::{ADDRESS_SPACE, FlatBus, OpenBus, PortHandler};
pub use observable::{Observable, Value};
pub use ticks::Ticks;
