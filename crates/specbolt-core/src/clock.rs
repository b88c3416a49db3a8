//! Master clock configuration.

use crate::Ticks;

/// Master clock configuration for a system.
///
/// The host paces emulation in frames. A frame boundary is the quiescent
/// point at which video memory may be copied out for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterClock {
    /// CPU clock in Hz (e.g., `3_500_000` for a 48K Spectrum).
    pub frequency_hz: u64,
}

impl MasterClock {
    /// 3.5 MHz, the common home-computer Z80 clock.
    pub const ZX_SPECTRUM: Self = Self::new(3_500_000);

    #[must_use]
    pub const fn new(frequency_hz: u64) -> Self {
        Self { frequency_hz }
    }

    /// Ticks per frame at the given frame rate (integer division).
    #[must_use]
    pub const fn ticks_per_frame(&self, frames_per_second: u64) -> Ticks {
        Ticks::new(self.frequency_hz / frames_per_second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spectrum_frame_length() {
        assert_eq!(MasterClock::ZX_SPECTRUM.ticks_per_frame(50).get(), 70_000);
    }
}
