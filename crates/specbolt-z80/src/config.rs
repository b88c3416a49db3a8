//! Runtime options for the Z80 core.

/// Behaviour switches chosen at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Z80Config {
    /// Report ED holes through the log sink and the fault slot.
    pub report_undefined: bool,
    /// Stop `run()` on any HALT, even when an interrupt could wake it.
    pub stop_on_halt: bool,
}

impl Default for Z80Config {
    fn default() -> Self {
        Self {
            report_undefined: true,
            stop_on_halt: false,
        }
    }
}
