//! Interrupt request latching and acceptance.

use std::mem;

/// Externally visible interrupt state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptState {
    /// IFF1 clear: INT is ignored.
    Disabled,
    /// IFF1 set: INT is accepted at the next boundary.
    Enabled,
    /// An accepted interrupt is running with IFF1 still clear. Ends when
    /// IFF1 is set again by EI, RETI or RETN.
    InService,
}

/// What the CPU must do at an instruction boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Acknowledge {
    Nmi,
    /// Maskable interrupt with the byte on the data bus.
    Int(u8),
}

/// Latches NMI and INT requests between instruction boundaries.
#[derive(Debug, Default)]
pub(crate) struct InterruptController {
    nmi_pending: bool,
    int_line: Option<u8>,
    /// Set by EI; blocks INT for exactly one more instruction.
    ei_shadow: bool,
    /// Set after a DD/FD prefix that did not complete an instruction;
    /// blocks INT and NMI for one boundary.
    prefix_hold: bool,
    in_service: bool,
}

impl InterruptController {
    pub(crate) fn request_int(&mut self, data: u8) {
        self.int_line = Some(data);
    }

    pub(crate) fn clear_int(&mut self) {
        self.int_line = None;
    }

    pub(crate) fn request_nmi(&mut self) {
        self.nmi_pending = true;
    }

    pub(crate) fn enable_after_next(&mut self) {
        self.ei_shadow = true;
    }

    pub(crate) fn hold_next(&mut self) {
        self.prefix_hold = true;
    }

    pub(crate) fn leave_service(&mut self) {
        self.in_service = false;
    }

    pub(crate) fn nmi_pending(&self) -> bool {
        self.nmi_pending
    }

    pub(crate) fn int_pending(&self) -> bool {
        self.int_line.is_some()
    }

    /// Decide whether an interrupt is taken at this boundary. Called once
    /// per step; consumes the EI shadow and the accepted request.
    pub(crate) fn poll(&mut self, iff1: bool) -> Option<Acknowledge> {
        let shadow = mem::take(&mut self.ei_shadow);
        if mem::take(&mut self.prefix_hold) {
            return None;
        }
        if mem::take(&mut self.nmi_pending) {
            self.in_service = true;
            return Some(Acknowledge::Nmi);
        }
        if !iff1 || shadow {
            return None;
        }
        let data = self.int_line.take()?;
        self.in_service = true;
        Some(Acknowledge::Int(data))
    }

    pub(crate) fn state(&self, iff1: bool) -> InterruptState {
        if iff1 {
            InterruptState::Enabled
        } else if self.in_service {
            InterruptState::InService
        } else {
            InterruptState::Disabled
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_is_masked_by_iff1() {
        let mut ints = InterruptController::default();
        ints.request_int(0xFF);
        assert_eq!(ints.poll(false), None);
        assert_eq!(ints.poll(true), Some(Acknowledge::Int(0xFF)));
        assert_eq!(ints.poll(true), None);
    }

    #[test]
    fn ei_shadow_delays_one_boundary() {
        let mut ints = InterruptController::default();
        ints.request_int(0x10);
        ints.enable_after_next();
        assert_eq!(ints.poll(true), None);
        assert_eq!(ints.poll(true), Some(Acknowledge::Int(0x10)));
    }

    #[test]
    fn nmi_ignores_mask_and_wins() {
        let mut ints = InterruptController::default();
        ints.request_int(0xFF);
        ints.request_nmi();
        assert_eq!(ints.poll(false), Some(Acknowledge::Nmi));
        assert!(ints.int_pending());
        assert_eq!(ints.state(false), InterruptState::InService);
        ints.leave_service();
        assert_eq!(ints.state(false), InterruptState::Disabled);
    }

    #[test]
    fn set_iff1_means_enabled_even_in_service() {
        let mut ints = InterruptController::default();
        ints.request_int(0xFF);
        assert_eq!(ints.poll(true), Some(Acknowledge::Int(0xFF)));
        assert_eq!(ints.state(false), InterruptState::InService);
        assert_eq!(ints.state(true), InterruptState::Enabled);
    }

    #[test]
    fn prefix_hold_blocks_nmi_for_one_boundary() {
        let mut ints = InterruptController::default();
        ints.request_nmi();
        ints.hold_next();
        assert_eq!(ints.poll(true), None);
        assert!(ints.nmi_pending());
        assert_eq!(ints.poll(true), Some(Acknowledge::Nmi));
    }
}
