//! JTAG transport interface.
//!
//! The link layer that moves the TAP between states and clocks bits in
//! and out is an external collaborator; this crate only drives it
//! through [`JtagPort`]. Implementations must report communication
//! failures as [`Error::Transport`](crate::Error::Transport), which the
//! rest of the stack propagates unchanged.

use crate::error::Result;

/// A JTAG test access port, assumed correct and exclusively owned for
/// the duration of a session.
pub trait JtagPort {
    /// Pulse test-reset, leaving the TAP in Test-Logic-Reset.
    fn test_reset(&mut self) -> Result<()>;

    /// Move the TAP to Run-Test/Idle.
    fn enter_run_test_idle(&mut self) -> Result<()>;

    /// Move the TAP to Shift-IR.
    fn enter_shift_ir(&mut self) -> Result<()>;

    /// Move the TAP to Pause-IR.
    fn enter_pause_ir(&mut self) -> Result<()>;

    /// Move the TAP to Shift-DR.
    fn enter_shift_dr(&mut self) -> Result<()>;

    /// Move the TAP to Pause-DR.
    fn enter_pause_dr(&mut self) -> Result<()>;

    /// Clock `bits` out on TDI, discarding TDO.
    fn shift_tdi(&mut self, bits: &[bool]) -> Result<()>;

    /// Full-duplex shift: clock `bits` out on TDI and capture the same
    /// number of TDO bits.
    fn shift_tdio(&mut self, bits: &[bool]) -> Result<Vec<bool>>;

    /// Run the test clock for `cycles` cycles in Run-Test/Idle.
    fn run_test_idle(&mut self, cycles: u32) -> Result<()>;
}

impl JtagPort for Box<dyn JtagPort + Send> {
    fn test_reset(&mut self) -> Result<()> {
        (**self).test_reset()
    }

    fn enter_run_test_idle(&mut self) -> Result<()> {
        (**self).enter_run_test_idle()
    }

    fn enter_shift_ir(&mut self) -> Result<()> {
        (**self).enter_shift_ir()
    }

    fn enter_pause_ir(&mut self) -> Result<()> {
        (**self).enter_pause_ir()
    }

    fn enter_shift_dr(&mut self) -> Result<()> {
        (**self).enter_shift_dr()
    }

    fn enter_pause_dr(&mut self) -> Result<()> {
        (**self).enter_pause_dr()
    }

    fn shift_tdi(&mut self, bits: &[bool]) -> Result<()> {
        (**self).shift_tdi(bits)
    }

    fn shift_tdio(&mut self, bits: &[bool]) -> Result<Vec<bool>> {
        (**self).shift_tdio(bits)
    }

    fn run_test_idle(&mut self, cycles: u32) -> Result<()> {
        (**self).run_test_idle(cycles)
    }
}
