//! ECP5 configuration-port sequencing.
//!
//! Walks the FPGA's configuration logic from test-reset into background
//! SPI passthrough mode, after which every DR shift reaches the flash
//! die directly. Settle times between configuration steps are expressed
//! as idle TCK cycles derived from the interface frequency, so the
//! sequence never sleeps on the host clock.

use crate::bits::{bits_to_u32_le, hex_to_bytes, ir_bits};
use crate::error::Result;
use crate::flash::Flash;
use crate::jtag::JtagPort;

/// ECP5 configuration instructions, shifted through the 8-bit IR.
#[derive(Debug, Clone, Copy)]
#[repr(u8)]
enum Instruction {
    ReadId = 0xE0,
    Preload = 0x1C,
    IscEnable = 0xC6,
    IscErase = 0x0E,
    IscDisable = 0x26,
    Bypass = 0xFF,
    LscBackgroundSpi = 0x3A,
}

/// Preload pattern covering the full boundary-scan register.
const PRELOAD_PATTERN: &str = "3FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF";

/// DR pattern that arms the background SPI passthrough.
const SPI_MODE_PATTERN: &str = "68FE";

/// A Lattice ECP5 reached over JTAG, before passthrough entry.
pub struct Ecp5<P> {
    port: P,
    freq_khz: u32,
}

impl<P: JtagPort> Ecp5<P> {
    /// Wrap a JTAG port. `freq_khz` is the TCK frequency, used to turn
    /// millisecond settle times into idle cycle counts.
    pub fn new(port: P, freq_khz: u32) -> Self {
        Ecp5 { port, freq_khz }
    }

    /// Give the port back without touching the TAP.
    pub fn release(self) -> P {
        self.port
    }

    fn shift_ir(&mut self, instruction: Instruction) -> Result<()> {
        log::debug!("shift IR {instruction:?} ({:#04x})", instruction as u8);
        self.port.enter_shift_ir()?;
        self.port.shift_tdi(&ir_bits(&[instruction as u8]))?;
        self.port.enter_pause_ir()
    }

    fn shift_dr_hex(&mut self, pattern: &str) -> Result<Vec<bool>> {
        self.port.enter_shift_dr()?;
        let captured = self.port.shift_tdio(&ir_bits(&hex_to_bytes(pattern)?))?;
        self.port.enter_pause_dr()?;
        Ok(captured)
    }

    /// Idle for `ms` milliseconds worth of TCK cycles.
    fn settle(&mut self, ms: u32) -> Result<()> {
        self.port.run_test_idle(ms * self.freq_khz)
    }

    /// Run the passthrough entry sequence and hand over the port as a
    /// flash session.
    ///
    /// Reads and logs the IDCODE, preloads the boundary scan register,
    /// cycles ISC enable/erase/disable to clear any live configuration,
    /// then arms background SPI mode. The IDCODE is not validated; an
    /// all-zero read is only logged as a warning so that a wedged TAP is
    /// visible without blocking bring-up on unlisted device variants.
    pub fn into_flash(mut self) -> Result<Flash<P>> {
        self.port.test_reset()?;
        self.port.enter_run_test_idle()?;

        self.shift_ir(Instruction::ReadId)?;
        let idcode = bits_to_u32_le(&self.shift_dr_hex("00000000")?);
        if idcode == 0 {
            log::warn!("IDCODE read back all zeroes; check the JTAG connection");
        } else {
            log::info!("ECP5 IDCODE {idcode:#010x}");
        }

        self.shift_ir(Instruction::Preload)?;
        self.shift_dr_hex(PRELOAD_PATTERN)?;

        self.shift_ir(Instruction::IscEnable)?;
        self.shift_dr_hex("00")?;
        self.settle(10)?;

        self.shift_ir(Instruction::IscErase)?;
        self.shift_dr_hex("01")?;
        self.settle(200)?;

        self.shift_ir(Instruction::IscDisable)?;
        self.settle(10)?;

        self.shift_ir(Instruction::Bypass)?;
        self.port.enter_run_test_idle()?;
        self.settle(20)?;

        self.shift_ir(Instruction::LscBackgroundSpi)?;
        self.shift_dr_hex(SPI_MODE_PATTERN)?;
        self.port.enter_run_test_idle()?;
        self.settle(20)?;

        log::debug!("background SPI passthrough armed");
        Ok(Flash::new(self.port))
    }
}
