//! In-memory emulation of an ECP5 TAP with a SPI-NOR flash behind its
//! background SPI passthrough.
//!
//! [`DummyEcp5`] implements [`JtagPort`] well enough to exercise the
//! whole stack without hardware: it answers the IDCODE read, tracks the
//! instruction register, arms the passthrough on the magic DR pattern,
//! and from then on forwards DR shifts to an emulated 25-series flash
//! die. Used by the `dummy` programmer in the CLI and by the
//! integration tests.

use ecpflash_core::bits::{cmd_bits, cmd_bytes, ir_bytes};
use ecpflash_core::error::{Error, Result};
use ecpflash_core::jtag::JtagPort;
use ecpflash_core::opcodes;

/// Geometry and identity of the emulated flash chip, plus fault
/// injection knobs.
///
/// Defaults model an LFE5U-85 with a 1 MiB Winbond-style chip attached.
#[derive(Debug, Clone)]
pub struct DummyConfig {
    pub idcode: u32,
    pub manufacturer_id: u8,
    pub device_id: u16,
    pub size: usize,
    pub page_size: usize,
    pub sector_size: usize,
    pub block_size: usize,
    /// Leave the write-enable latch set after mutating commands, so
    /// every write or erase reads back as failed.
    pub fail_writes: bool,
    /// Number of status reads that report write-in-progress after each
    /// mutating command.
    pub busy_polls: u32,
    /// Force exactly this many status reads to report WEL set with WIP
    /// clear, emulating the settling race between the two bits.
    pub transient_wel_reads: u32,
}

impl Default for DummyConfig {
    fn default() -> Self {
        DummyConfig {
            idcode: 0x4111_3043,
            manufacturer_id: 0xEF,
            device_id: 0x4018,
            size: 1 << 20,
            page_size: 256,
            sector_size: 4096,
            block_size: 32768,
            fail_writes: false,
            busy_polls: 0,
            transient_wel_reads: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TapState {
    Reset,
    Idle,
    ShiftIr,
    PauseIr,
    ShiftDr,
    PauseDr,
}

const WIP: u8 = 1 << 0;
const WEL: u8 = 1 << 1;

/// The emulated flash die: memory array, status register, and the
/// transaction buffer of the currently selected command.
struct SpiNor {
    config: DummyConfig,
    data: Vec<u8>,
    status: u8,
    selected: bool,
    buf: Vec<u8>,
    wip_remaining: u32,
    transient_wel_remaining: u32,
    erases: Vec<u32>,
    programs: Vec<(u32, usize)>,
}

impl SpiNor {
    fn new(config: DummyConfig) -> Self {
        let size = config.size;
        let transient_wel_remaining = config.transient_wel_reads;
        SpiNor {
            config,
            data: vec![0xFF; size],
            status: 0,
            selected: false,
            buf: Vec::new(),
            wip_remaining: 0,
            transient_wel_remaining,
            erases: Vec::new(),
            programs: Vec::new(),
        }
    }

    fn select(&mut self) {
        self.selected = true;
        self.buf.clear();
    }

    fn buf_addr(&self) -> usize {
        (u32::from_be_bytes([0, self.buf[1], self.buf[2], self.buf[3]]) as usize)
            % self.data.len()
    }

    /// Clock `input` through the die, producing one output byte per
    /// input byte. Positions count from chip select, across both DR
    /// shifts of a transaction.
    fn clock(&mut self, input: &[u8]) -> Vec<u8> {
        let mut output = Vec::with_capacity(input.len());
        for &byte in input {
            let pos = self.buf.len();
            self.buf.push(byte);
            output.push(if pos == 0 { 0x00 } else { self.output_byte(pos) });
        }
        output
    }

    fn output_byte(&mut self, pos: usize) -> u8 {
        match self.buf[0] {
            opcodes::RDSR => {
                if self.transient_wel_remaining > 0 {
                    self.transient_wel_remaining -= 1;
                    self.status & !WIP | WEL
                } else if self.wip_remaining > 0 {
                    self.wip_remaining -= 1;
                    self.status | WIP | WEL
                } else {
                    self.status
                }
            }
            opcodes::READ if pos >= 4 => self.data[(self.buf_addr() + pos - 4) % self.data.len()],
            opcodes::FAST_READ if pos >= 5 => {
                self.data[(self.buf_addr() + pos - 5) % self.data.len()]
            }
            opcodes::RES if pos >= 4 => self.config.device_id as u8,
            opcodes::REMS if pos >= 4 => {
                if (pos - 4) % 2 == 0 {
                    self.config.manufacturer_id
                } else {
                    self.config.device_id as u8
                }
            }
            opcodes::RDID => match pos {
                1 => self.config.manufacturer_id,
                2 => (self.config.device_id >> 8) as u8,
                3 => self.config.device_id as u8,
                _ => 0x00,
            },
            _ => 0x00,
        }
    }

    /// Deselect, committing any buffered mutating command.
    fn deselect(&mut self) {
        self.selected = false;
        match self.buf.first().copied() {
            Some(opcodes::WREN) => self.status |= WEL,
            Some(opcodes::WRDI) => self.status &= !WEL,
            Some(opcodes::WRSR) if self.status & WEL != 0 && self.buf.len() >= 2 => {
                self.status = self.buf[1] & !(WIP | WEL) | (self.status & WEL);
                self.finish_write();
            }
            Some(opcodes::PP) if self.status & WEL != 0 && self.buf.len() >= 4 => {
                let addr = self.buf_addr();
                let len = self.buf.len() - 4;
                for (i, &byte) in self.buf[4..].iter().enumerate() {
                    let idx = (addr + i) % self.data.len();
                    // NOR programming only clears bits.
                    self.data[idx] &= byte;
                }
                self.programs.push((addr as u32, len));
                self.finish_write();
            }
            Some(opcodes::SE) if self.status & WEL != 0 && self.buf.len() >= 4 => {
                self.erase(self.buf_addr(), self.config.sector_size);
            }
            Some(opcodes::BE) if self.status & WEL != 0 && self.buf.len() >= 4 => {
                self.erase(self.buf_addr(), self.config.block_size);
            }
            Some(opcodes::CE) if self.status & WEL != 0 => {
                self.data.fill(0xFF);
                self.erases.push(0);
                self.finish_write();
            }
            _ => {}
        }
        self.buf.clear();
    }

    fn erase(&mut self, addr: usize, granule: usize) {
        let start = addr & !(granule - 1);
        let end = (start + granule).min(self.data.len());
        self.data[start..end].fill(0xFF);
        self.erases.push(start as u32);
        self.finish_write();
    }

    fn finish_write(&mut self) {
        self.wip_remaining = self.config.busy_polls;
        if !self.config.fail_writes {
            self.status &= !WEL;
        }
    }
}

/// An emulated ECP5 TAP with an attached flash.
pub struct DummyEcp5 {
    state: TapState,
    ir: u8,
    passthrough: bool,
    dr_shifts: u8,
    spi: SpiNor,
    ir_log: Vec<u8>,
    idle_cycles: u64,
}

impl DummyEcp5 {
    pub fn new(config: DummyConfig) -> Self {
        DummyEcp5 {
            state: TapState::Reset,
            ir: 0xFF,
            passthrough: false,
            dr_shifts: 0,
            spi: SpiNor::new(config),
            ir_log: Vec::new(),
            idle_cycles: 0,
        }
    }

    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Pre-load the flash array with `data` starting at `addr`.
    pub fn with_data(mut self, addr: u32, data: &[u8]) -> Self {
        let addr = addr as usize;
        self.spi.data[addr..addr + data.len()].copy_from_slice(data);
        self
    }

    pub fn config(&self) -> &DummyConfig {
        &self.spi.config
    }

    pub fn data(&self) -> &[u8] {
        &self.spi.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.spi.data
    }

    /// Raw flash status register.
    pub fn status(&self) -> u8 {
        self.spi.status
    }

    /// Every instruction shifted through the IR, in order.
    pub fn ir_log(&self) -> &[u8] {
        &self.ir_log
    }

    /// Total Run-Test/Idle cycles requested so far.
    pub fn idle_cycles(&self) -> u64 {
        self.idle_cycles
    }

    pub fn passthrough(&self) -> bool {
        self.passthrough
    }

    /// Erase start addresses, in commit order. Chip erase records 0.
    pub fn erases(&self) -> &[u32] {
        &self.spi.erases
    }

    /// Page-program commits as `(addr, len)` pairs, in order.
    pub fn programs(&self) -> &[(u32, usize)] {
        &self.spi.programs
    }

    fn bad_state(&self, op: &str) -> Error {
        Error::Transport(
            format!("{op} in TAP state {:?}", self.state).into(),
        )
    }
}

impl JtagPort for DummyEcp5 {
    fn test_reset(&mut self) -> Result<()> {
        self.state = TapState::Reset;
        self.ir = 0xFF;
        // Reset disarms the passthrough; a new session re-arms it with
        // the magic DR pattern.
        self.passthrough = false;
        self.dr_shifts = 0;
        if self.spi.selected {
            self.spi.deselect();
        }
        Ok(())
    }

    fn enter_run_test_idle(&mut self) -> Result<()> {
        self.state = TapState::Idle;
        Ok(())
    }

    fn enter_shift_ir(&mut self) -> Result<()> {
        self.state = TapState::ShiftIr;
        Ok(())
    }

    fn enter_pause_ir(&mut self) -> Result<()> {
        if self.state != TapState::ShiftIr {
            return Err(self.bad_state("pause-IR"));
        }
        self.state = TapState::PauseIr;
        Ok(())
    }

    fn enter_shift_dr(&mut self) -> Result<()> {
        self.state = TapState::ShiftDr;
        if self.passthrough && self.dr_shifts == 0 {
            self.spi.select();
        }
        Ok(())
    }

    fn enter_pause_dr(&mut self) -> Result<()> {
        if self.state != TapState::ShiftDr {
            return Err(self.bad_state("pause-DR"));
        }
        self.state = TapState::PauseDr;
        // The shift that arms the passthrough sets the flag mid-cycle;
        // only count shifts of an actually selected transaction.
        if self.passthrough && self.spi.selected {
            self.dr_shifts += 1;
            if self.dr_shifts == 2 {
                self.spi.deselect();
                self.dr_shifts = 0;
            }
        }
        Ok(())
    }

    fn shift_tdi(&mut self, bits: &[bool]) -> Result<()> {
        self.shift_tdio(bits).map(drop)
    }

    fn shift_tdio(&mut self, bits: &[bool]) -> Result<Vec<bool>> {
        match self.state {
            TapState::ShiftIr => {
                let bytes = ir_bytes(bits)?;
                if let Some(&instruction) = bytes.first() {
                    self.ir = instruction;
                    self.ir_log.push(instruction);
                    log::trace!("IR <- {instruction:#04x}");
                }
                Ok(vec![false; bits.len()])
            }
            TapState::ShiftDr if self.passthrough => {
                let output = self.spi.clock(&cmd_bytes(bits)?);
                Ok(cmd_bits(&output))
            }
            TapState::ShiftDr => {
                match self.ir {
                    // IDCODE, LSb first.
                    0xE0 => Ok((0..bits.len())
                        .map(|i| i < 32 && self.spi.config.idcode >> i & 1 == 1)
                        .collect()),
                    0x3A => {
                        if ir_bytes(bits)? == [0x68, 0xFE] {
                            self.passthrough = true;
                            log::debug!("passthrough armed");
                        }
                        Ok(vec![false; bits.len()])
                    }
                    _ => Ok(vec![false; bits.len()]),
                }
            }
            _ => Err(self.bad_state("shift")),
        }
    }

    fn run_test_idle(&mut self, cycles: u32) -> Result<()> {
        self.state = TapState::Idle;
        self.idle_cycles += u64::from(cycles);
        Ok(())
    }
}
