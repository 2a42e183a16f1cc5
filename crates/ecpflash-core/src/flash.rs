//! SPI-NOR flash command and bulk operation layers.
//!
//! [`Flash`] owns the JTAG port after passthrough entry and exposes the
//! 25-series command set plus page-aware bulk operations. Geometry
//! (page, sector, block sizes) is supplied by the caller per operation;
//! nothing here probes the chip beyond its ID registers.

use crate::error::{Error, Result};
use crate::jtag::JtagPort;
use crate::opcodes;
use crate::progress::{NoProgress, OffsetProgress, ProgressSink};
use crate::spi::{self, SpiCommand};

/// Default chunk size for bulk reads, in bytes.
pub const DEFAULT_READ_CHUNK: usize = 255;

bitflags::bitflags! {
    /// SPI-NOR status register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u8 {
        /// Write in progress.
        const WIP = 1 << 0;
        /// Write enable latch.
        const WEL = 1 << 1;
        const BP0 = 1 << 2;
        const BP1 = 1 << 3;
        const BP2 = 1 << 4;
        const BP3 = 1 << 5;
        /// Continuous program mode.
        const CP = 1 << 6;
        /// Erase/program error.
        const ERR = 1 << 7;

        const BP_MASK = 0b0011_1100;
    }
}

impl Status {
    /// The four block-protect bits as a value in `0..=15`.
    pub fn block_protect(self) -> u8 {
        (self.bits() & Self::BP_MASK.bits()) >> 2
    }

    /// Replace the block-protect bits, leaving the rest untouched.
    pub fn with_block_protect(self, bp: u8) -> Self {
        let bits = (self.bits() & !Self::BP_MASK.bits()) | (bp << 2 & Self::BP_MASK.bits());
        Self::from_bits_retain(bits)
    }
}

/// A SPI-NOR flash session over an armed passthrough.
pub struct Flash<P> {
    port: P,
    poll_limit: Option<u32>,
}

impl<P: JtagPort> Flash<P> {
    pub(crate) fn new(port: P) -> Self {
        Flash {
            port,
            poll_limit: None,
        }
    }

    /// Bound the number of write-in-progress polls per operation.
    /// Unbounded by default, since erase times vary by orders of
    /// magnitude across chips.
    pub fn with_poll_limit(mut self, polls: u32) -> Self {
        self.poll_limit = Some(polls);
        self
    }

    /// Give the port back. The passthrough stays armed.
    pub fn release(self) -> P {
        self.port
    }

    fn transceive(&mut self, cmd: &SpiCommand) -> Result<Vec<u8>> {
        spi::transceive(&mut self.port, cmd)
    }

    /// Release from deep power-down. The extra dummy byte stretches the
    /// wakeup past the recovery time of slower chips.
    pub fn wakeup(&mut self) -> Result<()> {
        self.transceive(&SpiCommand::simple(opcodes::RES).with_dummy(4))?;
        Ok(())
    }

    /// Enter deep power-down.
    pub fn deep_sleep(&mut self) -> Result<()> {
        self.transceive(&SpiCommand::simple(opcodes::DP))?;
        Ok(())
    }

    pub fn read_status(&mut self) -> Result<Status> {
        let resp = self.transceive(&SpiCommand::read_reg(opcodes::RDSR, 1))?;
        let status = Status::from_bits_retain(resp[0]);
        log::trace!("status {:#010b}", status.bits());
        Ok(status)
    }

    pub fn write_enable(&mut self) -> Result<()> {
        self.transceive(&SpiCommand::simple(opcodes::WREN))?;
        Ok(())
    }

    pub fn write_disable(&mut self) -> Result<()> {
        self.transceive(&SpiCommand::simple(opcodes::WRDI))?;
        Ok(())
    }

    /// Whether a write or erase is still running.
    ///
    /// A status read can race the chip's completion of the operation, so
    /// a WEL-set/WIP-clear reading is confirmed with a second read before
    /// it is treated as a failed command.
    pub fn write_in_progress(&mut self, command: &'static str) -> Result<bool> {
        let mut status = self.read_status()?;
        if status.contains(Status::WEL) && !status.contains(Status::WIP) {
            status = self.read_status()?;
            if status.contains(Status::WEL) && !status.contains(Status::WIP) {
                return Err(Error::CommandFailed {
                    command,
                    status: status.bits(),
                });
            }
        }
        Ok(status.contains(Status::WIP))
    }

    fn wait_ready(&mut self, command: &'static str) -> Result<()> {
        let mut polls = 0u32;
        while self.write_in_progress(command)? {
            polls += 1;
            if let Some(limit) = self.poll_limit {
                if polls >= limit {
                    return Err(Error::PollTimeout { command, polls });
                }
            }
        }
        Ok(())
    }

    /// Write the status register. Requires a prior [`write_enable`].
    ///
    /// [`write_enable`]: Flash::write_enable
    pub fn write_status(&mut self, status: Status) -> Result<()> {
        self.transceive(&SpiCommand::write_reg(opcodes::WRSR, &[status.bits()]))?;
        self.wait_ready("WRITE STATUS")
    }

    /// Read the legacy electronic signature (device ID byte).
    pub fn read_device_id(&mut self) -> Result<u8> {
        let resp = self.transceive(&SpiCommand::read_reg(opcodes::RES, 1).with_dummy(3))?;
        Ok(resp[0])
    }

    /// Read the legacy manufacturer and device ID bytes.
    pub fn read_manufacturer_device_id(&mut self) -> Result<(u8, u8)> {
        let resp = self.transceive(&SpiCommand::read_reg(opcodes::REMS, 2).with_dummy(3))?;
        Ok((resp[0], resp[1]))
    }

    /// Read the JEDEC ID: manufacturer byte and 16-bit device ID.
    pub fn read_manufacturer_long_device_id(&mut self) -> Result<(u8, u16)> {
        let resp = self.transceive(&SpiCommand::read_reg(opcodes::RDID, 3))?;
        Ok((resp[0], u16::from_be_bytes([resp[1], resp[2]])))
    }

    fn read_command(
        &mut self,
        opcode: u8,
        addr: u32,
        length: usize,
        chunk_size: Option<usize>,
        dummy: usize,
        progress: &mut dyn ProgressSink,
    ) -> Result<Vec<u8>> {
        let chunk_size = chunk_size.unwrap_or(DEFAULT_READ_CHUNK);
        let mut data = Vec::with_capacity(length);
        while data.len() < length {
            let addr = addr + data.len() as u32;
            let chunk = chunk_size.min(length - data.len());
            let status = format!("reading address {addr:#08x}");
            progress.report(data.len(), length, Some(status.as_str()));
            data.extend(self.transceive(&SpiCommand::read_3b(opcode, addr, dummy, chunk))?);
        }
        progress.report(length, length, None);
        Ok(data)
    }

    /// Read `length` bytes starting at `addr`, in chunks of at most
    /// `chunk_size` (default [`DEFAULT_READ_CHUNK`]).
    pub fn read(
        &mut self,
        addr: u32,
        length: usize,
        chunk_size: Option<usize>,
        progress: &mut dyn ProgressSink,
    ) -> Result<Vec<u8>> {
        self.read_command(opcodes::READ, addr, length, chunk_size, 0, progress)
    }

    /// Like [`read`](Flash::read), but with the fast-read opcode and its
    /// one dummy byte per chunk.
    pub fn fast_read(
        &mut self,
        addr: u32,
        length: usize,
        chunk_size: Option<usize>,
        progress: &mut dyn ProgressSink,
    ) -> Result<Vec<u8>> {
        self.read_command(opcodes::FAST_READ, addr, length, chunk_size, 1, progress)
    }

    /// Program up to one page. `addr + data.len()` must stay within the
    /// page, or the chip wraps. Requires a prior write-enable.
    pub fn page_program(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        self.transceive(&SpiCommand::write_3b(opcodes::PP, addr, data))?;
        self.wait_ready("PAGE PROGRAM")
    }

    /// Erase the sector containing `addr`. Requires a prior write-enable.
    pub fn sector_erase(&mut self, addr: u32) -> Result<()> {
        self.transceive(&SpiCommand::erase_3b(opcodes::SE, addr))?;
        self.wait_ready("SECTOR ERASE")
    }

    /// Erase the block containing `addr`. Requires a prior write-enable.
    pub fn block_erase(&mut self, addr: u32) -> Result<()> {
        self.transceive(&SpiCommand::erase_3b(opcodes::BE, addr))?;
        self.wait_ready("BLOCK ERASE")
    }

    /// Erase the entire chip. Requires a prior write-enable.
    pub fn chip_erase(&mut self) -> Result<()> {
        self.transceive(&SpiCommand::simple(opcodes::CE))?;
        self.wait_ready("CHIP ERASE")
    }

    /// Program `data` at `addr`, splitting on page boundaries. The
    /// target range must already be erased.
    pub fn program(
        &mut self,
        addr: u32,
        data: &[u8],
        page_size: usize,
        progress: &mut dyn ProgressSink,
    ) -> Result<()> {
        let total = data.len();
        let mut rest = data;
        let mut done = 0usize;
        while !rest.is_empty() {
            let addr = addr + done as u32;
            let take = (page_size - addr as usize % page_size).min(rest.len());
            let (chunk, tail) = rest.split_at(take);
            let status = format!("programming page {addr:#08x}");
            progress.report(done, total, Some(status.as_str()));
            self.write_enable()?;
            self.page_program(addr, chunk)?;
            done += take;
            rest = tail;
        }
        progress.report(total, total, None);
        Ok(())
    }

    /// Program `data` at `addr` with read-modify-write on sector
    /// granularity: every touched sector is read back, merged with the
    /// new data, erased, and reprogrammed. Sectors whose merged contents
    /// are all `0xFF` are erased but not programmed. `sector_size` must
    /// be a power of two.
    pub fn erase_program(
        &mut self,
        addr: u32,
        data: &[u8],
        sector_size: usize,
        page_size: usize,
        progress: &mut dyn ProgressSink,
    ) -> Result<()> {
        let total = data.len();
        let mut rest = data;
        let mut done = 0usize;
        while !rest.is_empty() {
            let addr = addr + done as u32;
            let sector_start = addr & !(sector_size as u32 - 1);
            let offset = (addr - sector_start) as usize;
            let take = (sector_size - offset).min(rest.len());
            let (chunk, tail) = rest.split_at(take);

            let sector_data = if offset == 0 && take == sector_size {
                chunk.to_vec()
            } else {
                // Partially covered sector: splice the new bytes into its
                // current contents.
                let mut merged =
                    self.read(sector_start, sector_size, None, &mut NoProgress)?;
                merged[offset..offset + take].copy_from_slice(chunk);
                merged
            };

            let status = format!("erasing sector {sector_start:#08x}");
            progress.report(done, total, Some(status.as_str()));
            self.write_enable()?;
            self.sector_erase(sector_start)?;

            if sector_data.iter().any(|&b| b != 0xFF) {
                let mut nested = OffsetProgress::new(progress, done, total);
                self.program(sector_start, &sector_data, page_size, &mut nested)?;
            }
            done += take;
            rest = tail;
        }
        progress.report(total, total, None);
        Ok(())
    }

    /// Read back `expected.len()` bytes at `addr` and compare, reporting
    /// the first differing byte.
    pub fn verify(
        &mut self,
        addr: u32,
        expected: &[u8],
        progress: &mut dyn ProgressSink,
    ) -> Result<()> {
        let actual = self.read(addr, expected.len(), None, progress)?;
        for (offset, (&want, &got)) in expected.iter().zip(&actual).enumerate() {
            if want != got {
                return Err(Error::VerifyMismatch {
                    addr: addr + offset as u32,
                    expected: want,
                    actual: got,
                });
            }
        }
        log::debug!("verified {} bytes at {addr:#08x}", expected.len());
        Ok(())
    }

    /// The current block-protect bits.
    pub fn block_protect(&mut self) -> Result<u8> {
        Ok(self.read_status()?.block_protect())
    }

    /// Rewrite the block-protect bits, preserving the other status bits.
    pub fn set_block_protect(&mut self, bits: u8) -> Result<()> {
        let status = self.read_status()?.with_block_protect(bits);
        self.write_enable()?;
        self.write_status(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_protect_extracts_bp_field() {
        let status = Status::from_bits_retain(0b0010_1001);
        assert_eq!(status.block_protect(), 0b1010);
    }

    #[test]
    fn with_block_protect_preserves_other_bits() {
        let status = Status::from_bits_retain(0b1000_0011);
        let updated = status.with_block_protect(0b0101);
        assert_eq!(updated.bits(), 0b1001_0111);
        assert_eq!(updated.with_block_protect(0).bits(), 0b1000_0011);
    }

    #[test]
    fn with_block_protect_masks_excess_bits() {
        let status = Status::empty().with_block_protect(0xFF);
        assert_eq!(status.bits(), Status::BP_MASK.bits());
    }
}
