//! SPI transaction framing over the JTAG passthrough.
//!
//! With the passthrough armed, every DR shift clocks bits straight
//! through to the flash. A transaction is always exactly two DR shift
//! cycles: one carrying the command frame, one clocking zeros while the
//! response is captured. The second shift happens even for commands
//! with no response so that every transaction has the same TAP
//! footprint.

use crate::bits::{bytes_to_hex, cmd_bits, cmd_bytes};
use crate::error::Result;
use crate::jtag::JtagPort;

/// One SPI-NOR command frame: opcode, optional 24-bit address, payload
/// and dummy bytes, plus the expected response length.
#[derive(Debug, Clone, Copy)]
pub struct SpiCommand<'a> {
    pub opcode: u8,
    pub address: Option<u32>,
    pub data: &'a [u8],
    pub dummy: usize,
    pub response_len: usize,
}

impl<'a> SpiCommand<'a> {
    /// A bare opcode with no address, payload, or response.
    pub fn simple(opcode: u8) -> Self {
        SpiCommand {
            opcode,
            address: None,
            data: &[],
            dummy: 0,
            response_len: 0,
        }
    }

    /// Read a register: opcode followed by `response_len` response bytes.
    pub fn read_reg(opcode: u8, response_len: usize) -> Self {
        SpiCommand {
            response_len,
            ..Self::simple(opcode)
        }
    }

    /// Write a register: opcode followed by `data`.
    pub fn write_reg(opcode: u8, data: &'a [u8]) -> Self {
        SpiCommand {
            data,
            ..Self::simple(opcode)
        }
    }

    /// Addressed read: opcode, 24-bit address, `dummy` turnaround bytes,
    /// then `response_len` response bytes.
    pub fn read_3b(opcode: u8, address: u32, dummy: usize, response_len: usize) -> Self {
        SpiCommand {
            opcode,
            address: Some(address),
            data: &[],
            dummy,
            response_len,
        }
    }

    /// Addressed write: opcode, 24-bit address, then `data`.
    pub fn write_3b(opcode: u8, address: u32, data: &'a [u8]) -> Self {
        SpiCommand {
            opcode,
            address: Some(address),
            data,
            dummy: 0,
            response_len: 0,
        }
    }

    /// Addressed erase: opcode and 24-bit address only.
    pub fn erase_3b(opcode: u8, address: u32) -> Self {
        SpiCommand {
            opcode,
            address: Some(address),
            data: &[],
            dummy: 0,
            response_len: 0,
        }
    }

    /// Override the number of dummy bytes.
    pub fn with_dummy(mut self, dummy: usize) -> Self {
        self.dummy = dummy;
        self
    }

    /// Serialize the command frame: opcode, big-endian address bytes,
    /// payload, then zero-filled dummy bytes.
    pub(crate) fn frame(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(1 + 3 + self.data.len() + self.dummy);
        frame.push(self.opcode);
        if let Some(addr) = self.address {
            frame.extend_from_slice(&addr.to_be_bytes()[1..]);
        }
        frame.extend_from_slice(self.data);
        frame.extend(std::iter::repeat(0).take(self.dummy));
        frame
    }
}

/// Execute one SPI transaction and return the response bytes.
pub fn transceive<P: JtagPort + ?Sized>(port: &mut P, cmd: &SpiCommand) -> Result<Vec<u8>> {
    let frame = cmd.frame();
    log::trace!(
        "spi xfer opcode {:#04x} frame {} response {}B",
        cmd.opcode,
        bytes_to_hex(&frame),
        cmd.response_len
    );

    port.enter_shift_dr()?;
    port.shift_tdi(&cmd_bits(&frame))?;
    port.enter_pause_dr()?;

    port.enter_shift_dr()?;
    let captured = port.shift_tdio(&cmd_bits(&vec![0u8; cmd.response_len]))?;
    port.enter_pause_dr()?;

    cmd_bytes(&captured)
}
