//! ecpflash-core
//!
//! Protocol engine for programming SPI-NOR flash chips attached behind a
//! Lattice ECP5 FPGA's JTAG port, using the FPGA's background SPI
//! passthrough mode.
//!
//! The JTAG link layer itself is an external collaborator: callers supply
//! any [`jtag::JtagPort`] implementation (a hardware probe, or the
//! in-memory emulator from `ecpflash-dummy`) and this crate drives it
//! through passthrough entry ([`Ecp5::into_flash`]) and the SPI-NOR
//! command set ([`Flash`]).
//!
//! The whole stack is strictly sequential: one SPI transaction at a time,
//! exclusive ownership of the port for the duration of a session.

pub mod bits;
pub mod ecp5;
pub mod error;
pub mod flash;
pub mod jtag;
pub mod opcodes;
pub mod progress;
pub mod spi;

pub use ecp5::Ecp5;
pub use error::{Error, Result};
pub use flash::{Flash, Status};
pub use jtag::JtagPort;
pub use progress::{NoProgress, OffsetProgress, ProgressSink};
pub use spi::SpiCommand;
