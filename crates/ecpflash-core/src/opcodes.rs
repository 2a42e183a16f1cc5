//! SPI-NOR flash opcodes used by the command layer.
//!
//! Standard JEDEC opcodes; the 25-series command set.

/// Write Enable - required before any write/erase operation
pub const WREN: u8 = 0x06;
/// Write Disable - clears WEL bit in status register
pub const WRDI: u8 = 0x04;

/// Read Status Register
pub const RDSR: u8 = 0x05;
/// Write Status Register
pub const WRSR: u8 = 0x01;

/// Read Electronic Signature / Release from Deep Power Down
pub const RES: u8 = 0xAB;
/// Read Electronic Manufacturer & Device ID (legacy)
pub const REMS: u8 = 0x90;
/// Read JEDEC ID (manufacturer + 16-bit device ID)
pub const RDID: u8 = 0x9F;

/// Read Data
pub const READ: u8 = 0x03;
/// Fast Read (one dummy byte before data)
pub const FAST_READ: u8 = 0x0B;

/// Page Program
pub const PP: u8 = 0x02;

/// Sector Erase
pub const SE: u8 = 0x20;
/// Block Erase
pub const BE: u8 = 0x52;
/// Chip Erase
pub const CE: u8 = 0x60;

/// Deep Power Down
pub const DP: u8 = 0xB9;
