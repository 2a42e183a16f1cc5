//! CLI argument parsing

use crate::programmers;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Parse an integer with an optional 0x/0o/0b radix prefix.
fn parse_int(s: &str) -> Result<u32, String> {
    let (radix, digits) = match s.get(..2) {
        Some("0x") | Some("0X") => (16, &s[2..]),
        Some("0o") | Some("0O") => (8, &s[2..]),
        Some("0b") | Some("0B") => (2, &s[2..]),
        _ => (10, s),
    };
    u32::from_str_radix(digits, radix).map_err(|e| format!("invalid number: {}", e))
}

/// Parse block-protect bits given in binary, e.g. "0110".
fn parse_bits(s: &str) -> Result<u8, String> {
    let bits = u8::from_str_radix(s, 2).map_err(|e| format!("invalid binary value: {}", e))?;
    if bits > 0b1111 {
        return Err("block protect bits are limited to 4 bits".to_string());
    }
    Ok(bits)
}

/// Generate dynamic help text for the programmer argument
fn programmer_help() -> String {
    format!("Programmer to use [available: {}]", programmers::names())
}

#[derive(Parser)]
#[command(name = "ecpflash")]
#[command(author, version, about = "SPI flash programmer for chips behind a Lattice ECP5", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Programmer to use
    #[arg(short, long, global = true, default_value = "dummy", help = programmer_help())]
    pub programmer: String,

    /// JTAG clock frequency in kHz, used to scale settle times
    #[arg(long, global = true, default_value_t = 1000)]
    pub freq: u32,

    /// Give up after this many busy polls per operation (unbounded if unset)
    #[arg(long, global = true)]
    pub poll_limit: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Data to operate on: an inline hex string or a file
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct DataArgs {
    /// Inline data as a hex string
    #[arg(short, long)]
    pub data: Option<String>,

    /// Read data from a file
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the flash chip's identification registers
    Identify,

    /// Read flash contents
    Read {
        /// Start address
        #[arg(value_parser = parse_int)]
        address: u32,

        /// Number of bytes to read
        #[arg(value_parser = parse_int)]
        length: u32,

        /// Write contents to a file instead of printing hex
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Bytes per read command
        #[arg(long, value_parser = parse_int)]
        chunk_size: Option<u32>,
    },

    /// Read flash contents using the fast-read opcode
    FastRead {
        /// Start address
        #[arg(value_parser = parse_int)]
        address: u32,

        /// Number of bytes to read
        #[arg(value_parser = parse_int)]
        length: u32,

        /// Write contents to a file instead of printing hex
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Bytes per read command
        #[arg(long, value_parser = parse_int)]
        chunk_size: Option<u32>,
    },

    /// Program a single page
    ProgramPage {
        /// Start address; the data must not cross a page boundary
        #[arg(value_parser = parse_int)]
        address: u32,

        #[command(flatten)]
        data: DataArgs,
    },

    /// Program data of arbitrary length, split on page boundaries
    Program {
        /// Start address
        #[arg(value_parser = parse_int)]
        address: u32,

        #[command(flatten)]
        data: DataArgs,

        /// Page size of the chip in bytes
        #[arg(short = 'P', long, default_value_t = 256, value_parser = parse_int)]
        page_size: u32,
    },

    /// Erase the sectors containing the given addresses
    EraseSector {
        /// Addresses inside the sectors to erase
        #[arg(value_parser = parse_int, required = true)]
        addresses: Vec<u32>,
    },

    /// Erase the blocks containing the given addresses
    EraseBlock {
        /// Addresses inside the blocks to erase
        #[arg(value_parser = parse_int, required = true)]
        addresses: Vec<u32>,
    },

    /// Erase the whole chip
    EraseChip,

    /// Erase and program data of arbitrary length, preserving the
    /// untouched contents of partially covered sectors
    EraseProgram {
        /// Start address
        #[arg(value_parser = parse_int)]
        address: u32,

        #[command(flatten)]
        data: DataArgs,

        /// Sector size of the chip in bytes (must be a power of two)
        #[arg(short = 'S', long, default_value_t = 4096, value_parser = parse_int)]
        sector_size: u32,

        /// Page size of the chip in bytes
        #[arg(short = 'P', long, default_value_t = 256, value_parser = parse_int)]
        page_size: u32,
    },

    /// Show or set the block protect bits
    Protect {
        /// New block protect bits, in binary (e.g. 0110); omit to show
        #[arg(value_parser = parse_bits)]
        bits: Option<u8>,
    },

    /// Verify flash contents against the given data
    Verify {
        /// Start address
        #[arg(value_parser = parse_int)]
        address: u32,

        #[command(flatten)]
        data: DataArgs,
    },

    /// List available programmers
    ListProgrammers,
}

impl Commands {
    /// Whether the command writes to the flash array or its status
    /// register.
    pub fn mutates(&self) -> bool {
        matches!(
            self,
            Commands::ProgramPage { .. }
                | Commands::Program { .. }
                | Commands::EraseSector { .. }
                | Commands::EraseBlock { .. }
                | Commands::EraseChip
                | Commands::EraseProgram { .. }
                | Commands::Protect { bits: Some(_) }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_int_accepts_radix_prefixes() {
        assert_eq!(parse_int("0x1000").unwrap(), 0x1000);
        assert_eq!(parse_int("0b101").unwrap(), 5);
        assert_eq!(parse_int("0o17").unwrap(), 15);
        assert_eq!(parse_int("42").unwrap(), 42);
        assert!(parse_int("0xZZ").is_err());
    }

    #[test]
    fn parse_bits_is_binary_and_bounded() {
        assert_eq!(parse_bits("0110").unwrap(), 0b0110);
        assert_eq!(parse_bits("1111").unwrap(), 0b1111);
        assert!(parse_bits("10000").is_err());
        assert!(parse_bits("12").is_err());
    }

    #[test]
    fn mutating_commands_are_flagged() {
        assert!(Commands::EraseChip.mutates());
        assert!(Commands::Protect { bits: Some(0b0011) }.mutates());
        assert!(!Commands::Protect { bits: None }.mutates());
        assert!(!Commands::Identify.mutates());
    }
}
