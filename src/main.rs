//! ecpflash - SPI flash programmer for chips behind a Lattice ECP5
//!
//! Drives a SPI-NOR flash attached to an ECP5 FPGA through the FPGA's
//! JTAG port: the configuration logic is put into background SPI
//! passthrough mode, after which plain JTAG data shifts reach the flash
//! die directly. No bitstream is loaded and no sideband wiring is
//! needed beyond the JTAG header.

mod cli;
mod commands;
mod programmers;

use clap::Parser;
use cli::{Cli, Commands};
use ecpflash_core::Ecp5;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Verbosity raises the default filter; RUST_LOG still wins.
    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Commands::ListProgrammers = cli.command {
        commands::list_programmers();
        return Ok(());
    }

    let port = programmers::open(&cli.programmer)?;
    let mut flash = Ecp5::new(port, cli.freq).into_flash()?;
    if let Some(limit) = cli.poll_limit {
        flash = flash.with_poll_limit(limit);
    }
    flash.wakeup()?;

    if cli.command.mutates() {
        let bp = flash.block_protect()?;
        if bp != 0 {
            log::warn!(
                "block protect bits are set to {:04b}; protected parts of the flash will not be modified",
                bp
            );
        }
    }

    match cli.command {
        Commands::Identify => commands::run_identify(&mut flash),
        Commands::Read {
            address,
            length,
            output,
            chunk_size,
        } => commands::run_read(
            &mut flash,
            address,
            length as usize,
            chunk_size.map(|c| c as usize),
            false,
            output.as_deref(),
        ),
        Commands::FastRead {
            address,
            length,
            output,
            chunk_size,
        } => commands::run_read(
            &mut flash,
            address,
            length as usize,
            chunk_size.map(|c| c as usize),
            true,
            output.as_deref(),
        ),
        Commands::ProgramPage { address, data } => {
            let data = commands::load_data(&data)?;
            commands::run_program_page(&mut flash, address, &data)
        }
        Commands::Program {
            address,
            data,
            page_size,
        } => {
            let data = commands::load_data(&data)?;
            commands::run_program(&mut flash, address, &data, page_size as usize)
        }
        Commands::EraseSector { addresses } => commands::run_erase_sector(&mut flash, &addresses),
        Commands::EraseBlock { addresses } => commands::run_erase_block(&mut flash, &addresses),
        Commands::EraseChip => commands::run_erase_chip(&mut flash),
        Commands::EraseProgram {
            address,
            data,
            sector_size,
            page_size,
        } => {
            let data = commands::load_data(&data)?;
            commands::run_erase_program(
                &mut flash,
                address,
                &data,
                sector_size as usize,
                page_size as usize,
            )
        }
        Commands::Protect { bits } => commands::run_protect(&mut flash, bits),
        Commands::Verify { address, data } => {
            let data = commands::load_data(&data)?;
            commands::run_verify(&mut flash, address, &data)
        }
        // Handled before the session is opened.
        Commands::ListProgrammers => Ok(()),
    }
}
