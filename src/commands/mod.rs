//! CLI command implementations
//!
//! Every command takes an open [`Flash`](ecpflash_core::Flash) session;
//! the passthrough entry and the pre-flight protect-bit check happen in
//! `main` before dispatch.

mod erase;
mod identify;
mod program;
mod protect;
mod read;
mod verify;

pub use erase::{run_erase_block, run_erase_chip, run_erase_sector};
pub use identify::run_identify;
pub use program::{run_erase_program, run_program, run_program_page};
pub use protect::run_protect;
pub use read::run_read;
pub use verify::run_verify;

use crate::cli::DataArgs;
use crate::programmers;
use ecpflash_core::bits::hex_to_bytes;
use ecpflash_core::ProgressSink;
use indicatif::{ProgressBar, ProgressStyle};

/// Load the payload of a data-carrying command.
pub fn load_data(args: &DataArgs) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    if let Some(path) = &args.file {
        Ok(std::fs::read(path)?)
    } else if let Some(hex) = &args.data {
        Ok(hex_to_bytes(hex)?)
    } else {
        // Unreachable through clap: the argument group requires one.
        Err("no data given".into())
    }
}

pub fn list_programmers() {
    println!("Available programmers:");
    for (name, description) in programmers::programmers() {
        println!("  {:12} {}", name, description);
    }
}

/// Progress reporter using an indicatif progress bar
pub(crate) struct BarProgress {
    bar: Option<ProgressBar>,
}

impl BarProgress {
    pub(crate) fn new() -> Self {
        Self { bar: None }
    }
}

impl ProgressSink for BarProgress {
    fn report(&mut self, done: usize, total: usize, status: Option<&str>) {
        let bar = self.bar.get_or_insert_with(|| {
            let bar = ProgressBar::new(total as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            bar
        });
        bar.set_position(done as u64);
        match status {
            Some(message) => bar.set_message(message.to_string()),
            None => bar.finish_with_message("done"),
        }
    }
}
