//! Read command implementation

use super::BarProgress;
use ecpflash_core::bits::bytes_to_hex;
use ecpflash_core::{Flash, JtagPort};
use std::path::Path;

pub fn run_read<P: JtagPort>(
    flash: &mut Flash<P>,
    address: u32,
    length: usize,
    chunk_size: Option<usize>,
    fast: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut progress = BarProgress::new();
    let data = if fast {
        flash.fast_read(address, length, chunk_size, &mut progress)?
    } else {
        flash.read(address, length, chunk_size, &mut progress)?
    };

    match output {
        Some(path) => {
            std::fs::write(path, &data)?;
            log::info!("wrote {} bytes to {}", data.len(), path.display());
        }
        None => println!("{}", bytes_to_hex(&data)),
    }
    Ok(())
}
