//! Program command implementations

use super::BarProgress;
use ecpflash_core::{Flash, JtagPort};

pub fn run_program_page<P: JtagPort>(
    flash: &mut Flash<P>,
    address: u32,
    data: &[u8],
) -> Result<(), Box<dyn std::error::Error>> {
    flash.write_enable()?;
    flash.page_program(address, data)?;
    log::info!("programmed {} bytes at {:#08x}", data.len(), address);
    Ok(())
}

pub fn run_program<P: JtagPort>(
    flash: &mut Flash<P>,
    address: u32,
    data: &[u8],
    page_size: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut progress = BarProgress::new();
    flash.program(address, data, page_size, &mut progress)?;
    log::info!("programmed {} bytes at {:#08x}", data.len(), address);
    Ok(())
}

pub fn run_erase_program<P: JtagPort>(
    flash: &mut Flash<P>,
    address: u32,
    data: &[u8],
    sector_size: usize,
    page_size: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    if !sector_size.is_power_of_two() {
        return Err(format!("sector size {} is not a power of two", sector_size).into());
    }
    let mut progress = BarProgress::new();
    flash.erase_program(address, data, sector_size, page_size, &mut progress)?;
    log::info!("erase-programmed {} bytes at {:#08x}", data.len(), address);
    Ok(())
}
