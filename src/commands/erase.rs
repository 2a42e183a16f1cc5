//! Erase command implementations

use ecpflash_core::{Flash, JtagPort};

pub fn run_erase_sector<P: JtagPort>(
    flash: &mut Flash<P>,
    addresses: &[u32],
) -> Result<(), Box<dyn std::error::Error>> {
    for &address in addresses {
        flash.write_enable()?;
        flash.sector_erase(address)?;
        log::info!("erased sector at {:#08x}", address);
    }
    Ok(())
}

pub fn run_erase_block<P: JtagPort>(
    flash: &mut Flash<P>,
    addresses: &[u32],
) -> Result<(), Box<dyn std::error::Error>> {
    for &address in addresses {
        flash.write_enable()?;
        flash.block_erase(address)?;
        log::info!("erased block at {:#08x}", address);
    }
    Ok(())
}

pub fn run_erase_chip<P: JtagPort>(
    flash: &mut Flash<P>,
) -> Result<(), Box<dyn std::error::Error>> {
    flash.write_enable()?;
    flash.chip_erase()?;
    log::info!("erased chip");
    Ok(())
}
