//! Protect command implementation

use ecpflash_core::{Flash, JtagPort};

pub fn run_protect<P: JtagPort>(
    flash: &mut Flash<P>,
    bits: Option<u8>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(bits) = bits {
        flash.set_block_protect(bits)?;
    }
    println!("block protect bits: {:04b}", flash.block_protect()?);
    Ok(())
}
