//! Verify command implementation

use super::BarProgress;
use ecpflash_core::{Flash, JtagPort};

pub fn run_verify<P: JtagPort>(
    flash: &mut Flash<P>,
    address: u32,
    expected: &[u8],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut progress = BarProgress::new();
    flash.verify(address, expected, &mut progress)?;
    println!("verify PASS");
    Ok(())
}
