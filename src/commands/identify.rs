//! Identify command implementation

use ecpflash_core::{Flash, JtagPort};

pub fn run_identify<P: JtagPort>(flash: &mut Flash<P>) -> Result<(), Box<dyn std::error::Error>> {
    let device_id = flash.read_device_id()?;
    let (mfr_id, dev_id) = flash.read_manufacturer_device_id()?;
    let (jedec_mfr, jedec_dev) = flash.read_manufacturer_long_device_id()?;

    println!("device ID:              {:#04x}", device_id);
    println!("manufacturer/device ID: {:#04x} {:#04x}", mfr_id, dev_id);
    println!("JEDEC ID:               {:#04x} {:#06x}", jedec_mfr, jedec_dev);
    Ok(())
}
