//! Programmer backends: anything that can provide a JTAG port to the
//! ECP5 whose flash we are driving.

use ecpflash_core::JtagPort;

/// Available backends as `(name, description)` pairs.
pub fn programmers() -> Vec<(&'static str, &'static str)> {
    let mut list: Vec<(&'static str, &'static str)> = Vec::new();
    #[cfg(feature = "dummy")]
    list.push(("dummy", "In-memory ECP5 + flash emulator (no hardware)"));
    list
}

/// Comma-separated backend names for help text.
pub fn names() -> String {
    programmers()
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Open the named backend.
pub fn open(name: &str) -> Result<Box<dyn JtagPort + Send>, Box<dyn std::error::Error>> {
    match name {
        #[cfg(feature = "dummy")]
        "dummy" => Ok(Box::new(ecpflash_dummy::DummyEcp5::new_default())),
        other => Err(format!("unknown programmer '{}' (available: {})", other, names()).into()),
    }
}
