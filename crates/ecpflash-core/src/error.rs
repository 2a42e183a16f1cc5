//! Error types for ecpflash-core.

/// Errors raised by the passthrough and flash command layers.
///
/// Transport failures are propagated unchanged; the only retry anywhere
/// in the stack is the single status double-read inside the
/// write-in-progress guard.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The underlying JTAG transport reported a communication failure.
    #[error("transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A mutating command finished with the write-enable latch still set
    /// and write-in-progress clear on two consecutive status reads.
    #[error("{command} command failed (status {status:#010b})")]
    CommandFailed { command: &'static str, status: u8 },

    /// The write-in-progress poll exceeded the configured bound.
    #[error("{command} command still busy after {polls} status polls")]
    PollTimeout { command: &'static str, polls: u32 },

    /// Read-back contents differ from the expected data.
    #[error("first differing byte at {addr:#010x} (expected {expected:#04x}, actual {actual:#04x})")]
    VerifyMismatch { addr: u32, expected: u8, actual: u8 },

    /// A hex nibble string contained a non-hex character.
    #[error("invalid hex digit {0:?}")]
    InvalidHex(char),

    /// A captured bit sequence cannot be packed back into bytes.
    #[error("bit sequence length {len} is not a multiple of 8")]
    UnalignedBits { len: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
