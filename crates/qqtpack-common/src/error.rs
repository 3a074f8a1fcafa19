//! Error types for qqtpack-common.

use thiserror::Error;

/// Common error type for qqtpack operations.
#[derive(Debug, Error)]
pub enum Error {
    /// End of stream reached while reading.
    #[error(
        "unexpected end of stream at offset {position}: needed {needed} bytes but only {available} available"
    )]
    UnexpectedEof {
        position: u64,
        needed: u64,
        available: u64,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bytes that do not form valid text in the given charset.
    #[error("invalid {encoding} text: {bytes:02x?}")]
    Decode {
        encoding: &'static str,
        bytes: Vec<u8>,
    },
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
