//! Error types for the IDX/PKG crate.

use thiserror::Error;

use crate::entry::EntryDescriptor;
use crate::extract::ExtractStage;

/// The index does not follow the IDX layout.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The leading u32 is not the IDX magic.
    #[error("not an IDX archive: magic is {actual:#x}, expected {expected:#x}")]
    BadMagic { expected: u32, actual: u32 },

    /// A record carries a flag value this reader does not understand.
    #[error("entry {name:?} has unsupported flag {flag:#x}")]
    UnexpectedFlag { name: String, flag: u32 },

    /// An entry name is not valid text in the archive charset.
    #[error("entry name is not valid {encoding}: {bytes:02x?}")]
    BadEncoding {
        encoding: &'static str,
        bytes: Vec<u8>,
    },

    /// An entry name would resolve outside the output root.
    #[error("entry name {name:?} is not a safe relative path")]
    UnsafePath { name: String },
}

/// Reading or writing failed.
#[derive(Debug, Error)]
pub enum IoError {
    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An entry offset points past the end of the PKG stream.
    #[error("offset {offset} is past the end of the stream ({stream_len} bytes)")]
    SeekOutOfRange { offset: u64, stream_len: u64 },

    /// The stream ended before the requested bytes were read.
    #[error("truncated at offset {offset}: needed {needed} bytes, only {available} available")]
    Truncated {
        offset: u64,
        needed: u64,
        available: u64,
    },
}

/// Decoded data disagrees with what the index promised.
#[derive(Debug, Error)]
pub enum IntegrityError {
    /// Decompressed length differs from the declared uncompressed size.
    ///
    /// Decompression stops one byte past `expected`, so an oversized payload
    /// reports `actual == expected + 1`.
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },
}

/// Errors that can occur when working with IDX/PKG archives.
#[derive(Debug, Error)]
pub enum Error {
    /// Index layout error.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] IoError),

    /// Payload is not a valid zlib stream.
    #[error("decompression error: {0}")]
    Decompression(String),

    /// Payload failed validation.
    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    /// A single entry failed during extraction.
    #[error("{name} (offset {offset}): {stage} failed: {source}")]
    Entry {
        name: String,
        offset: u32,
        stage: ExtractStage,
        #[source]
        source: Box<Error>,
    },

    /// An entry filter is not a valid glob pattern.
    #[error("invalid filter pattern {pattern:?}: {source}")]
    InvalidFilter {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// The run was cancelled between entries.
    #[error("extraction cancelled")]
    Cancelled,
}

impl Error {
    /// Attach entry context to an error raised while processing `entry`.
    pub(crate) fn in_entry(self, entry: &EntryDescriptor, stage: ExtractStage) -> Self {
        Error::Entry {
            name: entry.name.clone(),
            offset: entry.offset,
            stage,
            source: Box::new(self),
        }
    }

    /// Whether this error means the index itself is unusable (bad magic,
    /// unsupported record layout, undecodable names).
    pub fn is_format_error(&self) -> bool {
        matches!(self, Error::Format(_))
    }

    /// Whether this error belongs to a single entry's extraction.
    pub fn is_entry_error(&self) -> bool {
        matches!(self, Error::Entry { .. })
    }

    /// The underlying error, with any entry context stripped.
    pub fn root(&self) -> &Error {
        match self {
            Error::Entry { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(IoError::Io(err))
    }
}

impl From<qqtpack_common::Error> for Error {
    fn from(err: qqtpack_common::Error) -> Self {
        match err {
            qqtpack_common::Error::UnexpectedEof {
                position,
                needed,
                available,
            } => Error::Io(IoError::Truncated {
                offset: position,
                needed,
                available,
            }),
            qqtpack_common::Error::Io(e) => e.into(),
            qqtpack_common::Error::Decode { encoding, bytes } => {
                Error::Format(FormatError::BadEncoding { encoding, bytes })
            }
        }
    }
}

/// Result type for IDX/PKG operations.
pub type Result<T> = std::result::Result<T, Error>;
