//! Single-entry extraction from a PKG stream.
//!
//! An extraction runs through [`ExtractStage`]s in order. The first failure
//! stops it and is returned as [`Error::Entry`] naming the entry, its offset
//! and the stage that failed. Nothing is retried.

use std::fmt;
use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use qqtpack_common::StreamReader;
use tracing::trace;

use crate::decompress;
use crate::entry::EntryDescriptor;
use crate::error::{IntegrityError, IoError};
use crate::{Error, Result};

/// Step of a single entry's extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractStage {
    /// Positioning the PKG stream at the entry offset.
    Seeking,
    /// Reading the compressed span.
    Reading,
    /// Inflating the zlib stream.
    Decompressing,
    /// Checking the decompressed size.
    Validating,
    /// Resolving the output path and writing the file.
    Writing,
}

impl fmt::Display for ExtractStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExtractStage::Seeking => "seek",
            ExtractStage::Reading => "read",
            ExtractStage::Decompressing => "decompression",
            ExtractStage::Validating => "validation",
            ExtractStage::Writing => "write",
        })
    }
}

/// Read, decompress and validate one entry's payload.
///
/// This is every step of [`extract`] except writing the output file.
pub fn read_payload<R: Read + Seek>(pkg: &mut R, entry: &EntryDescriptor) -> Result<Vec<u8>> {
    let offset = u64::from(entry.offset);

    seek_to(pkg, offset).map_err(|e| e.in_entry(entry, ExtractStage::Seeking))?;
    trace!(name = %entry.name, offset, "seeked");

    let compressed = StreamReader::new(&mut *pkg)
        .read_bytes(u64::from(entry.compressed_size))
        .map_err(|e| relative_to(e, offset).in_entry(entry, ExtractStage::Reading))?;

    let data = decompress::decompress_zlib_sized(&compressed, entry.uncompressed_size as usize)
        .map_err(|e| e.in_entry(entry, ExtractStage::Decompressing))?;

    let expected = u64::from(entry.uncompressed_size);
    let actual = data.len() as u64;
    if actual != expected {
        return Err(Error::from(IntegrityError::SizeMismatch { expected, actual })
            .in_entry(entry, ExtractStage::Validating));
    }

    Ok(data)
}

/// Extract one entry below `output_root`.
///
/// Directories implied by the entry name are created as needed, and an
/// existing file at the target path is overwritten.
pub fn extract<R: Read + Seek>(
    pkg: &mut R,
    entry: &EntryDescriptor,
    output_root: &Path,
) -> Result<()> {
    let data = read_payload(pkg, entry)?;
    write_payload(entry, &data, output_root)?;
    Ok(())
}

/// Write decoded entry data to its resolved path below `output_root`.
pub(crate) fn write_payload(
    entry: &EntryDescriptor,
    data: &[u8],
    output_root: &Path,
) -> Result<PathBuf> {
    let write = || -> Result<PathBuf> {
        let path = entry.output_path(output_root)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, data)?;
        Ok(path)
    };

    write().map_err(|e| e.in_entry(entry, ExtractStage::Writing))
}

fn seek_to<R: Seek>(pkg: &mut R, offset: u64) -> Result<()> {
    let stream_len = pkg.seek(SeekFrom::End(0))?;
    if offset > stream_len {
        return Err(IoError::SeekOutOfRange { offset, stream_len }.into());
    }
    pkg.seek(SeekFrom::Start(offset))?;
    Ok(())
}

/// Rebase a truncation error from a span reader onto the absolute offset.
fn relative_to(err: qqtpack_common::Error, base: u64) -> Error {
    match err {
        qqtpack_common::Error::UnexpectedEof {
            position,
            needed,
            available,
        } => IoError::Truncated {
            offset: base + position,
            needed,
            available,
        }
        .into(),
        other => other.into(),
    }
}
