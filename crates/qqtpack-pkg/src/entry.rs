//! IDX entry records.

use std::path::{Path, PathBuf};

use crate::error::FormatError;

/// An entry (file) within an IDX/PKG archive.
///
/// This contains metadata about the file, not the file data itself.
/// Use [`crate::read_payload`] or [`crate::PkgArchive::read`] to get the
/// decompressed contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDescriptor {
    /// File name/path within the archive, decoded from GBK.
    pub name: String,
    /// Record flag, always 0 in supported archives.
    pub flag: u32,
    /// Absolute offset of the compressed data in the PKG stream.
    pub offset: u32,
    /// Size after decompression.
    pub uncompressed_size: u32,
    /// Size as stored in the PKG stream.
    pub compressed_size: u32,
}

impl EntryDescriptor {
    /// Get the relative output path for extraction.
    ///
    /// Both `/` and `\` separate directories. Empty and `.` segments are
    /// dropped; absolute names, drive prefixes and `..` segments are
    /// rejected so the result always stays below the output root.
    pub fn relative_path(&self) -> Result<PathBuf, FormatError> {
        let unsafe_path = || FormatError::UnsafePath {
            name: self.name.clone(),
        };

        if self.name.starts_with(['/', '\\']) {
            return Err(unsafe_path());
        }

        let mut path = PathBuf::new();
        for segment in self.name.split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => return Err(unsafe_path()),
                s if s.contains(':') => return Err(unsafe_path()),
                s => path.push(s),
            }
        }

        if path.as_os_str().is_empty() {
            return Err(unsafe_path());
        }

        Ok(path)
    }

    /// Resolve the full output path of this entry below `root`.
    pub fn output_path(&self, root: &Path) -> Result<PathBuf, FormatError> {
        self.relative_path().map(|rel| root.join(rel))
    }

    /// Get the file extension, if any.
    pub fn extension(&self) -> Option<&str> {
        let file_name = self.name.rsplit(['/', '\\']).next()?;
        let (stem, ext) = file_name.rsplit_once('.')?;
        (!stem.is_empty()).then_some(ext)
    }
}
