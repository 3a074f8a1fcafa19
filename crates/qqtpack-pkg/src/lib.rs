//! IDX/PKG archive reader for QQ Tang game files.
//!
//! Game assets ship as a pair of files:
//!
//! - `object.idx` - a 16-byte header (magic `100`, entry count, table
//!   location) followed by one variable-length record per entry: a GBK
//!   encoded name plus the entry's offset and sizes
//! - `object.pkg` - the zlib-compressed entry payloads, addressed by the
//!   offsets in the index
//!
//! Reading is a two-stage pipeline: [`read_index`] decodes the whole index
//! first, then each [`EntryDescriptor`] is extracted independently with
//! [`extract`]. [`PkgArchive`] ties both together for file paths and adds
//! filtering, failure policies, cancellation and (with the `parallel`
//! feature) multi-threaded extraction.
//!
//! # Example
//!
//! ```no_run
//! use qqtpack_pkg::{ExtractOptions, PkgArchive};
//!
//! let archive = PkgArchive::open("object.idx", "object.pkg")?;
//!
//! for entry in archive.iter() {
//!     println!("{}: {} bytes", entry.name, entry.uncompressed_size);
//! }
//!
//! let report = archive.extract_all("out", &ExtractOptions::default(), |_, _| {})?;
//! println!("extracted {} entries", report.processed);
//! # Ok::<(), qqtpack_pkg::Error>(())
//! ```

mod archive;
mod decompress;
mod entry;
mod error;
mod extract;
mod filter;
mod header;
mod index;

#[cfg(test)]
mod test_utils;

pub use archive::{CancelToken, ExtractOptions, ExtractReport, FailurePolicy, PkgArchive};
pub use entry::EntryDescriptor;
pub use error::{Error, FormatError, IntegrityError, IoError, Result};
pub use extract::{extract, read_payload, ExtractStage};
pub use filter::EntryFilter;
pub use header::ArchiveHeader;
pub use index::{read_entries, read_header, read_index};
