//! qqtpack - QQ Tang game archive extraction library.
//!
//! This crate provides a unified interface to the qqtpack crates.
//!
//! # Crates
//!
//! - [`qqtpack_common`] - Common utilities (stream reading, GBK text)
//! - [`qqtpack_pkg`] - IDX/PKG archive reading and extraction
//!
//! # Example
//!
//! ```no_run
//! use qqtpack::prelude::*;
//!
//! let archive = PkgArchive::open("object.idx", "object.pkg")?;
//!
//! if let Some(entry) = archive.find("map/town.map") {
//!     let data = archive.read(entry)?;
//!     println!("{}: {} bytes", entry.name, data.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use qqtpack_common as common;
pub use qqtpack_pkg as pkg;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use qqtpack_common::{text, StreamReader};
    pub use qqtpack_pkg::{
        extract, read_entries, read_header, read_index, read_payload, ArchiveHeader, CancelToken,
        EntryDescriptor, EntryFilter, Error, ExtractOptions, ExtractReport, FailurePolicy,
        PkgArchive,
    };
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
