//! Common utilities for qqtpack.
//!
//! This crate provides the low-level pieces shared by the archive readers:
//!
//! - [`StreamReader`] - position-tracking reader for little-endian primitives
//!   over any [`std::io::Read`], reporting truncation with exact byte counts
//! - [`text`] - decoding of the legacy GBK charset used for entry names

mod error;
mod reader;

pub mod text;

pub use error::{Error, Result};
pub use reader::StreamReader;
