//! Stream reader for little-endian binary data.
//!
//! This module provides [`StreamReader`], a cursor-like wrapper around any
//! [`Read`] that decodes fixed-size primitives and records how far into the
//! stream it has read, so truncation errors can say exactly where they hit.

use std::io::{ErrorKind, Read};

use byteorder::{ByteOrder, LittleEndian};
use encoding_rs::Encoding;
use zerocopy::FromBytes;

use crate::{text, Error, Result};

/// A binary reader over a byte stream.
///
/// # Example
///
/// ```
/// use qqtpack_common::StreamReader;
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
/// let mut reader = StreamReader::new(&data[..]);
///
/// assert_eq!(reader.read_u32().unwrap(), 0x04030201);
/// assert_eq!(reader.read_u16().unwrap(), 0x0605);
/// assert_eq!(reader.position(), 6);
/// ```
#[derive(Debug)]
pub struct StreamReader<R> {
    inner: R,
    position: u64,
}

impl<R: Read> StreamReader<R> {
    /// Create a new reader positioned at the start of `inner`.
    #[inline]
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    /// Number of bytes consumed so far.
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Fill `buf` completely or fail with [`Error::UnexpectedEof`].
    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(Error::UnexpectedEof {
                        position: self.position,
                        needed: buf.len() as u64,
                        available: filled as u64,
                    })
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.position += buf.len() as u64;
        Ok(())
    }

    /// Read exactly `count` bytes.
    ///
    /// The buffer grows with the data actually read, so a bogus length from
    /// a corrupt header fails on truncation instead of allocating up front.
    pub fn read_bytes(&mut self, count: u64) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.inner.by_ref().take(count).read_to_end(&mut buf)?;

        let available = buf.len() as u64;
        if available < count {
            return Err(Error::UnexpectedEof {
                position: self.position,
                needed: count,
                available,
            });
        }

        self.position += count;
        Ok(buf)
    }

    /// Read a fixed-size byte array.
    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    /// Read a little-endian u16.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_array::<2>().map(|b| LittleEndian::read_u16(&b))
    }

    /// Read a little-endian u32.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_array::<4>().map(|b| LittleEndian::read_u32(&b))
    }

    /// Read a struct using zerocopy.
    ///
    /// The struct must implement `FromBytes` from the zerocopy crate.
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>() as u64;
        let bytes = self.read_bytes(size)?;
        T::read_from_bytes(&bytes).map_err(|_| Error::UnexpectedEof {
            position: self.position,
            needed: size,
            available: bytes.len() as u64,
        })
    }

    /// Read `length` bytes and decode them as text in `encoding`.
    pub fn read_string(&mut self, length: u64, encoding: &'static Encoding) -> Result<String> {
        let bytes = self.read_bytes(length)?;
        text::decode(encoding, &bytes)
    }
}
