//! Decompression utilities for PKG payloads.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::{Error, Result};

/// Cap on output preallocation taken from an untrusted size field.
const MAX_PREALLOCATION: usize = 64 * 1024 * 1024;

/// Decompress zlib-wrapped DEFLATE data, producing at most `limit` bytes.
pub fn decompress_zlib(data: &[u8], limit: u64, output: &mut Vec<u8>) -> Result<()> {
    let mut decoder = ZlibDecoder::new(data).take(limit);

    output.clear();
    decoder
        .read_to_end(output)
        .map_err(|e| Error::Decompression(e.to_string()))?;

    Ok(())
}

/// Decompress zlib-wrapped DEFLATE data with known output size.
///
/// Inflation stops one byte past `expected_size`, so an oversized stream
/// comes back exactly `expected_size + 1` bytes long.
pub fn decompress_zlib_sized(data: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(expected_size.min(MAX_PREALLOCATION));
    decompress_zlib(data, expected_size as u64 + 1, &mut output)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::zlib;

    #[test]
    fn test_zlib_roundtrip() {
        let original = b"Hello, World! This is a test of zlib compression.";

        let compressed = zlib(original);
        let decompressed = decompress_zlib_sized(&compressed, original.len()).unwrap();
        assert_eq!(decompressed, original);

        // Recompressing the output must decode back to the same content.
        let recompressed = zlib(&decompressed);
        assert_eq!(
            decompress_zlib_sized(&recompressed, original.len()).unwrap(),
            original
        );
    }

    #[test]
    fn test_raw_deflate_rejected() {
        use flate2::write::DeflateEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"not wrapped in a zlib header").unwrap();
        let raw = encoder.finish().unwrap();

        assert!(matches!(
            decompress_zlib_sized(&raw, 28),
            Err(Error::Decompression(_))
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        let err = decompress_zlib_sized(b"definitely not zlib", 10).unwrap_err();
        assert!(matches!(err, Error::Decompression(_)));
    }

    #[test]
    fn test_oversized_stream_is_bounded() {
        let compressed = zlib(&vec![0u8; 16 * 1024 * 1024]);
        assert!(compressed.len() < 64 * 1024);

        let output = decompress_zlib_sized(&compressed, 5).unwrap();
        assert_eq!(output.len(), 6);
        assert!(output.capacity() < 1024 * 1024);
    }

    #[test]
    fn test_empty_payload() {
        let compressed = zlib(b"");
        assert!(decompress_zlib_sized(&compressed, 0).unwrap().is_empty());
    }
}
