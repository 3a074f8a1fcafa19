//! Legacy charset handling.
//!
//! Archive entry names are stored in GBK, the double-byte Simplified Chinese
//! charset the game client was built with. Decoding is strict: any byte
//! sequence GBK cannot map is an error, never a replacement character.

use std::borrow::Cow;

pub use encoding_rs::{Encoding, GBK};

use crate::{Error, Result};

/// Decode `bytes` strictly as `encoding`, without BOM sniffing.
pub fn decode(encoding: &'static Encoding, bytes: &[u8]) -> Result<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(Cow::into_owned)
        .ok_or_else(|| Error::Decode {
            encoding: encoding.name(),
            bytes: bytes.to_vec(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        assert_eq!(decode(GBK, b"map/a.txt").unwrap(), "map/a.txt");
    }

    #[test]
    fn test_double_byte_names() {
        // "道具\炸弹.spr"
        let bytes = [
            0xB5, 0xC0, 0xBE, 0xDF, 0x5C, 0xD5, 0xA8, 0xB5, 0xAF, 0x2E, 0x73, 0x70, 0x72,
        ];
        assert_eq!(decode(GBK, &bytes).unwrap(), "道具\\炸弹.spr");
    }

    #[test]
    fn test_invalid_bytes_rejected() {
        let err = decode(GBK, &[b'a', 0xFF, b'b']).unwrap_err();
        assert!(matches!(err, Error::Decode { encoding: "GBK", .. }));
    }

    #[test]
    fn test_dangling_lead_byte_rejected() {
        assert!(decode(GBK, &[b'x', 0xB5]).is_err());
    }
}
