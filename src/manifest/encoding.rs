//! Manifest text decoding.
//!
//! `assembly.xml` files come out of several packaging tools and are not
//! always plain UTF-8:
//! - UTF-16 LE (BOM 0xFF 0xFE)
//! - UTF-16 BE (BOM 0xFE 0xFF)
//! - UTF-8 with BOM (0xEF 0xBB 0xBF)
//! - Plain UTF-8/ASCII
//!
//! quick-xml works on UTF-8 only, so the BOM decides how the bytes are
//! decoded before parsing.

use std::fs;
use std::path::Path;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};

use crate::error::{Error, Result};

/// Pick the decoder for `bytes` and the length of the BOM to skip.
fn sniff_bom(bytes: &[u8]) -> (&'static Encoding, usize) {
    match bytes {
        [0xEF, 0xBB, 0xBF, ..] => (UTF_8, 3),
        [0xFF, 0xFE, ..] => (UTF_16LE, 2),
        [0xFE, 0xFF, ..] => (UTF_16BE, 2),
        _ => (UTF_8, 0),
    }
}

/// Decode manifest bytes to a UTF-8 string.
pub fn decode_manifest_bytes(bytes: &[u8]) -> Result<String> {
    let (encoding, bom_len) = sniff_bom(bytes);
    let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);

    if had_errors {
        return Err(Error::MalformedManifest(format!(
            "invalid {} byte sequence",
            encoding.name()
        )));
    }

    Ok(text.into_owned())
}

/// Read a manifest file and decode it to UTF-8.
pub fn read_manifest_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    decode_manifest_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16(text: &str, big_endian: bool) -> Vec<u8> {
        let mut bytes = if big_endian { vec![0xFE, 0xFF] } else { vec![0xFF, 0xFE] };
        for unit in text.encode_utf16() {
            let pair = if big_endian { unit.to_be_bytes() } else { unit.to_le_bytes() };
            bytes.extend_from_slice(&pair);
        }
        bytes
    }

    #[test]
    fn test_decode_plain_utf8() {
        assert_eq!(decode_manifest_bytes(b"<name>Foo</name>").unwrap(), "<name>Foo</name>");
    }

    #[test]
    fn test_decode_utf8_bom_is_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("<name>Café</name>".as_bytes());
        assert_eq!(decode_manifest_bytes(&bytes).unwrap(), "<name>Café</name>");
    }

    #[test]
    fn test_decode_utf16_both_orders() {
        let xml = "<package><name>Ünïcode</name></package>";
        assert_eq!(decode_manifest_bytes(&utf16(xml, false)).unwrap(), xml);
        assert_eq!(decode_manifest_bytes(&utf16(xml, true)).unwrap(), xml);
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let err = decode_manifest_bytes(&[b'<', 0xC3, 0x28, b'>']).unwrap_err();
        assert!(matches!(err, Error::MalformedManifest(_)));
    }
}
