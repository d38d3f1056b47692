//! Byte-string to text conversion.

use encoding_rs::UTF_8;

use crate::h5ad::types::error::{H5adError, Result};

/// Decodes a NUL-stripped byte string as strict UTF-8.
pub fn decode_utf8(path: &str, bytes: &[u8]) -> Result<String> {
    UTF_8
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or_else(|| {
            H5adError::decode(
                path,
                format!("byte string is not valid UTF-8: {:?}", String::from_utf8_lossy(bytes)),
            )
        })
}

/// Keeps at most `width` characters.
pub fn truncate_chars(mut text: String, width: usize) -> String {
    if let Some((idx, _)) = text.char_indices().nth(width) {
        text.truncate(idx);
    }
    text
}
