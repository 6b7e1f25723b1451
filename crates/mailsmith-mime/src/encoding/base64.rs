//! Base64 without padding.
//!
//! Encoded words and mail bodies in the wild drop `=` padding, wrap lines,
//! and leave stray trailing bits. Encoding omits padding; decoding accepts
//! input with or without it.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::error::Result;

/// Standard alphabet, no padding on output, either form accepted on input.
pub const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Encodes data as unpadded Base64.
#[must_use]
pub fn encode(data: &[u8]) -> String {
    LENIENT.encode(data)
}

/// Decodes Base64, ignoring whitespace and missing padding.
///
/// # Errors
///
/// Returns an error if the input contains characters outside the alphabet.
pub fn decode(data: &str) -> Result<Vec<u8>> {
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    LENIENT.decode(compact).map_err(Into::into)
}
