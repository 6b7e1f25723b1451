//! Quoted-printable codecs.
//!
//! Two flavours share one scanner:
//!
//! - [`Flavor::Header`] is the RFC 2047 "Q" encoding used inside encoded
//!   words, where `_` stands for a space.
//! - [`Flavor::Body`] is the RFC 2045 content transfer encoding, where `_`
//!   is an ordinary character.
//!
//! Neither encoder folds long lines.

use encoding_rs::Encoding;

use super::charset;
use crate::error::{Error, Result};

/// Which quoted-printable convention to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    /// RFC 2047 "Q" encoding for header words.
    Header,
    /// RFC 2045 body transfer encoding.
    Body,
}

/// Decodes quoted-printable text into bytes.
///
/// # Errors
///
/// Returns [`Error::Encoding`] if the input contains a byte above 127.
pub fn decode_bytes(flavor: Flavor, input: &str) -> Result<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        if byte > 127 {
            return Err(Error::Encoding(format!(
                "non-ASCII byte 0x{byte:02X} in quoted-printable data"
            )));
        }
        match byte {
            b'=' => {
                let rest = &bytes[i + 1..];
                if rest.starts_with(b"\r\n") {
                    i += 3;
                } else if rest.starts_with(b"\n") {
                    i += 2;
                } else if let Some(value) = rest.get(..2).and_then(hex_pair) {
                    out.push(value);
                    i += 3;
                } else {
                    // Stray '=' is kept as is.
                    out.push(b'=');
                    i += 1;
                }
            }
            b'_' if flavor == Flavor::Header => {
                out.push(b' ');
                i += 1;
            }
            _ => {
                out.push(byte);
                i += 1;
            }
        }
    }

    Ok(out)
}

/// Decodes quoted-printable text and interprets the bytes in `encoding`.
///
/// # Errors
///
/// Returns [`Error::Encoding`] if the input contains a byte above 127.
pub fn decode(flavor: Flavor, encoding: &'static Encoding, input: &str) -> Result<String> {
    let bytes = decode_bytes(flavor, input)?;
    Ok(charset::decode(encoding, &bytes))
}

/// Encodes raw bytes as quoted-printable.
#[must_use]
pub fn encode_bytes(flavor: Flavor, bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());

    for (i, &byte) in bytes.iter().enumerate() {
        match flavor {
            // Phrase-safe characters only (RFC 2047 section 5).
            Flavor::Header => match byte {
                b' ' => out.push('_'),
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'!' | b'*' | b'+' | b'-' | b'/' => {
                    out.push(char::from(byte));
                }
                _ => push_escaped(&mut out, byte),
            },
            Flavor::Body => match byte {
                b'\r' | b'\n' => out.push(char::from(byte)),
                b' ' | b'\t' => {
                    // Whitespace at the end of a line would be stripped in transit.
                    let next = bytes.get(i + 1);
                    if matches!(next, None | Some(b'\r' | b'\n')) {
                        push_escaped(&mut out, byte);
                    } else {
                        out.push(char::from(byte));
                    }
                }
                b'=' => push_escaped(&mut out, byte),
                33..=126 => out.push(char::from(byte)),
                _ => push_escaped(&mut out, byte),
            },
        }
    }

    out
}

/// Encodes text in `encoding`, then as quoted-printable.
#[must_use]
pub fn encode(flavor: Flavor, encoding: &'static Encoding, text: &str) -> String {
    encode_bytes(flavor, &charset::encode(encoding, text))
}

fn push_escaped(out: &mut String, byte: u8) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    out.push('=');
    out.push(char::from(HEX[usize::from(byte >> 4)]));
    out.push(char::from(HEX[usize::from(byte & 0x0F)]));
}

fn hex_pair(pair: &[u8]) -> Option<u8> {
    let high = char::from(pair[0]).to_digit(16)?;
    let low = char::from(pair[1]).to_digit(16)?;
    u8::try_from(high * 16 + low).ok()
}
