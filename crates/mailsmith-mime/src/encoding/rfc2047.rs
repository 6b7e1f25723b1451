//! RFC 2047 encoded words.
//!
//! An encoded word looks like `=?charset?Q?data?=` or `=?charset?B?data?=`.
//! The end of a word is found by counting its four `?` separators rather
//! than by searching for `?=`, since Q data may legally contain `=`.

use std::fmt;

use encoding_rs::Encoding;

use super::quoted_printable::{self, Flavor};
use super::{base64, charset};
use crate::error::{Error, Result};

/// Transfer encoding of an encoded word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordEncoding {
    /// Quoted-printable ("Q").
    Q,
    /// Base64 ("B").
    B,
}

impl WordEncoding {
    /// Parses the single-letter encoding marker.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Q" | "q" => Some(Self::Q),
            "B" | "b" => Some(Self::B),
            _ => None,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Q => "Q",
            Self::B => "B",
        }
    }
}

impl fmt::Display for WordEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true if `text` is a single encoded word.
#[must_use]
pub fn is_encoded_word(text: &str) -> bool {
    text.len() >= 8
        && !text.contains(' ')
        && text.starts_with("=?")
        && text.ends_with("?=")
        && text.bytes().filter(|&b| b == b'?').count() >= 4
}

/// Decodes a single encoded word.
///
/// Unknown charsets fall back to [`charset::DEFAULT`].
///
/// # Errors
///
/// Returns [`Error::Encoding`] if the word is malformed or its payload
/// cannot be decoded.
pub fn decode_word(word: &str) -> Result<String> {
    if !is_encoded_word(word) {
        return Err(Error::Encoding(format!("not an encoded word: {word}")));
    }
    let inner = &word[2..word.len() - 2];
    let mut fields = inner.splitn(3, '?');
    let (Some(name), Some(kind), Some(data)) = (fields.next(), fields.next(), fields.next())
    else {
        return Err(Error::Encoding(format!("malformed encoded word: {word}")));
    };
    let kind = WordEncoding::parse(kind)
        .ok_or_else(|| Error::Encoding(format!("unknown word encoding {kind:?}")))?;
    let encoding = charset::resolve(name);

    match kind {
        WordEncoding::Q => quoted_printable::decode(Flavor::Header, encoding, data),
        WordEncoding::B => {
            let bytes = base64::decode(data)
                .map_err(|e| Error::Encoding(format!("bad base64 in encoded word: {e}")))?;
            Ok(charset::decode(encoding, &bytes))
        }
    }
}

/// Decodes every encoded word in `text`, copying literal spans verbatim.
///
/// Whitespace that only separates two adjacent encoded words is dropped,
/// as RFC 2047 section 6.2 requires.
///
/// # Errors
///
/// Returns [`Error::Encoding`] if any encoded word fails to decode.
pub fn decode(text: &str) -> Result<String> {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    let mut previous_was_word = false;

    while pos < text.len() {
        let Some(start) = text[pos..].find("=?").map(|i| pos + i) else {
            out.push_str(&text[pos..]);
            break;
        };
        let Some(end) = word_end(bytes, start) else {
            out.push_str(&text[pos..start + 2]);
            pos = start + 2;
            previous_was_word = false;
            continue;
        };

        let literal = &text[pos..start];
        let word = &text[start..end];
        if is_encoded_word(word) {
            if !(previous_was_word && literal.chars().all(char::is_whitespace)) {
                out.push_str(literal);
            }
            out.push_str(&decode_word(word)?);
            previous_was_word = true;
        } else {
            out.push_str(literal);
            out.push_str(word);
            previous_was_word = false;
        }
        pos = end;
    }

    Ok(out)
}

/// Finds the end (exclusive) of the word starting at `start`.
fn word_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut separators = 1;
    let mut i = start + 2;
    while i < bytes.len() {
        match bytes[i] {
            b'?' => {
                separators += 1;
                if separators == 4 {
                    return (bytes.get(i + 1) == Some(&b'=')).then_some(i + 2);
                }
            }
            b' ' | b'\t' | b'\r' | b'\n' => return None,
            _ => {}
        }
        i += 1;
    }
    None
}

/// Wraps `text` as one encoded word in the given charset.
#[must_use]
pub fn encode(kind: WordEncoding, encoding: &'static Encoding, text: &str) -> String {
    let bytes = charset::encode(encoding, text);
    let payload = match kind {
        WordEncoding::Q => quoted_printable::encode_bytes(Flavor::Header, &bytes),
        WordEncoding::B => base64::encode(&bytes),
    };
    format!("=?{}?{kind}?{payload}?=", charset::label(encoding))
}
