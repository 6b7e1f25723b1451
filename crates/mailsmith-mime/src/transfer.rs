//! Content-Transfer-Encoding.

use std::fmt;

use encoding_rs::Encoding;

use crate::encoding::quoted_printable::{self, Flavor};
use crate::encoding::{base64, charset};
use crate::error::{Error, Result};

const BASE64_LINE: usize = 76;

/// Content transfer encoding types.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    #[default]
    SevenBit,
    /// 8-bit data.
    EightBit,
    /// Binary data.
    Binary,
    /// Quoted-printable encoding.
    QuotedPrintable,
    /// Base64 encoding.
    Base64,
    /// Any other token, kept as written.
    Unknown(String),
}

impl TransferEncoding {
    /// Parses a Content-Transfer-Encoding header value.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "7bit" => Self::SevenBit,
            "8bit" => Self::EightBit,
            "binary" => Self::Binary,
            "quoted-printable" => Self::QuotedPrintable,
            "base64" => Self::Base64,
            _ => Self::Unknown(s.trim().to_string()),
        }
    }

    /// Decodes a raw body into bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] for an unknown encoding or malformed
    /// quoted-printable data, and [`Error::Base64Decode`] for bad Base64.
    pub fn decode_bytes(&self, raw: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::SevenBit | Self::EightBit | Self::Binary => Ok(raw.to_vec()),
            Self::QuotedPrintable => {
                let ascii = charset::decode(charset::DEFAULT, raw);
                quoted_printable::decode_bytes(Flavor::Body, &ascii)
            }
            Self::Base64 => base64::decode(&String::from_utf8_lossy(raw)),
            Self::Unknown(token) => Err(unknown(token)),
        }
    }

    /// Decodes a raw body into text in the given charset.
    ///
    /// # Errors
    ///
    /// See [`TransferEncoding::decode_bytes`].
    pub fn decode(&self, encoding: &'static Encoding, raw: &[u8]) -> Result<String> {
        Ok(charset::decode(encoding, &self.decode_bytes(raw)?))
    }

    /// Encodes text in the given charset for use as a raw body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] for an unknown encoding.
    pub fn encode(&self, encoding: &'static Encoding, text: &str) -> Result<Vec<u8>> {
        let bytes = charset::encode(encoding, text);
        match self {
            Self::SevenBit | Self::EightBit | Self::Binary => Ok(bytes),
            Self::QuotedPrintable => {
                Ok(quoted_printable::encode_bytes(Flavor::Body, &bytes).into_bytes())
            }
            Self::Base64 => {
                let encoded = base64::encode(&bytes);
                let lines: Vec<&str> = encoded
                    .as_bytes()
                    .chunks(BASE64_LINE)
                    .filter_map(|chunk| std::str::from_utf8(chunk).ok())
                    .collect();
                Ok(lines.join("\r\n").into_bytes())
            }
            Self::Unknown(token) => Err(unknown(token)),
        }
    }
}

fn unknown(token: &str) -> Error {
    Error::Encoding(format!("unknown transfer encoding {token:?}"))
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Binary => write!(f, "binary"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Base64 => write!(f, "base64"),
            Self::Unknown(token) => write!(f, "{token}"),
        }
    }
}
