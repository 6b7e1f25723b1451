//! Message serialization.

use std::io::{self, Write};

use super::Message;
use crate::encoding::{WordEncoding, rfc2047};

impl Message {
    /// Serializes the message.
    ///
    /// Header lines end in CRLF and keep their order. Values that are not
    /// plain ASCII are written as UTF-8 "Q" encoded words. Bodies are
    /// written byte for byte.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.source.len() + 64);
        self.write_into(&mut out);
        out
    }

    /// Writes the serialized message to `writer`.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }

    fn write_into(&self, out: &mut Vec<u8>) {
        let own = self.headers.iter().skip(self.inherited);
        let mut wrote_header = false;
        for (name, value) in own {
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(header_value(value).as_bytes());
            out.extend_from_slice(b"\r\n");
            wrote_header = true;
        }
        if self.separator || wrote_header {
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(&self.body);

        if let Some(boundary) = &self.boundary {
            for (i, part) in self.parts.iter().enumerate() {
                if i > 0 {
                    out.extend_from_slice(b"\r\n");
                }
                out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
                part.write_into(out);
            }
            out.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        }
    }
}

fn header_value(value: &str) -> std::borrow::Cow<'_, str> {
    if value.is_ascii() {
        value.into()
    } else {
        rfc2047::encode(WordEncoding::Q, encoding_rs::UTF_8, value).into()
    }
}
