//! RFC822 message tree.

mod parse;
mod write;

use std::path::Path;

use bytes::Bytes;
use chrono::{DateTime, Local, TimeZone};
use encoding_rs::Encoding;
use rand::distributions::{Alphanumeric, DistString};

use crate::address::{self, Address, AddressList, AddressListMut};
use crate::content_type::ContentType;
use crate::date;
use crate::encoding::{WordEncoding, charset, rfc2047};
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::transfer::TransferEncoding;

/// Charset assumed when Content-Type does not name one.
const DEFAULT_CHARSET: &str = "iso-8859-1";

/// A message or one part of a multipart body.
///
/// Built once from a raw buffer. Parts share the parent's buffer and are
/// read-only; call [`Message::detach`] to get an editable copy.
#[derive(Debug, Clone, Default)]
pub struct Message {
    headers: Headers,
    /// Leading fields copied from the enclosing message.
    inherited: usize,
    /// Whether a blank line closed the header block.
    separator: bool,
    source: Bytes,
    start_of_body: usize,
    body: Bytes,
    boundary: Option<String>,
    parts: Vec<Self>,
    read_only: bool,
}

impl Message {
    /// Parses a raw message.
    ///
    /// Parsing never fails. Malformed encoded words, unknown charsets and
    /// missing multipart terminators are tolerated.
    #[must_use]
    pub fn parse(data: impl Into<Bytes>) -> Self {
        parse::parse_node(data.into(), None)
    }

    /// Reads and parses a message file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::parse(std::fs::read(path)?))
    }

    /// Writes the serialized message to a file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_bytes())?;
        Ok(())
    }

    /// Returns an editable copy of this node.
    ///
    /// Headers copied from the enclosing message become the copy's own.
    #[must_use]
    pub fn detach(&self) -> Self {
        Self {
            inherited: 0,
            read_only: false,
            ..self.clone()
        }
    }

    /// Returns a random boundary string.
    #[must_use]
    pub fn create_boundary() -> String {
        format!(
            "----=_Part_{}",
            Alphanumeric.sample_string(&mut rand::thread_rng(), 24)
        )
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.read_only {
            Err(Error::ReadOnly)
        } else {
            Ok(())
        }
    }

    // ---- headers ----

    /// All headers, including those inherited from the enclosing message.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// First value of a header with encoded words decoded.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers.get(name).map(decode_text)
    }

    /// First value of a header as it appears on the wire.
    #[must_use]
    pub fn raw_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Sets a header, replacing existing values.
    ///
    /// The value is stored as given. A value that is not plain ASCII is
    /// written out as a single UTF-8 encoded word.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] on a part of a multipart body.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.ensure_writable()?;
        self.headers.set(name, value);
        Ok(())
    }

    /// Appends a header, keeping existing values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] on a part of a multipart body.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.ensure_writable()?;
        self.headers.add(name, value);
        Ok(())
    }

    /// Removes every value of a header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] on a part of a multipart body.
    pub fn remove_header(&mut self, name: &str) -> Result<()> {
        self.ensure_writable()?;
        self.headers.remove(name);
        Ok(())
    }

    /// Returns true if this node was parsed out of a multipart body.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    // ---- typed fields ----

    /// The Subject header, decoded.
    #[must_use]
    pub fn subject(&self) -> Option<String> {
        self.header("subject")
    }

    /// Sets the Subject header, encoding it if it is not plain ASCII.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] on a part of a multipart body.
    pub fn set_subject(&mut self, subject: &str) -> Result<()> {
        let value = if subject.is_ascii() {
            subject.to_string()
        } else {
            rfc2047::encode(WordEncoding::Q, encoding_rs::UTF_8, subject)
        };
        self.set_header("Subject", value)
    }

    /// The From header as an address.
    #[must_use]
    pub fn from(&self) -> Option<Address> {
        self.headers.get("from").map(address::decode_address)
    }

    /// Sets the From header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] on a part of a multipart body.
    pub fn set_from(&mut self, from: &Address) -> Result<()> {
        self.set_header("From", from.encode())
    }

    /// The Delivered-To header as an address.
    #[must_use]
    pub fn delivered_to(&self) -> Option<Address> {
        self.headers.get("delivered-to").map(address::decode_address)
    }

    /// The Return-Path header as an address.
    #[must_use]
    pub fn return_path(&self) -> Option<Address> {
        self.headers.get("return-path").map(address::decode_address)
    }

    /// The Message-ID header.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.headers.get("message-id")
    }

    /// The MIME-Version header.
    #[must_use]
    pub fn mime_version(&self) -> Option<&str> {
        self.headers.get("mime-version")
    }

    /// The To header.
    #[must_use]
    pub const fn to(&self) -> AddressList<'_> {
        AddressList::new(&self.headers, "To")
    }

    /// The Cc header.
    #[must_use]
    pub const fn cc(&self) -> AddressList<'_> {
        AddressList::new(&self.headers, "Cc")
    }

    /// The Bcc header.
    #[must_use]
    pub const fn bcc(&self) -> AddressList<'_> {
        AddressList::new(&self.headers, "Bcc")
    }

    /// Writable view of the To header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] on a part of a multipart body.
    pub fn to_mut(&mut self) -> Result<AddressListMut<'_>> {
        self.ensure_writable()?;
        Ok(AddressListMut::new(&mut self.headers, "To"))
    }

    /// Writable view of the Cc header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] on a part of a multipart body.
    pub fn cc_mut(&mut self) -> Result<AddressListMut<'_>> {
        self.ensure_writable()?;
        Ok(AddressListMut::new(&mut self.headers, "Cc"))
    }

    /// Writable view of the Bcc header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] on a part of a multipart body.
    pub fn bcc_mut(&mut self) -> Result<AddressListMut<'_>> {
        self.ensure_writable()?;
        Ok(AddressListMut::new(&mut self.headers, "Bcc"))
    }

    /// The Date header in local time; `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DateFormat`] if the header is present but
    /// unparseable.
    pub fn date(&self) -> Result<Option<DateTime<Local>>> {
        self.headers.get("date").map(date::parse_date).transpose()
    }

    /// Sets the Date header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] on a part of a multipart body.
    pub fn set_date<Tz: TimeZone>(&mut self, date: &DateTime<Tz>) -> Result<()>
    where
        Tz::Offset: std::fmt::Display,
    {
        self.set_header("Date", date::format_date(date))
    }

    // ---- body ----

    /// The Content-Type, or `text/plain; charset=iso-8859-1` if absent.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        self.headers
            .get("content-type")
            .map_or_else(ContentType::default, ContentType::parse)
    }

    /// Charset of the body text; unknown names resolve to the 8-bit default.
    #[must_use]
    pub fn encoding(&self) -> &'static Encoding {
        let content_type = self.content_type();
        charset::resolve(content_type.charset().unwrap_or(DEFAULT_CHARSET))
    }

    /// The Content-Transfer-Encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or_else(TransferEncoding::default, TransferEncoding::parse)
    }

    /// The raw body bytes. For a multipart node this is the preamble.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The buffer this node was parsed from.
    #[must_use]
    pub const fn source(&self) -> &Bytes {
        &self.source
    }

    /// Offset of the body within [`Message::source`].
    #[must_use]
    pub const fn start_of_body(&self) -> usize {
        self.start_of_body
    }

    /// The body with its transfer encoding removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] for an unknown transfer encoding or
    /// malformed quoted-printable, and [`Error::Base64Decode`] for bad
    /// Base64.
    pub fn content_bytes(&self) -> Result<Vec<u8>> {
        self.transfer_encoding().decode_bytes(&self.body)
    }

    /// The body decoded to text.
    ///
    /// # Errors
    ///
    /// See [`Message::content_bytes`].
    pub fn content(&self) -> Result<String> {
        self.transfer_encoding().decode(self.encoding(), &self.body)
    }

    /// The body decoded to text, falling back to the raw bytes in the
    /// body charset when the transfer encoding cannot be undone.
    #[must_use]
    pub fn content_lossy(&self) -> String {
        self.content()
            .unwrap_or_else(|_| charset::decode(self.encoding(), &self.body))
    }

    /// Replaces the body, applying the charset and transfer encoding named
    /// in the headers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] on a part of a multipart body and
    /// [`Error::Encoding`] for an unknown transfer encoding.
    pub fn set_content(&mut self, text: &str) -> Result<()> {
        self.ensure_writable()?;
        let encoded = self.transfer_encoding().encode(self.encoding(), text)?;
        self.body = Bytes::from(encoded);
        Ok(())
    }

    // ---- structure ----

    /// Returns true if the body was split into parts.
    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        self.boundary.is_some()
    }

    /// The multipart boundary, if any.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.boundary.as_deref()
    }

    /// Child parts, in source order.
    #[must_use]
    pub fn parts(&self) -> &[Self] {
        &self.parts
    }

    /// Finds the first node, depth first and starting with this one, whose
    /// media type matches.
    #[must_use]
    pub fn find_part(&self, media_type: &str) -> Option<&Self> {
        if self.content_type().matches(media_type) {
            return Some(self);
        }
        self.parts.iter().find_map(|part| part.find_part(media_type))
    }

    /// Like [`Message::find_part`], but failing when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PartNotFound`] if no node matches.
    pub fn part(&self, media_type: &str) -> Result<&Self> {
        self.find_part(media_type)
            .ok_or_else(|| Error::PartNotFound(media_type.to_string()))
    }

    /// Returns true if any node in the tree has this media type.
    #[must_use]
    pub fn has_part(&self, media_type: &str) -> bool {
        self.find_part(media_type).is_some()
    }

    /// The first `text/plain` node.
    #[must_use]
    pub fn plain_text_part(&self) -> Option<&Self> {
        self.find_part("text/plain")
    }

    /// From, To and Subject are present and some node is `text/plain`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        ["from", "to", "subject"]
            .iter()
            .all(|name| self.headers.contains(name))
            && self.has_part("text/plain")
    }
}

/// Decodes encoded words, falling back to the raw text.
fn decode_text(raw: &str) -> String {
    rfc2047::decode(raw).unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const SIMPLE: &str = "From: a@b.com\r\nTo: c@d.com\r\nSubject: Hi\r\nContent-Type: text/plain; charset=us-ascii\r\n\r\nHello";

    const MULTIPART: &str = "From: Alice <alice@example.com>\r\n\
To: bob@example.com\r\n\
Subject: Report\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=XYZ\r\n\
\r\n\
This is a multi-part message.\r\n\
--XYZ\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
Content-Transfer-Encoding: quoted-printable\r\n\
\r\n\
caf=C3=A9\r\n\
--XYZ\r\n\
Content-Type: application/octet-stream\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
AAEC\r\n\
--XYZ--\r\n";

    #[test]
    fn test_simple_message() {
        let message = Message::parse(SIMPLE);
        assert_eq!(message.subject().as_deref(), Some("Hi"));
        assert_eq!(message.content().unwrap(), "Hello");
        assert!(!message.is_multipart());
        assert!(message.is_valid());
        assert!(message.parts().is_empty());
    }

    #[test]
    fn test_multipart_message() {
        let message = Message::parse(MULTIPART);
        assert!(message.is_multipart());
        assert_eq!(message.boundary(), Some("XYZ"));
        assert_eq!(message.body(), b"This is a multi-part message.\r\n");
        assert_eq!(message.parts().len(), 2);

        let text = &message.parts()[0];
        assert_eq!(text.content_type().media_type(), "text/plain");
        assert_eq!(text.content().unwrap(), "café");
        assert!(text.is_read_only());

        let binary = &message.parts()[1];
        assert_eq!(binary.content_type().media_type(), "application/octet-stream");
        assert_eq!(binary.content_bytes().unwrap(), vec![0, 1, 2]);

        assert!(message.is_valid());
        assert_eq!(message.mime_version(), Some("1.0"));
    }

    #[test]
    fn test_parts_inherit_non_content_headers() {
        let message = Message::parse(MULTIPART);
        let part = &message.parts()[1];
        assert_eq!(part.subject().as_deref(), Some("Report"));
        assert_eq!(part.raw_header("content-transfer-encoding"), Some("base64"));
        assert!(!part.is_multipart());
    }

    #[test]
    fn test_parts_are_subranges_of_source() {
        let message = Message::parse(MULTIPART);
        let source = message.source();
        for part in message.parts() {
            let start = part.source().as_ptr() as usize - source.as_ptr() as usize;
            assert!(start + part.source().len() <= source.len());
        }
        let first = message.parts()[0].source();
        let second = message.parts()[1].source();
        assert!(first.as_ptr() as usize + first.len() <= second.as_ptr() as usize);
    }

    #[test]
    fn test_missing_closing_boundary_keeps_trailing_part() {
        let truncated = MULTIPART.trim_end_matches("--XYZ--\r\n");
        let message = Message::parse(truncated);
        assert_eq!(message.parts().len(), 2);
        assert_eq!(message.parts()[1].content_bytes().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_trailing_noise_is_dropped() {
        let raw = "Content-Type: multipart/mixed; boundary=b\r\n\r\n--b\r\n\r\none\r\n--b\r\n\r\n";
        let message = Message::parse(raw);
        assert_eq!(message.parts().len(), 1);
    }

    #[test]
    fn test_multipart_without_delimiters_is_single_part() {
        let raw = "Content-Type: multipart/mixed; boundary=nope\r\n\r\njust text";
        let message = Message::parse(raw);
        assert!(!message.is_multipart());
        assert!(message.parts().is_empty());
        assert_eq!(message.body(), b"just text");
    }

    #[test]
    fn test_nested_multipart() {
        let raw = "From: a@b\r\nTo: c@d\r\nSubject: nested\r\n\
Content-Type: multipart/mixed; boundary=outer\r\n\r\n\
--outer\r\n\
Content-Type: multipart/alternative; boundary=inner\r\n\r\n\
--inner\r\n\
Content-Type: text/plain\r\n\r\n\
plain\r\n\
--inner\r\n\
Content-Type: text/html\r\n\r\n\
<p>html</p>\r\n\
--inner--\r\n\
--outer\r\n\
Content-Type: image/png\r\n\r\n\
png\r\n\
--outer--\r\n";
        let message = Message::parse(raw);
        assert_eq!(message.parts().len(), 2);
        assert_eq!(message.parts()[0].parts().len(), 2);
        assert!(message.has_part("TEXT/HTML"));
        assert_eq!(message.plain_text_part().unwrap().content().unwrap(), "plain");
        assert!(message.part("application/pdf").is_err());
        assert!(message.is_valid());
    }

    #[test]
    fn test_header_folding() {
        let raw = "Subject: a long\r\n   subject line\r\n\tcontinued\r\n\r\nbody";
        let message = Message::parse(raw);
        assert_eq!(
            message.subject().as_deref(),
            Some("a long subject line continued")
        );
    }

    #[test]
    fn test_duplicate_headers_and_lf_only() {
        let raw = "Received: one\nReceived: two\nSubject: x\n\nbody\n";
        let message = Message::parse(raw);
        assert_eq!(message.headers().get_all("received"), vec!["one", "two"]);
        assert_eq!(message.body(), b"body\n");
    }

    #[test]
    fn test_leading_blank_lines_skipped() {
        let message = Message::parse("\r\n\r\nSubject: x\r\n\r\nbody");
        assert_eq!(message.subject().as_deref(), Some("x"));
    }

    #[test]
    fn test_encoded_header_is_decoded() {
        let raw = "Subject: =?UTF-8?B?SGVsbG8gd8O2cmxk?=\r\n\r\n";
        assert_eq!(Message::parse(raw).subject().as_deref(), Some("Hello wörld"));
    }

    #[test]
    fn test_malformed_encoded_word_is_preserved() {
        let raw = "Subject: =?UTF-8?B?###?=\r\n\r\n";
        let message = Message::parse(raw);
        let stored = message.raw_header("subject").unwrap();
        assert!(stored.starts_with("=?windows-1252?B?"));
        assert_eq!(message.subject().as_deref(), Some("=?UTF-8?B?###?="));
    }

    #[test]
    fn test_unknown_charset_falls_back() {
        let raw = b"Content-Type: text/plain; charset=x-unknown\r\n\r\ncaf\xE9".to_vec();
        let message = Message::parse(raw);
        assert_eq!(message.encoding(), charset::DEFAULT);
        assert_eq!(message.content().unwrap(), "café");
    }

    #[test]
    fn test_unknown_transfer_encoding() {
        let raw = "Content-Transfer-Encoding: x-uuencode\r\n\r\nbegin 644";
        let message = Message::parse(raw);
        assert!(matches!(message.content(), Err(Error::Encoding(_))));
        assert_eq!(message.content_lossy(), "begin 644");
    }

    #[test]
    fn test_children_are_read_only() {
        let message = Message::parse(MULTIPART);
        let mut part = message.parts()[0].clone();
        assert!(matches!(part.set_subject("x"), Err(Error::ReadOnly)));
        assert!(matches!(part.set_content("x"), Err(Error::ReadOnly)));

        let mut detached = part.detach();
        detached.set_subject("edited").unwrap();
        assert_eq!(detached.subject().as_deref(), Some("edited"));
    }

    #[test]
    fn test_address_fields() {
        let raw = "From: \"Smith, Al\" <al@x.org>\r\nTo: a@x.org, B <b@x.org>\r\nCc: nobody\r\n\r\n";
        let mut message = Message::parse(raw);
        assert_eq!(
            message.from(),
            Some(Address::with_name("Smith, Al", "al@x.org"))
        );
        assert_eq!(message.to().len(), 2);
        assert!(message.cc().is_empty());

        message
            .to_mut()
            .unwrap()
            .push(Address::new("c@x.org"));
        assert_eq!(
            message.raw_header("to"),
            Some("a@x.org, B <b@x.org>, c@x.org")
        );
    }

    #[test]
    fn test_encoded_comma_stays_in_display_name() {
        let raw = "To: =?utf-8?Q?M=C3=BCller=2C_Hans?= <h@x.de>, b@x.de\r\n\r\n";
        let message = Message::parse(raw);
        assert_eq!(
            message.to().get(),
            vec![
                Address::with_name("Müller, Hans", "h@x.de"),
                Address::new("b@x.de"),
            ]
        );
        assert_eq!(
            message.header("to").as_deref(),
            Some("Müller, Hans <h@x.de>, b@x.de")
        );
    }

    #[test]
    fn test_rewritten_list_keeps_encoded_names_separate() {
        let mut message = Message::parse("To: b@x.de\r\n\r\n");
        message
            .to_mut()
            .unwrap()
            .push(Address::with_name("Müller, Hans", "h@x.de"));
        let reparsed = Message::parse(message.to_bytes());
        assert_eq!(
            reparsed.to().get(),
            vec![
                Address::new("b@x.de"),
                Address::with_name("Müller, Hans", "h@x.de"),
            ]
        );
    }

    #[test]
    fn test_set_subject_encodes_non_ascii() {
        let mut message = Message::default();
        message.set_subject("Grüße").unwrap();
        assert_eq!(
            message.raw_header("subject"),
            Some("=?utf-8?Q?Gr=C3=BC=C3=9Fe?=")
        );
        assert_eq!(message.subject().as_deref(), Some("Grüße"));
    }

    #[test]
    fn test_date_field() {
        let mut message = Message::parse("Date: Tue, 1 Jul 2003 10:52:37 +0200\r\n\r\n");
        let date = message.date().unwrap().unwrap();
        assert_eq!(date.timestamp(), 1_057_049_557);

        message.set_header("Date", "garbage").unwrap();
        assert!(matches!(message.date(), Err(Error::DateFormat(_))));
        assert!(Message::default().date().unwrap().is_none());
    }

    #[test]
    fn test_set_content_applies_transfer_encoding() {
        let mut message = Message::default();
        message
            .set_header("Content-Type", "text/plain; charset=utf-8")
            .unwrap();
        message
            .set_header("Content-Transfer-Encoding", "quoted-printable")
            .unwrap();
        message.set_content("naïve").unwrap();
        assert_eq!(message.body(), b"na=C3=AFve");
        assert_eq!(message.content().unwrap(), "naïve");
    }

    #[test]
    fn test_create_boundary_is_unique() {
        let a = Message::create_boundary();
        let b = Message::create_boundary();
        assert_ne!(a, b);
        assert!(ContentType::multipart_mixed(&a).boundary() == Some(a.as_str()));
    }
}
