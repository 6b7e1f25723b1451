//! # mailsmith-mime
//!
//! Tolerant RFC822/MIME message parsing and the mail text codecs it needs.
//!
//! ## Features
//!
//! - **Message tree**: byte-exact recursive multipart parsing over a shared
//!   buffer, with serialization back to CRLF-terminated RFC822
//! - **Resilience**: malformed encoded words, unknown charsets, bad
//!   addresses and missing multipart terminators never abort a parse
//! - **Codecs**: quoted-printable (header and body flavours), unpadded
//!   Base64, RFC 2047 encoded words, modified UTF-7 mailbox names
//! - **Field views**: address lists and dates decoded on demand
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailsmith_mime::Message;
//!
//! let raw = "From: sender@example.com\r\n\
//!            To: recipient@example.com\r\n\
//!            Subject: =?utf-8?Q?Gr=C3=BC=C3=9Fe?=\r\n\
//!            Content-Type: text/plain; charset=utf-8\r\n\
//!            \r\n\
//!            Hello, World!";
//!
//! let message = Message::parse(raw);
//! println!("Subject: {}", message.subject().unwrap_or_default());
//! println!("Body: {}", message.content()?);
//! for to in message.to().get() {
//!     println!("To: {to}");
//! }
//! ```
//!
//! ### Encoding/Decoding
//!
//! ```ignore
//! use mailsmith_mime::encoding::{rfc2047, utf7, WordEncoding};
//!
//! let word = rfc2047::encode(WordEncoding::Q, encoding_rs::UTF_8, "héllo");
//! assert_eq!(rfc2047::decode(&word)?, "héllo");
//!
//! assert_eq!(utf7::encode_mailbox("Entwürfe"), "Entw&APw-rfe");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod content_type;
mod error;
mod header;
mod message;
mod reader;
mod transfer;

pub mod date;
pub mod encoding;

pub use address::{Address, AddressList, AddressListMut, decode_address, format_list, parse_list};
pub use content_type::{ContentType, media_type_matches};
pub use date::{format_date, format_search_date, parse_date};
pub use error::{Error, Result};
pub use header::Headers;
pub use message::Message;
pub use transfer::TransferEncoding;
