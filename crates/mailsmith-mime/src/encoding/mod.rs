//! Text and transfer-encoding codecs.
//!
//! - [`charset`]: charset name resolution with fallbacks
//! - [`quoted_printable`]: header "Q" and body quoted-printable
//! - [`base64`]: unpadded, whitespace-tolerant Base64
//! - [`rfc2047`]: encoded words in header values
//! - [`utf7`]: modified UTF-7 for IMAP mailbox names

pub mod base64;
pub mod charset;
pub mod quoted_printable;
pub mod rfc2047;
pub mod utf7;

pub use rfc2047::WordEncoding;
pub use utf7::{decode_mailbox, encode_mailbox};
