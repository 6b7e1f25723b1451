//! Mail addresses and address-list header views.
//!
//! Reading is forgiving: a token that cannot be understood as an address
//! becomes a placeholder at the local host, with the original text kept
//! (sanitized) as the display name. Nothing here fails on bad input except
//! the strict [`Address::parse`].

use std::fmt;
use std::str::FromStr;

use rand::distributions::{Alphanumeric, DistString};

use crate::encoding::{WordEncoding, rfc2047};
use crate::error::{Error, Result};
use crate::header::Headers;

const PLACEHOLDER_LOCAL_LEN: usize = 20;

/// A single mailbox: optional display name plus `local@domain`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Address {
    /// Display name, already decoded.
    pub display_name: Option<String>,
    /// The `local@domain` part.
    pub address: String,
}

impl Address {
    /// Creates an address without a display name.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            display_name: None,
            address: address.into(),
        }
    }

    /// Creates an address with a display name.
    #[must_use]
    pub fn with_name(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            display_name: Some(name.into()),
            address: address.into(),
        }
    }

    /// Parses exactly one address.
    ///
    /// Accepts `local@domain`, `Name <local@domain>`, `"Name" <local@domain>`
    /// and `local@domain (Name)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AddressFormat`] if the text is not exactly one
    /// address.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let invalid = || Error::AddressFormat(text.to_string());

        if count_unquoted(text, '@') != 1 {
            return Err(invalid());
        }

        let (name, address) = if let Some(open) = text.rfind('<') {
            let close = text[open..].find('>').ok_or_else(invalid)? + open;
            if !text[close + 1..].trim().is_empty() {
                return Err(invalid());
            }
            (unquote(&text[..open]), text[open + 1..close].trim())
        } else if let Some(open) = text.find('(') {
            let close = text.rfind(')').filter(|&c| c > open).ok_or_else(invalid)?;
            (unquote(&text[open + 1..close]), text[..open].trim())
        } else {
            ("", text)
        };

        let (local, domain) = address.split_once('@').ok_or_else(invalid)?;
        if local.is_empty()
            || domain.is_empty()
            || address.contains(|c: char| c.is_whitespace() || "<>()\",;".contains(c))
        {
            return Err(invalid());
        }

        Ok(Self {
            display_name: (!name.is_empty()).then(|| name.to_string()),
            address: address.to_string(),
        })
    }

    /// Renders the address for a header, RFC 2047-encoding a display name
    /// that is not plain ASCII.
    #[must_use]
    pub fn encode(&self) -> String {
        match &self.display_name {
            Some(name) if !name.is_ascii() => {
                let word = rfc2047::encode(WordEncoding::Q, encoding_rs::UTF_8, name);
                format!("{word} <{}>", self.address)
            }
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            Some(name) if needs_quotes(name) => {
                let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "\"{escaped}\" <{}>", self.address)
            }
            Some(name) => write!(f, "{name} <{}>", self.address),
            None => f.write_str(&self.address),
        }
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Decodes one address token from a header.
///
/// Tries the RFC 2047-decoded text, then the raw text; if neither is a
/// single address, returns a placeholder. Never fails.
#[must_use]
pub fn decode_address(text: &str) -> Address {
    let decoded = rfc2047::decode(text).ok();
    let candidates = [decoded.as_deref(), Some(text)];

    candidates
        .into_iter()
        .flatten()
        .find_map(|candidate| Address::parse(candidate).ok())
        .unwrap_or_else(|| {
            let shown = decoded.as_deref().unwrap_or(text);
            tracing::warn!(text = shown, "unparseable address, using placeholder");
            placeholder(shown)
        })
}

fn placeholder(text: &str) -> Address {
    let local = Alphanumeric.sample_string(&mut rand::thread_rng(), PLACEHOLDER_LOCAL_LEN);
    let host = gethostname::gethostname()
        .into_string()
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string());
    let name = sanitize(text);
    Address {
        display_name: (!name.is_empty()).then_some(name),
        address: format!("{local}@{host}"),
    }
}

/// Keeps letters, digits and a few punctuation marks; collapses whitespace.
fn sanitize(text: &str) -> String {
    let kept: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || ".-_'@".contains(c) {
                c
            } else {
                ' '
            }
        })
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses an address-list header value.
///
/// The value is split on commas outside quotes and angle brackets; tokens
/// without `@` are dropped.
#[must_use]
pub fn parse_list(value: &str) -> Vec<Address> {
    split_list(value)
        .into_iter()
        .filter(|token| token.contains('@'))
        .map(decode_address)
        .collect()
}

/// Renders an address list for a header.
#[must_use]
pub fn format_list(addresses: &[Address]) -> String {
    addresses
        .iter()
        .map(Address::encode)
        .collect::<Vec<_>>()
        .join(", ")
}

fn split_list(value: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut angle = false;
    for (i, c) in value.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '<' if !quoted => angle = true,
            '>' if !quoted => angle = false,
            ',' if !quoted && !angle => {
                tokens.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    tokens.push(&value[start..]);
    tokens
}

fn count_unquoted(text: &str, needle: char) -> usize {
    let mut quoted = false;
    text.chars()
        .filter(|&c| {
            if c == '"' {
                quoted = !quoted;
            }
            c == needle && !quoted
        })
        .count()
}

fn unquote(text: &str) -> &str {
    let text = text.trim();
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
        .trim()
}

fn needs_quotes(name: &str) -> bool {
    name.contains(|c: char| "()<>[]:;@\\,.\"".contains(c))
}

/// Read-only view of an address-list header.
///
/// Every read re-parses the current header value.
#[derive(Debug, Clone, Copy)]
pub struct AddressList<'a> {
    headers: &'a Headers,
    name: &'static str,
}

impl<'a> AddressList<'a> {
    pub(crate) const fn new(headers: &'a Headers, name: &'static str) -> Self {
        Self { headers, name }
    }

    /// Parses the field into addresses. Empty if the field is absent.
    #[must_use]
    pub fn get(&self) -> Vec<Address> {
        self.headers.get(self.name).map(parse_list).unwrap_or_default()
    }

    /// Number of addresses in the field.
    #[must_use]
    pub fn len(&self) -> usize {
        self.get().len()
    }

    /// Returns true if the field is absent or holds no addresses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.get().is_empty()
    }

    /// Returns true if any entry has this `local@domain`, ignoring case.
    #[must_use]
    pub fn contains(&self, address: &str) -> bool {
        self.get()
            .iter()
            .any(|a| a.address.eq_ignore_ascii_case(address))
    }
}

/// Writable view of an address-list header.
///
/// Every write re-serializes the whole field.
#[derive(Debug)]
pub struct AddressListMut<'a> {
    headers: &'a mut Headers,
    name: &'static str,
}

impl<'a> AddressListMut<'a> {
    pub(crate) const fn new(headers: &'a mut Headers, name: &'static str) -> Self {
        Self { headers, name }
    }

    /// Parses the field into addresses.
    #[must_use]
    pub fn get(&self) -> Vec<Address> {
        AddressList::new(self.headers, self.name).get()
    }

    /// Replaces the field with the given addresses.
    pub fn set(&mut self, addresses: &[Address]) {
        if addresses.is_empty() {
            self.headers.remove(self.name);
        } else {
            self.headers.set(self.name, format_list(addresses));
        }
    }

    /// Appends one address.
    pub fn push(&mut self, address: Address) {
        let mut addresses = self.get();
        addresses.push(address);
        self.set(&addresses);
    }

    /// Removes entries with this `local@domain`, ignoring case.
    pub fn remove(&mut self, address: &str) {
        let mut addresses = self.get();
        addresses.retain(|a| !a.address.eq_ignore_ascii_case(address));
        self.set(&addresses);
    }

    /// Removes the field.
    pub fn clear(&mut self) {
        self.headers.remove(self.name);
    }
}
