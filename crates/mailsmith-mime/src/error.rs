//! Error types for MIME operations.

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unknown charset or transfer encoding, or malformed encoded data.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Structural problem in a message or header.
    #[error("Format error: {0}")]
    Format(String),

    /// Date text that no parsing strategy accepted.
    #[error("Invalid date: {0}")]
    DateFormat(String),

    /// Unparseable mail address.
    #[error("Invalid address: {0}")]
    AddressFormat(String),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// Attempt to mutate a node parsed out of a multipart body.
    #[error("Message part is read-only")]
    ReadOnly,

    /// No part with the requested media type.
    #[error("No part with media type {0}")]
    PartNotFound(String),

    /// I/O error while loading or saving a message.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
