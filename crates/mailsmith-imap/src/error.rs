//! Error types for the IMAP library.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during IMAP operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS handshake or encryption error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// Malformed server data: unbalanced brackets, missing or short literal,
    /// unexpected continuation.
    #[error("Protocol format error: {0}")]
    ProtocolFormat(String),

    /// The stream ended before the tagged completion line arrived.
    #[error("Stream ended before tagged response")]
    PrematureStreamEnd,

    /// The server completed a command with a status other than OK.
    #[error("Command {tag} failed: {text}")]
    CommandFailure {
        /// Tag of the failed command.
        tag: String,
        /// Status and text from the completion line.
        text: String,
    },

    /// Operation timed out.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Fetched message data could not be decoded.
    #[error("Message error: {0}")]
    Mime(#[from] mailsmith_mime::Error),

    /// Caller-supplied value cannot be sent.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
