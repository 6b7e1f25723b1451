//! IMAP connection management.
//!
//! This module provides connection handling for IMAP servers, including:
//! - Configuration (host, port, security mode, timeouts)
//! - TLS/plaintext stream abstraction
//! - Framed I/O with literal support
//! - The command-level client

mod client;
mod config;
mod framed;
mod stream;

pub use client::Client;
pub use config::{Config, ConfigBuilder, DEFAULT_READY_MARKER, Security};
pub use framed::FramedStream;
pub use stream::{ImapStream, connect, connect_plain, connect_tls, create_tls_connector};
