//! # mailsmith-imap
//!
//! An async IMAP client built around strict answer framing.
//!
//! ## Features
//!
//! - **Tagged answers**: every command gets a fresh per-connection tag and
//!   its answer is read up to the matching completion line
//! - **Literal framing**: `{N}` payloads are read as raw blocks on the way
//!   in and sent only after the server's continuation on the way out
//! - **Sequence sets**: parsing, formatting and union of message-number sets
//! - **TLS via rustls**: secure connections without OpenSSL dependency
//! - **Injectable timeouts**: reads block by default and can be bounded
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailsmith_imap::{Client, Config, SearchCriteria, Security};
//!
//! #[tokio::main]
//! async fn main() -> mailsmith_imap::Result<()> {
//!     let config = Config::new("imap.example.com", Security::Implicit);
//!     let stream = mailsmith_imap::connect_tls(&config).await?;
//!     let mut client = Client::with_config(stream, &config);
//!     client.greeting().await?;
//!
//!     client.login("user@example.com", "password").await?;
//!     for name in client.list_mailboxes("", "*").await? {
//!         println!("Folder: {name}");
//!     }
//!
//!     let inbox = client.select("INBOX").await?;
//!     println!("Messages: {}", inbox.exists);
//!
//!     let unseen = client.search(&SearchCriteria::Unseen).await?;
//!     for number in &unseen {
//!         let message = client.message(number).await?;
//!         println!("{}", message.subject().unwrap_or_default());
//!     }
//!
//!     client.logout().await
//! }
//! ```
//!
//! ## Modules
//!
//! - [`command`]: tags, argument quoting and SEARCH criteria
//! - [`connection`]: configuration, transport, framing and the client
//! - [`sequence`]: message-number sets
//! - [`tokenizer`]: splitting answer lines into top-level units
//! - [`types`]: flags and mailbox state

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod answer;
pub mod command;
pub mod connection;
mod error;
pub mod sequence;
pub mod tokenizer;
pub mod types;

pub use answer::Answer;
pub use command::{SearchCriteria, TagGenerator};
pub use connection::{
    Client, Config, ConfigBuilder, FramedStream, ImapStream, Security, connect, connect_plain,
    connect_tls,
};
pub use error::{Error, Result};
pub use sequence::NumberSequence;
pub use tokenizer::{split_answer, unquote};
pub use types::{Flag, MailboxInfo};
