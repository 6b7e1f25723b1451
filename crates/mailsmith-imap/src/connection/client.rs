//! IMAP client connection.
//!
//! One command is in flight at a time: every command takes `&mut self` and
//! returns only after its completion line has been read. Tags come from a
//! counter owned by the connection.

#![allow(clippy::missing_errors_doc)]

use std::time::Duration;

use mailsmith_mime::Message;
use mailsmith_mime::encoding::decode_mailbox;
use tokio::io::{AsyncRead, AsyncWrite};

use super::config::{Config, DEFAULT_READY_MARKER};
use super::framed::FramedStream;
use crate::answer::Answer;
use crate::command::serialize::{check_sendable, write_flag_list, write_mailbox, write_quoted};
use crate::command::{SearchCriteria, TagGenerator};
use crate::sequence::NumberSequence;
use crate::tokenizer::{split_answer, unquote};
use crate::types::{Flag, MailboxInfo};
use crate::{Error, Result};

/// IMAP client connection.
pub struct Client<S> {
    stream: FramedStream<S>,
    tag_gen: TagGenerator,
    io_timeout: Option<Duration>,
    ready_marker: String,
}

// Manual Debug implementation since FramedStream doesn't implement Debug
impl<S> std::fmt::Debug for Client<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("tag_gen", &self.tag_gen)
            .field("io_timeout", &self.io_timeout)
            .field("ready_marker", &self.ready_marker)
            .finish_non_exhaustive()
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an established stream. Reads block without a time limit.
    pub fn new(stream: S) -> Self {
        Self {
            stream: FramedStream::new(stream),
            tag_gen: TagGenerator::new(),
            io_timeout: None,
            ready_marker: DEFAULT_READY_MARKER.to_string(),
        }
    }

    /// Wraps an established stream, taking timeouts and the continuation
    /// marker from `config`.
    pub fn with_config(stream: S, config: &Config) -> Self {
        Self {
            io_timeout: config.io_timeout,
            ready_marker: config.ready_marker.clone(),
            ..Self::new(stream)
        }
    }

    /// Reads the untagged server greeting.
    ///
    /// `OK` and `PREAUTH` are accepted; anything else, such as `BYE`, is a
    /// [`Error::CommandFailure`].
    pub async fn greeting(&mut self) -> Result<Answer> {
        let answer = self.stream.read_answer("*", self.io_timeout).await?;
        if answer.status().eq_ignore_ascii_case("PREAUTH") {
            return Ok(answer);
        }
        answer.into_result()
    }

    /// Sends `command` under a fresh tag and reads its answer.
    ///
    /// Fails with [`Error::CommandFailure`] unless the status is `OK`.
    pub async fn send_command(&mut self, command: &str) -> Result<Answer> {
        check_sendable("command", command)?;
        let tag = self.tag_gen.next_tag();
        tracing::debug!(tag = %tag, verb = verb(command), "sending command");

        self.stream
            .write_command(format!("{tag} {command}\r\n").as_bytes())
            .await?;
        self.stream
            .read_answer(&tag, self.io_timeout)
            .await?
            .into_result()
    }

    /// Sends `command` followed by `data` as a synchronizing literal.
    ///
    /// The command line ends in `{N}`; the payload is only written after
    /// the server answers with the ready marker.
    pub async fn send_literal(&mut self, command: &str, data: &[u8]) -> Result<Answer> {
        check_sendable("command", command)?;
        let tag = self.tag_gen.next_tag();
        tracing::debug!(tag = %tag, verb = verb(command), size = data.len(), "sending literal");

        self.stream
            .write_command(format!("{tag} {command} {{{}}}\r\n", data.len()).as_bytes())
            .await?;

        let continuation = self
            .stream
            .read_answer_for(&["+", tag.as_str()], self.io_timeout)
            .await?;
        if continuation.tag() == tag {
            continuation.into_result()?;
            return Err(Error::ProtocolFormat(format!(
                "command {tag} completed without requesting its literal"
            )));
        }
        if !continuation.status_line().starts_with(&self.ready_marker) {
            return Err(Error::ProtocolFormat(format!(
                "expected {:?}, got {:?}",
                self.ready_marker,
                continuation.status_line()
            )));
        }

        self.stream.write_raw(data).await?;
        self.stream.write_raw(b"\r\n").await?;
        self.stream
            .read_answer(&tag, self.io_timeout)
            .await?
            .into_result()
    }

    /// Authenticates with LOGIN.
    pub async fn login(&mut self, user: &str, password: &str) -> Result<()> {
        check_sendable("user name", user)?;
        check_sendable("password", password)?;
        let mut command = String::from("LOGIN ");
        write_quoted(&mut command, user);
        command.push(' ');
        write_quoted(&mut command, password);
        self.send_command(&command).await?;
        Ok(())
    }

    /// Sends NOOP.
    pub async fn noop(&mut self) -> Result<()> {
        self.send_command("NOOP").await?;
        Ok(())
    }

    /// Lists mailbox names matching `pattern` under `reference`, decoded.
    pub async fn list_mailboxes(&mut self, reference: &str, pattern: &str) -> Result<Vec<String>> {
        let mut command = String::from("LIST ");
        write_mailbox(&mut command, reference);
        command.push(' ');
        write_mailbox(&mut command, pattern);
        let answer = self.send_command(&command).await?;

        let mut names = Vec::new();
        for line in answer.lines() {
            let parts = split_answer(&line)?;
            let is_list = parts.get(1).is_some_and(|p| p.eq_ignore_ascii_case("LIST"));
            if parts.first().map(String::as_str) != Some("*") || !is_list {
                continue;
            }
            let name = parts.get(4).ok_or_else(|| {
                Error::ProtocolFormat(format!("LIST line without a name: {line:?}"))
            })?;
            names.push(decode_mailbox(&unquote(name))?);
        }
        Ok(names)
    }

    /// Creates a mailbox.
    pub async fn create_mailbox(&mut self, name: &str) -> Result<()> {
        let mut command = String::from("CREATE ");
        write_mailbox(&mut command, name);
        self.send_command(&command).await?;
        Ok(())
    }

    /// Opens a mailbox for reading and writing.
    pub async fn select(&mut self, name: &str) -> Result<MailboxInfo> {
        self.open_mailbox("SELECT", name).await
    }

    /// Opens a mailbox read-only.
    pub async fn examine(&mut self, name: &str) -> Result<MailboxInfo> {
        let mut info = self.open_mailbox("EXAMINE", name).await?;
        info.read_only = true;
        Ok(info)
    }

    async fn open_mailbox(&mut self, verb: &str, name: &str) -> Result<MailboxInfo> {
        let mut command = format!("{verb} ");
        write_mailbox(&mut command, name);
        let answer = self.send_command(&command).await?;
        MailboxInfo::from_answer(&answer)
    }

    /// Raw bytes of message `number` in the selected mailbox.
    pub async fn message_data(&mut self, number: u32) -> Result<Vec<u8>> {
        let answer = self.send_command(&format!("FETCH {number} BODY[]")).await?;
        Ok(answer.literal()?.to_vec())
    }

    /// Message `number`, parsed.
    pub async fn message(&mut self, number: u32) -> Result<Message> {
        Ok(Message::parse(self.message_data(number).await?))
    }

    /// Header block of message `number`, parsed as a body-less message.
    pub async fn message_header(&mut self, number: u32) -> Result<Message> {
        let answer = self
            .send_command(&format!("FETCH {number} BODY[HEADER]"))
            .await?;
        Ok(Message::parse(answer.literal()?.to_vec()))
    }

    /// Stores `message` in `mailbox`, marked `\Seen`.
    pub async fn append(&mut self, mailbox: &str, message: &[u8]) -> Result<()> {
        let mut command = String::from("APPEND ");
        write_mailbox(&mut command, mailbox);
        command.push(' ');
        write_flag_list(&mut command, &[Flag::Seen]);
        self.send_literal(&command, message).await?;
        Ok(())
    }

    /// Message numbers matching `criteria`. No `* SEARCH` line means none.
    pub async fn search(&mut self, criteria: &SearchCriteria) -> Result<NumberSequence> {
        let answer = self
            .send_command(&format!("SEARCH {}", criteria.to_command()))
            .await?;
        let mut found: Option<NumberSequence> = None;
        for payload in answer.untagged("SEARCH") {
            let numbers: NumberSequence = payload.parse()?;
            found = Some(match found {
                None => numbers,
                Some(previous) => previous + numbers,
            });
        }
        Ok(found.unwrap_or_default())
    }

    /// Adds `flags` to every message in `set`.
    pub async fn set_flags(&mut self, set: &NumberSequence, flags: &[Flag]) -> Result<()> {
        if set.is_empty() {
            return Err(Error::InvalidArgument("empty message set".to_string()));
        }
        let mut command = format!("STORE {set} +FLAGS ");
        write_flag_list(&mut command, flags);
        self.send_command(&command).await?;
        Ok(())
    }

    /// Removes `\Deleted` messages; returns the numbers the server reported.
    pub async fn expunge(&mut self) -> Result<Vec<u32>> {
        let answer = self.send_command("EXPUNGE").await?;
        Ok(answer
            .lines()
            .filter_map(|line| {
                let (number, keyword) = line.strip_prefix("* ")?.split_once(' ')?;
                if !keyword.trim().eq_ignore_ascii_case("EXPUNGE") {
                    return None;
                }
                number.parse().ok()
            })
            .collect())
    }

    /// Closes the selected mailbox.
    pub async fn close(&mut self) -> Result<()> {
        self.send_command("CLOSE").await?;
        Ok(())
    }

    /// Ends the session. The stream is dropped on every path.
    pub async fn logout(mut self) -> Result<()> {
        self.send_command("LOGOUT").await?;
        Ok(())
    }

    /// Gets a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        self.stream.get_ref()
    }

    /// Consumes the client and returns the stream.
    pub fn into_inner(self) -> S {
        self.stream.into_inner()
    }
}

fn verb(command: &str) -> &str {
    command.split_whitespace().next().unwrap_or_default()
}
