//! Framed I/O for IMAP protocol.
//!
//! Answers are read line by line until the completion line for the
//! expected tag. A line ending in `{N}` is followed by exactly `N` raw
//! bytes, which are read as a block and never inspected for tags.

#![allow(clippy::missing_errors_doc)]

use std::io;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::answer::{Answer, literal_size};
use crate::{Error, Result};

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Maximum line length to prevent memory exhaustion.
const MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Maximum literal size to prevent memory exhaustion.
const MAX_LITERAL_SIZE: usize = 100 * 1024 * 1024;

/// Framed connection for IMAP protocol.
///
/// Handles line-based reading with literal support and buffered writing.
pub struct FramedStream<S> {
    reader: BufReader<S>,
    write_buffer: BytesMut,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new framed stream.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, stream),
            write_buffer: BytesMut::with_capacity(DEFAULT_BUFFER_SIZE),
        }
    }

    /// Reads until the line that starts with `tag` followed by a space.
    ///
    /// The tag `+` also matches a bare `+` line. With `Some(limit)` the
    /// whole read is bounded and fails with [`Error::Timeout`]; the stream
    /// is then mid-answer and should be dropped.
    pub async fn read_answer(&mut self, tag: &str, timeout: Option<Duration>) -> Result<Answer> {
        self.read_answer_for(&[tag], timeout).await
    }

    /// Like [`read_answer`](Self::read_answer) but stops at whichever of
    /// `tags` completes first. The answer carries the tag that matched.
    pub async fn read_answer_for(
        &mut self,
        tags: &[&str],
        timeout: Option<Duration>,
    ) -> Result<Answer> {
        match timeout {
            None => self.collect(tags).await,
            Some(limit) => tokio::time::timeout(limit, self.collect(tags))
                .await
                .map_err(|_| Error::Timeout(limit))?,
        }
    }

    async fn collect(&mut self, tags: &[&str]) -> Result<Answer> {
        let mut data = Vec::new();

        loop {
            let line = self.read_line().await?;

            if let Some(tag) = tags.iter().find(|tag| completes(&line, tag)) {
                let status = String::from_utf8_lossy(line.trim_ascii_end()).into_owned();
                tracing::debug!(tag = %tag, status = %status, "completion line");
                return Ok(Answer::new(*tag, status, data));
            }

            tracing::trace!(bytes = line.len(), "answer line");
            data.extend_from_slice(&line);

            if let Some(size) = literal_size(&line) {
                if size > MAX_LITERAL_SIZE {
                    return Err(Error::ProtocolFormat(format!(
                        "literal too large: {size} bytes (max {MAX_LITERAL_SIZE})"
                    )));
                }
                let start = data.len();
                data.resize(start + size, 0);
                self.reader
                    .read_exact(&mut data[start..])
                    .await
                    .map_err(|e| match e.kind() {
                        io::ErrorKind::UnexpectedEof => Error::PrematureStreamEnd,
                        _ => Error::Io(e),
                    })?;
            }
        }
    }

    /// Reads one line, up to and including `\n`.
    async fn read_line(&mut self) -> Result<Vec<u8>> {
        let mut line = Vec::new();

        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                return Err(Error::PrematureStreamEnd);
            }

            if let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                line.extend_from_slice(&buf[..=pos]);
                self.reader.consume(pos + 1);
                return Ok(line);
            }

            let len = buf.len();
            line.extend_from_slice(buf);
            self.reader.consume(len);

            if line.len() > MAX_LINE_LENGTH {
                return Err(Error::ProtocolFormat("line too long".to_string()));
            }
        }
    }

    /// Writes a command to the stream.
    pub async fn write_command(&mut self, data: &[u8]) -> Result<()> {
        self.write_buffer.clear();
        self.write_buffer.extend_from_slice(data);

        let stream = self.reader.get_mut();
        stream.write_all(&self.write_buffer).await?;
        stream.flush().await?;

        Ok(())
    }

    /// Writes raw data to the stream (for literals).
    pub async fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.reader.get_mut();
        stream.write_all(data).await?;
        stream.flush().await?;

        Ok(())
    }

    /// Gets a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        self.reader.get_ref()
    }

    /// Gets a mutable reference to the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        self.reader.get_mut()
    }

    /// Consumes the framed stream and returns the inner stream.
    ///
    /// Note: Any buffered data will be lost.
    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }
}

/// Returns true if `line` is the completion line for `tag`.
fn completes(line: &[u8], tag: &str) -> bool {
    line.strip_prefix(tag.as_bytes())
        .is_some_and(|rest| rest.first() == Some(&b' ') || rest.trim_ascii().is_empty())
}
