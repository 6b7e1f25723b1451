//! Integration tests for the IMAP client.
//!
//! These tests use a mock stream to simulate IMAP server responses
//! without requiring a real server connection.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mailsmith_imap::{Client, Config, Error, Flag, NumberSequence, SearchCriteria, Security};

const MESSAGE: &str = "From: a@b.com\r\n\
To: c@d.com\r\n\
Subject: Hi\r\n\
Content-Type: multipart/mixed; boundary=XYZ\r\n\
\r\n\
--XYZ\r\n\
Content-Type: text/plain\r\n\
\r\n\
Hello\r\n\
--XYZ\r\n\
Content-Type: text/html\r\n\
\r\n\
<b>Hello</b>\r\n\
--XYZ--\r\n";

const HEADER: &str = "From: =?utf-8?Q?J=C3=B6rg?= <joerg@example.org>\r\n\
Subject: Status\r\n\
Date: Tue, 1 Jul 2003 10:52:37 +0200\r\n\
\r\n";

/// Mock stream that returns predefined responses.
struct MockStream {
    /// Responses to return (in order).
    responses: Cursor<Vec<u8>>,
    /// Captured commands sent by the client.
    sent: Arc<Mutex<Vec<u8>>>,
}

impl MockStream {
    fn new(responses: &[u8]) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let stream = Self {
            responses: Cursor::new(responses.to_vec()),
            sent: Arc::clone(&sent),
        };
        (stream, sent)
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let data = self.responses.get_ref();
        let pos = usize::try_from(self.responses.position()).unwrap();

        if pos >= data.len() {
            return Poll::Ready(Ok(()));
        }

        let remaining = &data[pos..];
        let to_read = remaining.len().min(buf.remaining());
        buf.put_slice(&remaining[..to_read]);
        self.responses.set_position((pos + to_read) as u64);

        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.sent.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailsmith_imap=debug,mailsmith_mime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

fn server_script() -> Vec<u8> {
    let mut script = String::new();
    script.push_str("* OK [CAPABILITY IMAP4rev1] mock ready\r\n");
    script.push_str("01 OK LOGIN completed\r\n");
    script.push_str(
        "* 2 EXISTS\r\n\
* 0 RECENT\r\n\
* OK [UIDVALIDITY 1700000000] UIDs valid\r\n\
* FLAGS (\\Answered \\Flagged \\Deleted \\Seen \\Draft)\r\n\
02 OK [READ-WRITE] SELECT completed\r\n",
    );
    script.push_str("* SEARCH 1 2\r\n03 OK SEARCH completed\r\n");
    script.push_str(&format!(
        "* 1 FETCH (BODY[] {{{}}}\r\n{MESSAGE})\r\n04 OK FETCH completed\r\n",
        MESSAGE.len()
    ));
    script.push_str(&format!(
        "* 2 FETCH (BODY[HEADER] {{{}}}\r\n{HEADER})\r\n05 OK FETCH completed\r\n",
        HEADER.len()
    ));
    script.push_str("+ READY for literal\r\n06 OK [APPENDUID 1 9] APPEND completed\r\n");
    script.push_str("* 1 FETCH (FLAGS (\\Seen))\r\n* 2 FETCH (FLAGS (\\Seen))\r\n07 OK\r\n");
    script.push_str("* BYE logging out\r\n08 OK LOGOUT completed\r\n");
    script.into_bytes()
}

#[tokio::test]
async fn test_full_session() {
    init_tracing();
    let (stream, sent) = MockStream::new(&server_script());
    let mut client = Client::new(stream);

    let greeting = client.greeting().await.unwrap();
    assert!(greeting.text().contains("mock ready"));

    client.login("alice", "s3cret pass").await.unwrap();

    let inbox = client.select("INBOX").await.unwrap();
    assert_eq!(inbox.exists, 2);
    assert_eq!(inbox.uid_validity, Some(1_700_000_000));
    assert!(inbox.flags.contains(&Flag::Seen));
    assert!(!inbox.read_only);

    let unseen = client.search(&SearchCriteria::Unseen).await.unwrap();
    assert_eq!(unseen.to_vec(), vec![1, 2]);

    let message = client.message(1).await.unwrap();
    assert_eq!(message.subject().as_deref(), Some("Hi"));
    assert!(message.is_multipart());
    assert_eq!(message.parts().len(), 2);
    assert_eq!(message.parts()[0].content_type().media_type(), "text/plain");
    assert_eq!(message.parts()[1].content_type().media_type(), "text/html");
    assert_eq!(message.part("text/plain").unwrap().content().unwrap(), "Hello");
    assert!(message.is_valid());

    let header = client.message_header(2).await.unwrap();
    assert_eq!(header.subject().as_deref(), Some("Status"));
    assert_eq!(
        header.from().unwrap().display_name.as_deref(),
        Some("J\u{f6}rg")
    );
    assert!(header.date().unwrap().is_some());

    client.append("Sent", MESSAGE.as_bytes()).await.unwrap();

    client.set_flags(&unseen, &[Flag::Seen]).await.unwrap();

    client.logout().await.unwrap();

    let sent = String::from_utf8(sent.lock().unwrap().clone()).unwrap();
    let expected = format!(
        "01 LOGIN \"alice\" \"s3cret pass\"\r\n\
02 SELECT \"INBOX\"\r\n\
03 SEARCH UNSEEN\r\n\
04 FETCH 1 BODY[]\r\n\
05 FETCH 2 BODY[HEADER]\r\n\
06 APPEND \"Sent\" (\\Seen) {{{}}}\r\n\
{MESSAGE}\r\n\
07 STORE 1,2 +FLAGS (\\Seen)\r\n\
08 LOGOUT\r\n",
        MESSAGE.len()
    );
    assert_eq!(sent, expected);
}

#[tokio::test]
async fn test_search_response_parses_to_sequence() {
    let (stream, _sent) = MockStream::new(b"* SEARCH 2 4 6\r\n01 OK done\r\n");
    let mut client = Client::new(stream);

    let found = client.search(&SearchCriteria::All).await.unwrap();
    assert_eq!(found, NumberSequence::create_list([2, 4, 6]));
}

#[tokio::test]
async fn test_stream_ends_before_completion() {
    let (stream, _sent) = MockStream::new(b"* 1 EXISTS\r\n");
    let mut client = Client::new(stream);

    assert!(matches!(
        client.select("INBOX").await,
        Err(Error::PrematureStreamEnd)
    ));
}

#[tokio::test]
async fn test_truncated_literal_is_an_error() {
    init_tracing();
    let (stream, _sent) =
        MockStream::new(b"* 1 FETCH (BODY[] {100}\r\nFrom: a@b.c\r\n\r\nshort\r\n)\r\n01 OK\r\n");
    let mut client = Client::new(stream);

    assert!(client.message_data(1).await.is_err());
}

#[tokio::test]
async fn test_mailbox_names_are_encoded() {
    let (stream, sent) = MockStream::new(b"01 OK CREATE completed\r\n");
    let mut client = Client::new(stream);

    client.create_mailbox("Entw\u{fc}rfe & Notizen").await.unwrap();
    let sent = String::from_utf8(sent.lock().unwrap().clone()).unwrap();
    assert_eq!(sent, "01 CREATE \"Entw&APw-rfe &- Notizen\"\r\n");
}

#[tokio::test(start_paused = true)]
async fn test_configured_read_timeout() {
    let (client_side, _server_side) = tokio::io::duplex(256);
    let config = Config::builder("localhost")
        .security(Security::None)
        .io_timeout(Duration::from_secs(2))
        .build();
    let mut client = Client::with_config(client_side, &config);

    assert!(matches!(
        client.greeting().await,
        Err(Error::Timeout(d)) if d == Duration::from_secs(2)
    ));
}
