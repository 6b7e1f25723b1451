//! The result of one command exchange.

use crate::{Error, Result};

/// Everything the server sent for one tag.
///
/// `data` holds every byte that arrived before the completion line,
/// untagged lines and literal payloads alike, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    tag: String,
    status_line: String,
    data: Vec<u8>,
}

impl Answer {
    /// Creates an answer from its parts.
    #[must_use]
    pub fn new(tag: impl Into<String>, status_line: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            tag: tag.into(),
            status_line: status_line.into(),
            data,
        }
    }

    /// Tag the answer was read for.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The completion line, without its line break.
    #[must_use]
    pub fn status_line(&self) -> &str {
        &self.status_line
    }

    /// Bytes received before the completion line.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Second whitespace-separated field of the completion line.
    #[must_use]
    pub fn status(&self) -> &str {
        self.status_line.split_whitespace().nth(1).unwrap_or_default()
    }

    /// Returns true if the status is `OK`, in any case.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status().eq_ignore_ascii_case("OK")
    }

    /// Completion text after the tag and status.
    #[must_use]
    pub fn text(&self) -> &str {
        let mut rest = self.status_line.trim_start();
        for _ in 0..2 {
            rest = rest
                .split_once(char::is_whitespace)
                .map_or("", |(_, tail)| tail.trim_start());
        }
        rest
    }

    /// Lines of `data`, line breaks removed, blank lines skipped.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.data
            .split(|&b| b == b'\n')
            .map(|line| String::from_utf8_lossy(line.trim_ascii_end()).into_owned())
            .filter(|line| !line.is_empty())
    }

    /// Payloads of untagged lines starting with `keyword`.
    ///
    /// For `* SEARCH 2 4 6` and keyword `SEARCH` this yields `"2 4 6"`.
    pub fn untagged<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = String> + 'a {
        self.lines().filter_map(move |line| {
            let rest = line.strip_prefix("* ")?;
            let head = rest.get(..keyword.len())?;
            if !head.eq_ignore_ascii_case(keyword) {
                return None;
            }
            let tail = &rest[keyword.len()..];
            if tail.is_empty() || tail.starts_with(' ') {
                Some(tail.trim_start().to_string())
            } else {
                None
            }
        })
    }

    /// Turns a non-OK completion into [`Error::CommandFailure`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::CommandFailure`] with the completion line when the
    /// status is not `OK`.
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::CommandFailure {
                tag: self.tag,
                text: self.status_line,
            })
        }
    }

    /// The payload announced by the first `{N}` line in `data`.
    ///
    /// Exactly `N` bytes are taken starting right after that line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProtocolFormat`] when no line announces a literal or
    /// fewer than `N` bytes follow it.
    pub fn literal(&self) -> Result<&[u8]> {
        let mut start = 0;
        while start < self.data.len() {
            let end = self.data[start..]
                .iter()
                .position(|&b| b == b'\n')
                .map_or(self.data.len(), |i| start + i + 1);
            if let Some(size) = literal_size(&self.data[start..end]) {
                let stop = end.checked_add(size).unwrap_or(usize::MAX);
                return self.data.get(end..stop).ok_or_else(|| {
                    Error::ProtocolFormat(format!(
                        "literal announced {size} bytes, only {} available",
                        self.data.len() - end
                    ))
                });
            }
            start = end;
        }
        Err(Error::ProtocolFormat(format!(
            "no literal in answer to {}",
            self.tag
        )))
    }
}

/// Size announced by a line ending in `{N}` or `{N+}`.
pub(crate) fn literal_size(line: &[u8]) -> Option<usize> {
    let line = line.trim_ascii_end();
    let inner = line.strip_suffix(b"}")?;
    let open = inner.iter().rposition(|&b| b == b'{')?;
    let digits = &inner[open + 1..];
    let digits = digits.strip_suffix(b"+").unwrap_or(digits);
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn answer(status: &str, data: &str) -> Answer {
        Answer::new("0A", status, data.as_bytes().to_vec())
    }

    #[test]
    fn test_status() {
        let ok = answer("A01 OK done", "");
        assert_eq!(ok.status(), "OK");
        assert!(ok.is_success());
        assert_eq!(ok.text(), "done");

        let lower = answer("A01 ok", "");
        assert!(lower.is_success());
        assert_eq!(lower.text(), "");

        let no = answer("A01 NO [TRYCREATE] no such mailbox", "");
        assert!(!no.is_success());
        assert_eq!(no.text(), "[TRYCREATE] no such mailbox");
    }

    #[test]
    fn test_into_result() {
        assert!(answer("0A OK", "").into_result().is_ok());
        match answer("0A BAD parse error", "").into_result() {
            Err(Error::CommandFailure { tag, text }) => {
                assert_eq!(tag, "0A");
                assert_eq!(text, "0A BAD parse error");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_untagged() {
        let a = answer("0A OK", "* SEARCH 2 4 6\r\n* 3 EXISTS\r\n* SEARCHING x\r\n* search\r\n");
        let found: Vec<String> = a.untagged("SEARCH").collect();
        assert_eq!(found, vec!["2 4 6", ""]);
    }

    #[test]
    fn test_lines_skip_blanks() {
        let a = answer("0A OK", "one\r\n\r\ntwo\n");
        assert_eq!(a.lines().collect::<Vec<_>>(), vec!["one", "two"]);
    }

    #[test]
    fn test_literal() {
        let a = answer("0A OK", "* 1 FETCH (BODY[HEADER] {11}\r\nSubject: x\n)\r\n");
        assert_eq!(a.literal().unwrap(), b"Subject: x\n");
    }

    #[test]
    fn test_short_literal_fails() {
        let a = answer("0A OK", "* 1 FETCH (BODY[] {50}\r\nshort)\r\n");
        assert!(matches!(a.literal(), Err(Error::ProtocolFormat(_))));
    }

    #[test]
    fn test_missing_literal_fails() {
        let a = answer("0A OK", "* 1 FETCH (FLAGS (\\Seen))\r\n");
        assert!(matches!(a.literal(), Err(Error::ProtocolFormat(_))));
    }

    #[test]
    fn test_literal_size() {
        assert_eq!(literal_size(b"BODY {123}\r\n"), Some(123));
        assert_eq!(literal_size(b"BODY {123+}\r\n"), Some(123));
        assert_eq!(literal_size(b"{0}\n"), Some(0));
        assert_eq!(literal_size(b"no literal\r\n"), None);
        assert_eq!(literal_size(b"wrong {abc}\r\n"), None);
        assert_eq!(literal_size(b"empty {}\r\n"), None);
    }
}
