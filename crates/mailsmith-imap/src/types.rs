//! Flags and mailbox status.

use crate::answer::Answer;
use crate::tokenizer::split_answer;
use crate::Result;

/// Message flags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Flag {
    /// Message has been read.
    Seen,
    /// Message has been answered.
    Answered,
    /// Message is flagged for special attention.
    Flagged,
    /// Message is marked for deletion.
    Deleted,
    /// Message is a draft.
    Draft,
    /// Message is recent (first session to see it).
    Recent,
    /// Custom keyword flag, or `\*` in PERMANENTFLAGS.
    Keyword(String),
}

impl Flag {
    /// Parses a flag string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "\\SEEN" => Self::Seen,
            "\\ANSWERED" => Self::Answered,
            "\\FLAGGED" => Self::Flagged,
            "\\DELETED" => Self::Deleted,
            "\\DRAFT" => Self::Draft,
            "\\RECENT" => Self::Recent,
            _ => Self::Keyword(s.to_string()),
        }
    }

    /// Returns the flag as an IMAP string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Seen => "\\Seen",
            Self::Answered => "\\Answered",
            Self::Flagged => "\\Flagged",
            Self::Deleted => "\\Deleted",
            Self::Draft => "\\Draft",
            Self::Recent => "\\Recent",
            Self::Keyword(s) => s,
        }
    }

    /// Parses a parenthesized list such as `(\Seen $Junk)`.
    #[must_use]
    pub fn parse_list(s: &str) -> Vec<Self> {
        s.trim()
            .trim_start_matches('(')
            .trim_end_matches(')')
            .split_whitespace()
            .map(Self::parse)
            .collect()
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of a mailbox reported by SELECT or EXAMINE.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailboxInfo {
    /// Number of messages.
    pub exists: u32,
    /// Number of messages with `\Recent`.
    pub recent: u32,
    /// First unseen message number, if reported.
    pub unseen: Option<u32>,
    /// UIDVALIDITY, if reported.
    pub uid_validity: Option<u32>,
    /// Predicted next UID, if reported.
    pub uid_next: Option<u32>,
    /// Flags defined in the mailbox.
    pub flags: Vec<Flag>,
    /// Flags the client may change permanently.
    pub permanent_flags: Vec<Flag>,
    /// The mailbox was opened read-only.
    pub read_only: bool,
}

impl MailboxInfo {
    /// Collects mailbox state from a SELECT or EXAMINE answer.
    ///
    /// # Errors
    ///
    /// Returns a protocol format error if a response code is unbalanced.
    pub fn from_answer(answer: &Answer) -> Result<Self> {
        let mut info = Self::default();

        for line in answer.lines() {
            let Some(rest) = line.strip_prefix("* ") else {
                continue;
            };
            if let Some((count, keyword)) = rest.split_once(' ')
                && let Ok(count) = count.parse::<u32>()
            {
                match keyword.trim().to_ascii_uppercase().as_str() {
                    "EXISTS" => info.exists = count,
                    "RECENT" => info.recent = count,
                    _ => {}
                }
                continue;
            }
            if let Some(text) = strip_keyword(rest, "OK") {
                if let Some(code) = response_code(text) {
                    info.apply_code(code)?;
                }
            } else if let Some(list) = strip_keyword(rest, "FLAGS") {
                info.flags = Flag::parse_list(list);
            }
        }

        if let Some(code) = response_code(answer.text()) {
            info.apply_code(code)?;
        }
        Ok(info)
    }

    fn apply_code(&mut self, code: &str) -> Result<()> {
        let Some(inner) = code.strip_prefix('[').and_then(|c| c.strip_suffix(']')) else {
            return Ok(());
        };
        let parts = split_answer(inner)?;
        let Some(name) = parts.first() else {
            return Ok(());
        };
        let number = || parts.get(1).and_then(|v| v.parse().ok());
        match name.to_ascii_uppercase().as_str() {
            "UNSEEN" => self.unseen = number(),
            "UIDVALIDITY" => self.uid_validity = number(),
            "UIDNEXT" => self.uid_next = number(),
            "PERMANENTFLAGS" => {
                self.permanent_flags = parts
                    .get(1)
                    .map(|list| Flag::parse_list(list))
                    .unwrap_or_default();
            }
            "READ-ONLY" => self.read_only = true,
            "READ-WRITE" => self.read_only = false,
            _ => {}
        }
        Ok(())
    }
}

fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let head = line.get(..keyword.len())?;
    let tail = &line[keyword.len()..];
    (head.eq_ignore_ascii_case(keyword) && (tail.is_empty() || tail.starts_with(' ')))
        .then(|| tail.trim_start())
}

/// Leading `[...]` of a status text.
fn response_code(text: &str) -> Option<&str> {
    if !text.starts_with('[') {
        return None;
    }
    text.find(']').map(|end| &text[..=end])
}
