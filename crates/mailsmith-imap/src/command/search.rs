//! SEARCH criteria.

use chrono::NaiveDate;
use mailsmith_mime::format_search_date;

use super::serialize::write_astring;
use crate::sequence::NumberSequence;

/// A search key, composable with [`and`](Self::and), [`or`](Self::or) and `!`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    /// All messages.
    All,
    /// Messages with `\Seen`.
    Seen,
    /// Messages without `\Seen`.
    Unseen,
    /// Messages with `\Answered`.
    Answered,
    /// Messages with `\Deleted`.
    Deleted,
    /// Messages with `\Flagged`.
    Flagged,
    /// Messages with `\Draft`.
    Draft,
    /// Recent and unseen.
    New,
    /// Not recent.
    Old,
    /// Messages with `\Recent`.
    Recent,
    /// Messages without `\Answered`.
    Unanswered,
    /// Messages without `\Deleted`.
    Undeleted,
    /// Messages without `\Draft`.
    Undraft,
    /// Messages without `\Flagged`.
    Unflagged,
    /// Messages with the keyword flag set.
    Keyword(String),
    /// Messages without the keyword flag.
    Unkeyword(String),
    /// `From` contains the string.
    From(String),
    /// `To` contains the string.
    To(String),
    /// `Cc` contains the string.
    Cc(String),
    /// `Bcc` contains the string.
    Bcc(String),
    /// `Subject` contains the string.
    Subject(String),
    /// Body contains the string.
    Body(String),
    /// Header or body contains the string.
    Text(String),
    /// The named header contains the value.
    Header(String, String),
    /// Internal date on or after the day.
    Since(NaiveDate),
    /// Internal date before the day.
    Before(NaiveDate),
    /// Internal date within the day.
    On(NaiveDate),
    /// Date header on or after the day.
    SentSince(NaiveDate),
    /// Date header before the day.
    SentBefore(NaiveDate),
    /// Date header within the day.
    SentOn(NaiveDate),
    /// Size in octets larger than this.
    Larger(u32),
    /// Size in octets smaller than this.
    Smaller(u32),
    /// Message numbers in the set.
    Sequence(NumberSequence),
    /// UIDs in the set; a single UID is a one-element set.
    Uid(NumberSequence),
    /// Every criterion matches.
    And(Vec<Self>),
    /// Either criterion matches.
    Or(Box<Self>, Box<Self>),
    /// The criterion does not match.
    Not(Box<Self>),
}

impl SearchCriteria {
    /// Both `self` and `other`. Nested conjunctions are flattened.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), other) => {
                left.push(other);
                Self::And(left)
            }
            (this, other) => Self::And(vec![this, other]),
        }
    }

    /// Either `self` or `other`.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// Renders the criteria as SEARCH arguments.
    #[must_use]
    pub fn to_command(&self) -> String {
        let mut buf = String::new();
        self.write(&mut buf);
        buf
    }

    fn write(&self, buf: &mut String) {
        match self {
            Self::All => buf.push_str("ALL"),
            Self::Seen => buf.push_str("SEEN"),
            Self::Unseen => buf.push_str("UNSEEN"),
            Self::Answered => buf.push_str("ANSWERED"),
            Self::Deleted => buf.push_str("DELETED"),
            Self::Flagged => buf.push_str("FLAGGED"),
            Self::Draft => buf.push_str("DRAFT"),
            Self::New => buf.push_str("NEW"),
            Self::Old => buf.push_str("OLD"),
            Self::Recent => buf.push_str("RECENT"),
            Self::Unanswered => buf.push_str("UNANSWERED"),
            Self::Undeleted => buf.push_str("UNDELETED"),
            Self::Undraft => buf.push_str("UNDRAFT"),
            Self::Unflagged => buf.push_str("UNFLAGGED"),
            Self::Keyword(flag) => keyed(buf, "KEYWORD", flag),
            Self::Unkeyword(flag) => keyed(buf, "UNKEYWORD", flag),
            Self::From(s) => keyed(buf, "FROM", s),
            Self::To(s) => keyed(buf, "TO", s),
            Self::Cc(s) => keyed(buf, "CC", s),
            Self::Bcc(s) => keyed(buf, "BCC", s),
            Self::Subject(s) => keyed(buf, "SUBJECT", s),
            Self::Body(s) => keyed(buf, "BODY", s),
            Self::Text(s) => keyed(buf, "TEXT", s),
            Self::Header(name, value) => {
                keyed(buf, "HEADER", name);
                buf.push(' ');
                write_astring(buf, value);
            }
            Self::Since(date) => dated(buf, "SINCE", *date),
            Self::Before(date) => dated(buf, "BEFORE", *date),
            Self::On(date) => dated(buf, "ON", *date),
            Self::SentSince(date) => dated(buf, "SENTSINCE", *date),
            Self::SentBefore(date) => dated(buf, "SENTBEFORE", *date),
            Self::SentOn(date) => dated(buf, "SENTON", *date),
            Self::Larger(size) => buf.push_str(&format!("LARGER {size}")),
            Self::Smaller(size) => buf.push_str(&format!("SMALLER {size}")),
            Self::Sequence(set) => buf.push_str(&set.to_string()),
            Self::Uid(set) => buf.push_str(&format!("UID {set}")),
            Self::And(all) => match all.as_slice() {
                [] => buf.push_str("ALL"),
                [only] => only.write(buf),
                _ => {
                    buf.push('(');
                    for (i, criteria) in all.iter().enumerate() {
                        if i > 0 {
                            buf.push(' ');
                        }
                        criteria.write(buf);
                    }
                    buf.push(')');
                }
            },
            Self::Or(a, b) => {
                buf.push_str("OR ");
                a.write(buf);
                buf.push(' ');
                b.write(buf);
            }
            Self::Not(inner) => {
                buf.push_str("NOT ");
                inner.write(buf);
            }
        }
    }
}

impl std::ops::Not for SearchCriteria {
    type Output = Self;

    fn not(self) -> Self {
        Self::Not(Box::new(self))
    }
}

fn keyed(buf: &mut String, key: &str, value: &str) {
    buf.push_str(key);
    buf.push(' ');
    write_astring(buf, value);
}

fn dated(buf: &mut String, key: &str, date: NaiveDate) {
    buf.push_str(key);
    buf.push(' ');
    buf.push_str(&format_search_date(date));
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_keys() {
        assert_eq!(SearchCriteria::All.to_command(), "ALL");
        assert_eq!(SearchCriteria::Unseen.to_command(), "UNSEEN");
        assert_eq!(SearchCriteria::Larger(1024).to_command(), "LARGER 1024");
    }

    #[test]
    fn test_negated_flag_keys() {
        let keys = [
            (SearchCriteria::Old, "OLD"),
            (SearchCriteria::Recent, "RECENT"),
            (SearchCriteria::Unanswered, "UNANSWERED"),
            (SearchCriteria::Undeleted, "UNDELETED"),
            (SearchCriteria::Undraft, "UNDRAFT"),
            (SearchCriteria::Unflagged, "UNFLAGGED"),
        ];
        for (criteria, expected) in keys {
            assert_eq!(criteria.to_command(), expected);
        }
    }

    #[test]
    fn test_keyword_and_bcc() {
        assert_eq!(
            SearchCriteria::Keyword("$Work".into()).to_command(),
            "KEYWORD $Work"
        );
        assert_eq!(
            SearchCriteria::Unkeyword("$Junk".into()).to_command(),
            "UNKEYWORD $Junk"
        );
        assert_eq!(
            SearchCriteria::Bcc("audit@example.com".into()).to_command(),
            "BCC audit@example.com"
        );
    }

    #[test]
    fn test_uid_sets() {
        assert_eq!(
            SearchCriteria::Uid(NumberSequence::create_list([42])).to_command(),
            "UID 42"
        );
        assert_eq!(
            SearchCriteria::Uid(NumberSequence::create_range(100, 5)).to_command(),
            "UID 100:104"
        );
    }

    #[test]
    fn test_string_arguments_are_astrings() {
        assert_eq!(
            SearchCriteria::From("alice@example.com".into()).to_command(),
            "FROM alice@example.com"
        );
        assert_eq!(
            SearchCriteria::Subject("weekly report".into()).to_command(),
            "SUBJECT \"weekly report\""
        );
        assert_eq!(
            SearchCriteria::Header("X-Mailer".into(), "".into()).to_command(),
            "HEADER X-Mailer \"\""
        );
    }

    #[test]
    fn test_dates_use_month_names() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(SearchCriteria::Since(date).to_command(), "SINCE 5-Mar-2024");
        assert_eq!(SearchCriteria::On(date).to_command(), "ON 5-Mar-2024");
        assert_eq!(
            SearchCriteria::SentSince(date).to_command(),
            "SENTSINCE 5-Mar-2024"
        );
        assert_eq!(
            SearchCriteria::SentBefore(date).to_command(),
            "SENTBEFORE 5-Mar-2024"
        );
        assert_eq!(SearchCriteria::SentOn(date).to_command(), "SENTON 5-Mar-2024");
    }

    #[test]
    fn test_composition() {
        let criteria = SearchCriteria::Unseen
            .and(SearchCriteria::From("bob".into()))
            .and(!SearchCriteria::Deleted);
        assert_eq!(criteria.to_command(), "(UNSEEN FROM bob NOT DELETED)");

        let either = SearchCriteria::Flagged.or(SearchCriteria::Sequence(
            NumberSequence::create_range(1, 10),
        ));
        assert_eq!(either.to_command(), "OR FLAGGED 1:10");
    }

    #[test]
    fn test_degenerate_conjunctions() {
        assert_eq!(SearchCriteria::And(Vec::new()).to_command(), "ALL");
        assert_eq!(
            SearchCriteria::And(vec![SearchCriteria::Seen]).to_command(),
            "SEEN"
        );
    }
}
