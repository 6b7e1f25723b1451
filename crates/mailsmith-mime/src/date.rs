//! Date header parsing and rendering.
//!
//! Parsing walks [`STRATEGIES`] in order: strict RFC 2822, RFC 3339, a few
//! common non-standard layouts, and finally a token heuristic that copes
//! with most of what old mailers produce.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone};

use crate::error::{Error, Result};

/// Layout of the `Date` header written by [`format_date`].
pub const HEADER_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Layout of IMAP search dates (`5-Mar-2024`).
pub const SEARCH_FORMAT: &str = "%-d-%b-%Y";

type Strategy = fn(&str) -> Option<DateTime<FixedOffset>>;

const STRATEGIES: &[Strategy] = &[rfc2822, rfc3339, common_layouts, heuristic];

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Zone names and their offsets in minutes east of UTC.
const ZONES: &[(&str, i32)] = &[
    ("UT", 0),
    ("UTC", 0),
    ("GMT", 0),
    ("Z", 0),
    ("EST", -5 * 60),
    ("EDT", -4 * 60),
    ("CST", -6 * 60),
    ("CDT", -5 * 60),
    ("MST", -7 * 60),
    ("MDT", -6 * 60),
    ("PST", -8 * 60),
    ("PDT", -7 * 60),
    ("BST", 60),
    ("CET", 60),
    ("MET", 60),
    ("CEST", 2 * 60),
    ("MEST", 2 * 60),
    ("EET", 2 * 60),
    ("EEST", 3 * 60),
    ("MSK", 3 * 60),
    ("IST", 5 * 60 + 30),
    ("JST", 9 * 60),
    ("A", 60),
    ("B", 2 * 60),
    ("C", 3 * 60),
    ("D", 4 * 60),
    ("E", 5 * 60),
    ("F", 6 * 60),
    ("G", 7 * 60),
    ("H", 8 * 60),
    ("I", 9 * 60),
    ("K", 10 * 60),
    ("L", 11 * 60),
    ("M", 12 * 60),
    ("N", -60),
    ("O", -2 * 60),
    ("P", -3 * 60),
    ("Q", -4 * 60),
    ("R", -5 * 60),
    ("S", -6 * 60),
    ("T", -7 * 60),
    ("U", -8 * 60),
    ("V", -9 * 60),
    ("W", -10 * 60),
    ("X", -11 * 60),
    ("Y", -12 * 60),
];

/// Parses a date header value and converts it to local time.
///
/// # Errors
///
/// Returns [`Error::DateFormat`] if no strategy understands the text.
pub fn parse_date(text: &str) -> Result<DateTime<Local>> {
    let cleaned = strip_comments(text);
    STRATEGIES
        .iter()
        .find_map(|strategy| strategy(&cleaned))
        .map(|date| date.with_timezone(&Local))
        .ok_or_else(|| Error::DateFormat(text.to_string()))
}

/// Renders a date for a `Date` header.
#[must_use]
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format(HEADER_FORMAT).to_string()
}

/// Renders a date for an IMAP SEARCH criterion.
#[must_use]
pub fn format_search_date(date: NaiveDate) -> String {
    date.format(SEARCH_FORMAT).to_string()
}

fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

fn rfc2822(text: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc2822(text).ok()
}

fn rfc3339(text: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(text).ok()
}

fn common_layouts(text: &str) -> Option<DateTime<FixedOffset>> {
    const ZONED: &[&str] = &[
        "%a, %d %b %Y %H:%M %z",
        "%d %b %Y %H:%M:%S %z",
        "%a %b %e %H:%M:%S %Y %z",
        "%Y-%m-%d %H:%M:%S %z",
    ];
    const NAIVE: &[&str] = &["%a %b %e %H:%M:%S %Y", "%Y-%m-%d %H:%M:%S"];

    ZONED
        .iter()
        .find_map(|layout| DateTime::parse_from_str(text, layout).ok())
        .or_else(|| {
            NAIVE
                .iter()
                .find_map(|layout| NaiveDateTime::parse_from_str(text, layout).ok())
                .map(|naive| naive.and_utc().fixed_offset())
        })
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Word(String),
    Number(u32),
    Offset(i32),
}

fn tokenize(text: &str) -> Vec<Token> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if (c == '+' || c == '-')
            && let Some(minutes) = offset_at(&chars[i + 1..])
        {
            tokens.push(Token::Offset(if c == '-' { -minutes } else { minutes }));
            i += 5;
        } else if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let digits: String = chars[start..i].iter().collect();
            if let Ok(n) = digits.parse() {
                tokens.push(Token::Number(n));
            }
        } else if c.is_ascii_alphabetic() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_alphabetic() {
                i += 1;
            }
            tokens.push(Token::Word(chars[start..i].iter().collect()));
        } else {
            i += 1;
        }
    }

    tokens
}

/// Reads `HHMM` after a sign; the run must be exactly four digits.
fn offset_at(rest: &[char]) -> Option<i32> {
    let digits = rest.get(..4)?;
    if !digits.iter().all(char::is_ascii_digit) || rest.get(4).is_some_and(char::is_ascii_digit)
    {
        return None;
    }
    let value = |range: std::ops::Range<usize>| -> Option<i32> {
        digits[range].iter().collect::<String>().parse().ok()
    };
    let (hours, minutes) = (value(0..2)?, value(2..4)?);
    (hours <= 14 && minutes < 60).then_some(hours * 60 + minutes)
}

fn month_of(word: &str) -> Option<u32> {
    let upper = word.to_ascii_uppercase();
    let prefix = upper.get(..3)?;
    MONTHS
        .iter()
        .position(|m| *m == prefix)
        .and_then(|i| u32::try_from(i + 1).ok())
}

fn zone_of(word: &str) -> Option<i32> {
    let upper = word.to_ascii_uppercase();
    ZONES
        .iter()
        .find(|(name, _)| *name == upper)
        .map(|&(_, minutes)| minutes)
}

fn heuristic(text: &str) -> Option<DateTime<FixedOffset>> {
    let mut month = None;
    let mut offset = None;
    let mut numbers = Vec::new();

    for token in tokenize(text) {
        match token {
            Token::Offset(minutes) => {
                offset.get_or_insert(minutes);
            }
            Token::Number(n) => numbers.push(n),
            Token::Word(word) => {
                if month.is_none()
                    && let Some(m) = month_of(&word)
                {
                    month = Some(m);
                } else if offset.is_none()
                    && let Some(minutes) = zone_of(&word)
                {
                    offset = Some(minutes);
                }
            }
        }
    }

    let month = month?;
    let year_index = numbers
        .iter()
        .position(|&n| n > 1900)
        .or_else(|| (numbers.len() > 1).then_some(1))?;
    let year = expand_year(numbers.remove(year_index));

    let mut fields = numbers.into_iter();
    let day = fields.next()?;
    let hour = fields.next().unwrap_or(0);
    let minute = fields.next().unwrap_or(0);
    let second = fields.next().unwrap_or(0);

    let naive = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)?
        .and_hms_opt(hour, minute, second)?;
    let zone = FixedOffset::east_opt(offset.unwrap_or(0) * 60)?;
    zone.from_local_datetime(&naive).single()
}

const fn expand_year(year: u32) -> u32 {
    match year {
        0..=49 => 2000 + year,
        50..=99 => 1900 + year,
        _ => year,
    }
}
