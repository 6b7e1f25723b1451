//! Recursive RFC822/MIME reader.

use bytes::Bytes;

use super::Message;
use crate::content_type::ContentType;
use crate::encoding::{WordEncoding, charset, rfc2047};
use crate::header::Headers;
use crate::reader::Reader;

/// Trailing bytes after the last delimiter are only kept as a part when
/// there are more of them than this.
const NOISE_THRESHOLD: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Open,
    Close,
}

/// Parses one node. `parent` is set for parts of a multipart body.
pub(super) fn parse_node(source: Bytes, parent: Option<&Headers>) -> Message {
    let mut reader = Reader::new(&source);
    if parent.is_none() {
        skip_blank_lines(&mut reader);
    }
    let (local, separator) = read_header_block(&mut reader);
    let start_of_body = reader.position();

    let mut headers = Headers::new();
    if let Some(parent) = parent {
        for (name, value) in parent {
            let overridden = local.iter().any(|(n, _)| n.eq_ignore_ascii_case(name));
            if !overridden && !is_content_field(name) {
                headers.add(name, value);
            }
        }
    }
    let inherited = headers.len();
    for (name, value) in local {
        let value = checked_value(value);
        headers.add(name, value);
    }

    let boundary = headers
        .get("content-type")
        .map(ContentType::parse)
        .and_then(|ct| ct.boundary().map(str::to_string));

    let mut message = Message {
        headers,
        inherited,
        separator,
        body: source.slice(start_of_body..),
        source,
        start_of_body,
        boundary: None,
        parts: Vec::new(),
        read_only: parent.is_some(),
    };
    if let Some(boundary) = boundary {
        split_multipart(&mut message, boundary);
    }
    message
}

fn skip_blank_lines(reader: &mut Reader<'_>) {
    while let Some(line) = reader.read_line() {
        if !line.is_empty() {
            reader.rewind(line.start);
            break;
        }
    }
}

/// Reads `name: value` lines, unfolding continuations.
///
/// Returns the raw fields and whether a blank line closed the block. A line
/// that is neither a field nor a continuation ends the block and is left
/// for the body.
fn read_header_block(reader: &mut Reader<'_>) -> (Vec<(String, String)>, bool) {
    let mut fields: Vec<(String, String)> = Vec::new();

    while let Some(line) = reader.read_line() {
        if line.is_empty() {
            return (fields, true);
        }
        let text = line.text();
        if text.starts_with([' ', '\t']) {
            if let Some((_, value)) = fields.last_mut() {
                if !value.is_empty() {
                    value.push(' ');
                }
                value.push_str(text.trim());
                continue;
            }
        } else if let Some((name, value)) = text.split_once(':') {
            let name = name.trim();
            if !name.is_empty() && !name.contains(char::is_whitespace) {
                fields.push((name.to_string(), value.trim().to_string()));
                continue;
            }
        }
        reader.rewind(line.start);
        break;
    }

    (fields, false)
}

/// Keeps the raw value when its encoded words decode; otherwise wraps the
/// whole value in one Base64 word so the original bytes survive.
fn checked_value(raw: String) -> String {
    match rfc2047::decode(&raw) {
        Ok(_) => raw,
        Err(e) => {
            tracing::warn!(error = %e, "malformed encoded word in header, keeping raw bytes");
            rfc2047::encode(WordEncoding::B, charset::DEFAULT, &raw)
        }
    }
}

fn is_content_field(name: &str) -> bool {
    name.get(..8)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("content-"))
}

fn delimiter_kind(line: &[u8], delimiter: &[u8]) -> Option<Delimiter> {
    let line = line.trim_ascii_end();
    let rest = line.strip_prefix(delimiter)?;
    match rest {
        b"" => Some(Delimiter::Open),
        b"--" => Some(Delimiter::Close),
        _ => None,
    }
}

/// End of a part: drops the one line break that belongs to the delimiter.
fn strip_terminator(data: &[u8], start: usize, mut end: usize) -> usize {
    if end > start && data[end - 1] == b'\n' {
        end -= 1;
    }
    if end > start && data[end - 1] == b'\r' {
        end -= 1;
    }
    end
}

fn split_multipart(message: &mut Message, boundary: String) {
    let source = message.source.clone();
    let delimiter = format!("--{boundary}");
    let mut reader = Reader::new(&source);
    reader.rewind(message.start_of_body);

    let mut preamble_end = None;
    let mut part_start = message.start_of_body;
    let mut closed = false;
    let mut parts = Vec::new();

    while let Some(line) = reader.read_line() {
        let Some(kind) = delimiter_kind(line.bytes, delimiter.as_bytes()) else {
            continue;
        };
        if preamble_end.is_none() {
            preamble_end = Some(line.start);
        } else {
            let end = strip_terminator(&source, part_start, line.start);
            parts.push(parse_node(
                source.slice(part_start..end),
                Some(&message.headers),
            ));
        }
        if kind == Delimiter::Close {
            closed = true;
            break;
        }
        part_start = line.next;
    }

    let Some(preamble_end) = preamble_end else {
        tracing::warn!(boundary = %boundary, "multipart body without any delimiter");
        return;
    };

    if !closed && source.len() - part_start > NOISE_THRESHOLD {
        tracing::warn!(boundary = %boundary, "missing closing delimiter, keeping trailing part");
        parts.push(parse_node(source.slice(part_start..), Some(&message.headers)));
    }

    if parts.is_empty() {
        return;
    }
    message.body = source.slice(message.start_of_body..preamble_end);
    message.boundary = Some(boundary);
    message.parts = parts;
}
