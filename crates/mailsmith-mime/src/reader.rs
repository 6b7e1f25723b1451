//! Line cursor over a raw message buffer.

use crate::encoding::charset;

/// One physical line, with offsets into the buffer it came from.
#[derive(Debug, Clone, Copy)]
pub struct Line<'a> {
    /// Line content without its terminator.
    pub bytes: &'a [u8],
    /// Offset of the first byte of the line.
    pub start: usize,
    /// Offset just past the terminator.
    pub next: usize,
}

impl Line<'_> {
    /// Returns true for a line with no content.
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decodes the line with the 8-bit fallback charset.
    pub fn text(&self) -> String {
        charset::decode(charset::DEFAULT, self.bytes)
    }
}

/// Reads lines ending in CR, LF or CRLF.
#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Moves the cursor back to an earlier line start.
    pub const fn rewind(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn read_line(&mut self) -> Option<Line<'a>> {
        let start = self.pos;
        if start >= self.data.len() {
            return None;
        }
        let rest = &self.data[start..];
        let (len, terminator) = match rest.iter().position(|&b| b == b'\r' || b == b'\n') {
            Some(i) if rest[i] == b'\r' && rest.get(i + 1) == Some(&b'\n') => (i, 2),
            Some(i) => (i, 1),
            None => (rest.len(), 0),
        };
        self.pos = start + len + terminator;
        Some(Line {
            bytes: &rest[..len],
            start,
            next: self.pos,
        })
    }
}
