//! Command serialization helpers.

use mailsmith_mime::encoding::encode_mailbox;

use crate::types::Flag;
use crate::{Error, Result};

/// Writes an astring: a bare atom when possible, a quoted string otherwise.
pub fn write_astring(buf: &mut String, s: &str) {
    if s.is_empty() || s.bytes().any(needs_quoting) {
        write_quoted(buf, s);
    } else {
        buf.push_str(s);
    }
}

/// Writes `s` as a quoted string, escaping `"` and `\`.
pub fn write_quoted(buf: &mut String, s: &str) {
    buf.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            buf.push('\\');
        }
        buf.push(c);
    }
    buf.push('"');
}

/// Writes a mailbox name in its modified UTF-7 wire form, quoted.
pub fn write_mailbox(buf: &mut String, name: &str) {
    write_quoted(buf, &encode_mailbox(name));
}

/// Writes a parenthesized flag list: `(\Seen \Flagged)`.
pub fn write_flag_list(buf: &mut String, flags: &[Flag]) {
    buf.push('(');
    for (i, flag) in flags.iter().enumerate() {
        if i > 0 {
            buf.push(' ');
        }
        buf.push_str(flag.as_str());
    }
    buf.push(')');
}

/// Rejects values that would break the command line.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `s` contains CR, LF or NUL.
pub fn check_sendable(what: &str, s: &str) -> Result<()> {
    if s.contains(['\r', '\n', '\0']) {
        return Err(Error::InvalidArgument(format!(
            "{what} contains a line break or NUL"
        )));
    }
    Ok(())
}

/// Returns true if the byte cannot appear in an atom.
const fn needs_quoting(b: u8) -> bool {
    matches!(
        b,
        b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*' | b']'
    ) || b < 0x20
        || b >= 0x7F
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn astring(s: &str) -> String {
        let mut buf = String::new();
        write_astring(&mut buf, s);
        buf
    }

    #[test]
    fn test_astring() {
        assert_eq!(astring("user"), "user");
        assert_eq!(astring(""), "\"\"");
        assert_eq!(astring("two words"), "\"two words\"");
        assert_eq!(astring(r#"q"uote"#), r#""q\"uote""#);
        assert_eq!(astring(r"back\slash"), r#""back\\slash""#);
        assert_eq!(astring("caf\u{e9}"), "\"caf\u{e9}\"");
    }

    #[test]
    fn test_mailbox_is_encoded_and_quoted() {
        let mut buf = String::new();
        write_mailbox(&mut buf, "Entw\u{fc}rfe");
        assert_eq!(buf, "\"Entw&APw-rfe\"");

        buf.clear();
        write_mailbox(&mut buf, "R&D");
        assert_eq!(buf, "\"R&-D\"");
    }

    #[test]
    fn test_flag_list() {
        let mut buf = String::new();
        write_flag_list(&mut buf, &[Flag::Seen, Flag::Keyword("$Work".into())]);
        assert_eq!(buf, r"(\Seen $Work)");

        buf.clear();
        write_flag_list(&mut buf, &[]);
        assert_eq!(buf, "()");
    }

    #[test]
    fn test_check_sendable() {
        assert!(check_sendable("user", "alice").is_ok());
        assert!(matches!(
            check_sendable("user", "alice\r\nA1 LOGOUT"),
            Err(Error::InvalidArgument(_))
        ));
    }
}
