//! Splitting of server answer lines into top-level tokens.
//!
//! A token ends at a space only when no quote or bracket is open, so
//! `(\Seen \Draft)`, `"a b"` and `BODY[HEADER]` each stay one unit.

use std::borrow::Cow;

use crate::{Error, Result};

const fn opener_of(closer: char) -> char {
    match closer {
        ')' => '(',
        '}' => '{',
        ']' => '[',
        _ => '<',
    }
}

/// Splits one answer line into its top-level, space-separated units.
///
/// Quotes (`"` and `'`) nest like brackets but everything inside them is
/// literal, and a backslash escapes the next character inside `"`. An
/// unterminated group at the end of the line is kept as the last token.
///
/// # Errors
///
/// Returns [`Error::ProtocolFormat`] when a closing bracket does not match
/// the innermost open one.
pub fn split_answer(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut stack: Vec<char> = Vec::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        if let Some(&quote) = stack.last()
            && (quote == '"' || quote == '\'')
        {
            current.push(c);
            if c == '\\' && quote == '"' {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            } else if c == quote {
                stack.pop();
            }
            continue;
        }

        match c {
            ' ' if stack.is_empty() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                continue;
            }
            '"' | '\'' | '(' | '{' | '[' | '<' => stack.push(c),
            ')' | '}' | ']' | '>' => {
                if stack.last() != Some(&opener_of(c)) {
                    return Err(Error::ProtocolFormat(format!(
                        "unbalanced {c:?} in answer line {line:?}"
                    )));
                }
                stack.pop();
            }
            _ => {}
        }
        current.push(c);
    }

    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Strips surrounding double quotes and resolves `\"` and `\\`.
///
/// Tokens that are not quoted come back unchanged.
#[must_use]
pub fn unquote(token: &str) -> Cow<'_, str> {
    let Some(inner) = token.strip_prefix('"').and_then(|t| t.strip_suffix('"')) else {
        return Cow::Borrowed(token);
    };
    if !inner.contains('\\') {
        return Cow::Borrowed(inner);
    }

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\'
            && let Some(escaped) = chars.next()
        {
            out.push(escaped);
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_list_line() {
        let tokens = split_answer(r#"* LIST (\HasNoChildren \Marked) "/" "Sent Items""#).unwrap();
        assert_eq!(
            tokens,
            vec![
                "*",
                "LIST",
                r"(\HasNoChildren \Marked)",
                r#""/""#,
                r#""Sent Items""#
            ]
        );
    }

    #[test]
    fn test_nested_groups() {
        let tokens = split_answer("* 1 FETCH (FLAGS (\\Seen) BODY[HEADER.FIELDS (FROM)] {12}").unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[3], "(FLAGS (\\Seen) BODY[HEADER.FIELDS (FROM)] {12}");
    }

    #[test]
    fn test_brackets_inside_quotes_are_literal() {
        let tokens = split_answer(r#"a "x ) y" b"#).unwrap();
        assert_eq!(tokens, vec!["a", r#""x ) y""#, "b"]);
    }

    #[test]
    fn test_escaped_quote() {
        let tokens = split_answer(r#""say \"hi\"" next"#).unwrap();
        assert_eq!(tokens, vec![r#""say \"hi\"""#, "next"]);
        assert_eq!(unquote(&tokens[0]), r#"say "hi""#);
    }

    #[test]
    fn test_mismatched_closer() {
        assert!(matches!(
            split_answer("(a b]"),
            Err(Error::ProtocolFormat(_))
        ));
        assert!(split_answer("a b)").is_err());
        assert!(split_answer("<a)>").is_err());
    }

    #[test]
    fn test_unclosed_group_is_kept() {
        let tokens = split_answer("a (b c").unwrap();
        assert_eq!(tokens, vec!["a", "(b c"]);
    }

    #[test]
    fn test_repeated_spaces() {
        assert_eq!(split_answer("  a   b ").unwrap(), vec!["a", "b"]);
        assert!(split_answer("").unwrap().is_empty());
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("INBOX"), "INBOX");
        assert_eq!(unquote(r#""INBOX""#), "INBOX");
        assert_eq!(unquote(r#""a\\b""#), r"a\b");
        assert_eq!(unquote("\""), "\"");
    }

    fn unit() -> impl Strategy<Value = String> {
        let atom = "[A-Za-z0-9.*]{1,8}";
        prop_oneof![
            atom.prop_map(String::from),
            "[a-z ()<>{}\\[\\]']{0,8}".prop_map(|s| format!("\"{s}\"")),
            proptest::collection::vec(atom, 0..4).prop_map(|v| format!("({})", v.join(" "))),
            proptest::collection::vec(atom, 1..3).prop_map(|v| format!("BODY[{}]", v.join(" "))),
            atom.prop_map(|s| format!("<{s}>")),
        ]
    }

    proptest! {
        #[test]
        fn balanced_lines_split_into_their_units(units in proptest::collection::vec(unit(), 1..8)) {
            let line = units.join(" ");
            prop_assert_eq!(split_answer(&line).unwrap(), units);
        }

        #[test]
        fn stray_closer_is_rejected(units in proptest::collection::vec(unit(), 1..8)) {
            let line = format!("{} )", units.join(" "));
            prop_assert!(split_answer(&line).is_err());
        }
    }
}
