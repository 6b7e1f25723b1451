//! Modified UTF-7 for IMAP mailbox names (RFC 3501 section 5.1.3).

use ::base64::Engine;
use ::base64::alphabet;
use ::base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::error::{Error, Result};

const MUTF7: GeneralPurpose = GeneralPurpose::new(
    &alphabet::IMAP_MUTF7,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Characters written as themselves. `&` is in range but always escaped.
const fn is_direct(c: char) -> bool {
    matches!(c, '\u{20}'..='\u{7e}')
}

/// Encodes a mailbox name for transmission.
#[must_use]
pub fn encode_mailbox(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending: Vec<u16> = Vec::new();

    for c in name.chars() {
        if is_direct(c) {
            flush(&mut out, &mut pending);
            if c == '&' {
                out.push_str("&-");
            } else {
                out.push(c);
            }
        } else {
            let mut units = [0u16; 2];
            pending.extend_from_slice(c.encode_utf16(&mut units));
        }
    }
    flush(&mut out, &mut pending);

    out
}

fn flush(out: &mut String, pending: &mut Vec<u16>) {
    if pending.is_empty() {
        return;
    }
    let bytes: Vec<u8> = pending.iter().flat_map(|unit| unit.to_be_bytes()).collect();
    out.push('&');
    out.push_str(&MUTF7.encode(bytes));
    out.push('-');
    pending.clear();
}

/// Decodes a mailbox name received from the server.
///
/// A shift sequence missing its closing `-` at the end of the name is
/// decoded anyway.
///
/// # Errors
///
/// Returns [`Error::Encoding`] for a bare `&` or a shift sequence that does
/// not hold valid UTF-16.
pub fn decode_mailbox(name: &str) -> Result<String> {
    let mut out = String::with_capacity(name.len());
    let mut rest = name;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let (run, next) = after
            .find('-')
            .map_or((after, ""), |dash| (&after[..dash], &after[dash + 1..]));

        if run.is_empty() {
            if !after.starts_with('-') {
                return Err(Error::Encoding(format!("bare '&' in mailbox name {name:?}")));
            }
            out.push('&');
        } else {
            out.push_str(&decode_run(run)?);
        }
        rest = next;
    }
    out.push_str(rest);

    Ok(out)
}

fn decode_run(run: &str) -> Result<String> {
    let normalized = run.replace('/', ",");
    let bytes = MUTF7
        .decode(normalized)
        .map_err(|e| Error::Encoding(format!("bad modified UTF-7 run {run:?}: {e}")))?;
    if bytes.len() % 2 != 0 {
        return Err(Error::Encoding(format!("odd UTF-16 length in {run:?}")));
    }
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
    char::decode_utf16(units)
        .collect::<std::result::Result<String, _>>()
        .map_err(|e| Error::Encoding(format!("invalid UTF-16 in {run:?}: {e}")))
}
