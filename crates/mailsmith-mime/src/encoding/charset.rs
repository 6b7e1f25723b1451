//! Charset resolution.
//!
//! Names coming out of real mail are messy: quoted labels, Windows code page
//! numbers, vendor aliases. Resolution walks an ordered list of lookups and
//! falls back to [`DEFAULT`] when none of them recognise the name.

use encoding_rs::Encoding;

/// Charset used when a name cannot be resolved and for raw header bytes.
pub static DEFAULT: &Encoding = &encoding_rs::WINDOWS_1252_INIT;

type Lookup = fn(&str) -> Option<&'static Encoding>;

/// Lookups tried in order until one recognises the name.
const LOOKUPS: &[Lookup] = &[by_label, by_code_page];

/// Looks up a charset by name without falling back to the default.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static Encoding> {
    let name = name.trim().trim_matches(|c| c == '"' || c == '\'');
    if name.is_empty() {
        return None;
    }
    LOOKUPS.iter().find_map(|lookup| lookup(name))
}

/// Resolves a charset by name, falling back to [`DEFAULT`].
#[must_use]
pub fn resolve(name: &str) -> &'static Encoding {
    lookup(name).unwrap_or_else(|| {
        tracing::warn!(charset = name, "unknown charset, using default");
        DEFAULT
    })
}

/// Decodes bytes in the given charset, replacing malformed sequences.
#[must_use]
pub fn decode(encoding: &'static Encoding, bytes: &[u8]) -> String {
    let (text, _) = encoding.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Encodes text in the given charset.
///
/// Charsets that cannot be used for output (UTF-16, ISO-2022-JP replacement)
/// encode as their output encoding instead; unmappable characters become
/// numeric character references.
#[must_use]
pub fn encode(encoding: &'static Encoding, text: &str) -> Vec<u8> {
    let (bytes, _, _) = encoding.encode(text);
    bytes.into_owned()
}

/// Lowercase name used when labelling text encoded with `encoding`.
#[must_use]
pub fn label(encoding: &'static Encoding) -> String {
    encoding.output_encoding().name().to_ascii_lowercase()
}

fn by_label(name: &str) -> Option<&'static Encoding> {
    // RFC 2231 language suffix: "utf-8*en"
    let name = name.split('*').next().unwrap_or(name);
    Encoding::for_label_no_replacement(name.as_bytes())
}

fn by_code_page(name: &str) -> Option<&'static Encoding> {
    let digits: String = name.chars().filter(char::is_ascii_digit).collect();
    code_page(digits.parse().ok()?)
}

fn code_page(number: u16) -> Option<&'static Encoding> {
    use encoding_rs::{
        BIG5, EUC_JP, EUC_KR, GB18030, GBK, IBM866, ISO_2022_JP, ISO_8859_2, ISO_8859_3,
        ISO_8859_4, ISO_8859_5, ISO_8859_6, ISO_8859_7, ISO_8859_8, ISO_8859_13, ISO_8859_15,
        KOI8_R, KOI8_U, SHIFT_JIS, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_874, WINDOWS_1250,
        WINDOWS_1251, WINDOWS_1252, WINDOWS_1253, WINDOWS_1254, WINDOWS_1255, WINDOWS_1256,
        WINDOWS_1257, WINDOWS_1258,
    };

    Some(match number {
        65001 => UTF_8,
        1200 => UTF_16LE,
        1201 => UTF_16BE,
        874 => WINDOWS_874,
        1250 => WINDOWS_1250,
        28592 => ISO_8859_2,
        1251 => WINDOWS_1251,
        1252 | 28591 => WINDOWS_1252,
        1253 => WINDOWS_1253,
        1254 | 28599 => WINDOWS_1254,
        1255 => WINDOWS_1255,
        1256 => WINDOWS_1256,
        1257 => WINDOWS_1257,
        1258 => WINDOWS_1258,
        28593 => ISO_8859_3,
        28594 => ISO_8859_4,
        28595 => ISO_8859_5,
        28596 => ISO_8859_6,
        28597 => ISO_8859_7,
        28598 => ISO_8859_8,
        28603 => ISO_8859_13,
        28605 => ISO_8859_15,
        866 => IBM866,
        20866 => KOI8_R,
        21866 => KOI8_U,
        932 => SHIFT_JIS,
        936 => GBK,
        949 => EUC_KR,
        950 => BIG5,
        54936 => GB18030,
        50220 => ISO_2022_JP,
        51932 => EUC_JP,
        _ => return None,
    })
}
