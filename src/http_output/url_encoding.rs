//! Form encoding for `application/x-www-form-urlencoded` bodies.
//!
//! Values are encoded byte-wise so binary field contents survive the trip.
//! Spaces become `+`, matching what HTML form submission produces.

use percent_encoding::{AsciiSet, CONTROLS, percent_encode};

/// Bytes to percent-encode in form keys and values (excluding space).
///
/// Covers control characters, every non-ASCII byte, and the characters with
/// special meaning in a query string. Unreserved characters (alphanumeric,
/// `-`, `_`, `.`, `~`) pass through as-is.
pub(crate) const FORM_ENCODE_SET_NO_SPACE: &AsciiSet = &CONTROLS
    .add(b'"')
    .add(b'#')
    .add(b'$')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b',')
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}')
    .add(b'\'');

/// Form-encode raw bytes, mapping spaces to `+` in a single pass.
pub(crate) fn form_encode(bytes: &[u8]) -> String {
    let mut result = String::with_capacity(bytes.len());
    let mut first = true;
    for chunk in bytes.split(|b| *b == b' ') {
        if !first {
            result.push('+');
        }
        first = false;
        result.extend(percent_encode(chunk, FORM_ENCODE_SET_NO_SPACE));
    }
    result
}

/// Append one `key=value` pair to `body`, inserting `&` between pairs.
pub(crate) fn push_pair(body: &mut String, key: &str, value: &[u8]) {
    if !body.is_empty() {
        body.push('&');
    }
    body.push_str(&form_encode(key.as_bytes()));
    body.push('=');
    body.push_str(&form_encode(value));
}
