//! Parser for HTTP status code ignore lists.
//!
//! An ignore list is a comma-separated sequence of tokens, each either a
//! single status code (`"409"`) or an inclusive two-dot range (`"400..499"`).
//! The parsed [`StatusCodeSet`] is computed once at configuration time and
//! consulted for every non-2xx response.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Smallest status code accepted in an ignore list.
pub const MIN_STATUS_CODE: u16 = 100;
/// Largest status code accepted in an ignore list.
pub const MAX_STATUS_CODE: u16 = 599;

const RANGE_SEPARATOR: &str = "..";

/// Errors raised while compiling an ignore list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusCodeSpecError {
    /// A token is neither an integer nor an `A..B` range.
    #[error("invalid status code token {token:?}")]
    InvalidToken { token: String },
    /// A code lies outside the three-digit status code domain.
    #[error("status code {code} in {token:?} is outside 100..599")]
    OutOfRange { token: String, code: u32 },
    /// A range whose start is greater than its end.
    #[error("status code range {token:?} is descending")]
    DescendingRange { token: String },
}

/// Immutable set of HTTP status codes compiled from an ignore list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusCodeSet {
    codes: BTreeSet<u16>,
}

impl StatusCodeSet {
    /// Return an empty set that tolerates no status code.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile an ignore list such as `"400..409,300"`.
    ///
    /// The empty string yields the empty set. Whitespace is not trimmed, so
    /// `"400, 409"` is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`StatusCodeSpecError`] for malformed tokens, decimal or
    /// negative numbers, codes outside `100..=599`, and descending ranges.
    pub fn parse(spec: &str) -> Result<Self, StatusCodeSpecError> {
        let mut codes = BTreeSet::new();
        if spec.is_empty() {
            return Ok(Self { codes });
        }
        for token in spec.split(',') {
            let (start, end) = parse_token(token)?;
            codes.extend(start..=end);
        }
        Ok(Self { codes })
    }

    /// Return `true` when `status` is tolerated.
    pub fn contains(&self, status: u16) -> bool {
        self.codes.contains(&status)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Iterate the codes in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.codes.iter().copied()
    }
}

impl FromStr for StatusCodeSet {
    type Err = StatusCodeSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for StatusCodeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for code in &self.codes {
            if !first {
                f.write_str(",")?;
            }
            first = false;
            write!(f, "{code}")?;
        }
        Ok(())
    }
}

fn parse_token(token: &str) -> Result<(u16, u16), StatusCodeSpecError> {
    match token.split_once(RANGE_SEPARATOR) {
        None => {
            let code = parse_code(token, token)?;
            Ok((code, code))
        }
        Some((start, end)) => {
            let start = parse_code(start, token)?;
            let end = parse_code(end, token)?;
            if start > end {
                return Err(StatusCodeSpecError::DescendingRange {
                    token: token.to_owned(),
                });
            }
            Ok((start, end))
        }
    }
}

/// Parse one endpoint. Only ASCII digits without a leading zero are accepted,
/// which rules out signs, decimal points, padded codes such as `"0409"` and a
/// third dot left over from `"A...B"`.
fn parse_code(raw: &str, token: &str) -> Result<u16, StatusCodeSpecError> {
    if raw.is_empty() || raw.starts_with('0') || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(StatusCodeSpecError::InvalidToken {
            token: token.to_owned(),
        });
    }
    let value: u32 = raw.parse().map_err(|_| StatusCodeSpecError::OutOfRange {
        token: token.to_owned(),
        code: u32::MAX,
    })?;
    if !(u32::from(MIN_STATUS_CODE)..=u32::from(MAX_STATUS_CODE)).contains(&value) {
        return Err(StatusCodeSpecError::OutOfRange {
            token: token.to_owned(),
            code: value,
        });
    }
    // Bounded by MAX_STATUS_CODE above.
    Ok(value as u16)
}
