//! Subject (patient) identifiers typed in by the user.

use std::fmt;
use std::str::FromStr;

/// Reasons a subject identifier is rejected before any remote call.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SubjectIdError {
    #[error("subject id is empty")]
    Empty,
    #[error("subject id is not a number")]
    NotNumeric,
    #[error("subject id must be greater than zero")]
    NotPositive,
    #[error("subject id must be a whole number")]
    Fractional,
}

/// Largest number of integer digits a finite double can carry (`f64::MAX` is ~1.8e308).
const MAX_FINITE_DIGITS: usize = 309;

/// A positive integer subject identifier.
///
/// Stored as a canonical decimal string (no sign, no leading zeros). Only finiteness
/// bounds it here; values too large for the ledger's integer width are rejected by the
/// remote binding when it encodes the call.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SubjectId(String);

impl SubjectId {
    /// Coerce raw form input into a subject id.
    ///
    /// Accepts the numeric forms a form field would coerce: plain decimals with an
    /// optional leading `+`, a zero fractional part (`"42.0"`), exponent notation
    /// (`"1e3"`, `"4.2E1"`) and unsigned `0x` hex (`"0x2a"`). Zero and negative values
    /// are `NotPositive`; values with a non-zero fractional part are `Fractional`;
    /// anything else, including `NaN`, `Infinity` and numbers past the finite range,
    /// is `NotNumeric`.
    pub fn parse(input: &str) -> Result<Self, SubjectIdError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SubjectIdError::Empty);
        }

        if let Some(hex) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            return hex_to_decimal(hex).and_then(Self::positive);
        }

        let (negative, unsigned) = match trimmed.as_bytes()[0] {
            b'-' => (true, &trimmed[1..]),
            b'+' => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
            Some((mantissa, exponent)) => (mantissa, parse_exponent(exponent)?),
            None => (unsigned, 0),
        };
        let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));

        let digits_ok = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !digits_ok(whole) || !digits_ok(fraction)
        {
            return Err(SubjectIdError::NotNumeric);
        }

        let digits = format!("{whole}{fraction}");
        if negative || digits.bytes().all(|b| b == b'0') {
            return Err(SubjectIdError::NotPositive);
        }

        // Position of the decimal point within `digits` once the exponent is applied.
        let point = whole.len() as i64 + exponent;
        if point <= 0 {
            return Err(SubjectIdError::Fractional);
        }
        let leading_zeros = digits.bytes().take_while(|&b| b == b'0').count() as i64;
        if point - leading_zeros > MAX_FINITE_DIGITS as i64 {
            return Err(SubjectIdError::NotNumeric);
        }
        let point = point as usize;

        let (integer, fraction) = if point >= digits.len() {
            let mut integer = digits;
            integer.extend(std::iter::repeat_n('0', point - integer.len()));
            (integer, String::new())
        } else {
            let (integer, fraction) = digits.split_at(point);
            (integer.to_owned(), fraction.to_owned())
        };

        if fraction.bytes().any(|b| b != b'0') {
            return Err(SubjectIdError::Fractional);
        }
        Self::positive(integer.trim_start_matches('0').to_owned())
    }

    fn positive(canonical: String) -> Result<Self, SubjectIdError> {
        if canonical.is_empty() {
            Err(SubjectIdError::NotPositive)
        } else if canonical.len() > MAX_FINITE_DIGITS {
            Err(SubjectIdError::NotNumeric)
        } else {
            Ok(Self(canonical))
        }
    }

    /// Builds a subject id from a machine integer; `None` for zero.
    pub fn from_u64(value: u64) -> Option<Self> {
        (value > 0).then(|| Self(value.to_string()))
    }

    /// Canonical decimal digits.
    pub fn as_decimal(&self) -> &str {
        &self.0
    }
}

/// Signed exponent digits; magnitudes past the finite range saturate.
fn parse_exponent(input: &str) -> Result<i64, SubjectIdError> {
    let (sign, digits) = match input.as_bytes().first() {
        Some(b'-') => (-1, &input[1..]),
        Some(b'+') => (1, &input[1..]),
        _ => (1, input),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SubjectIdError::NotNumeric);
    }
    let magnitude = digits.bytes().fold(0i64, |acc, b| {
        acc.saturating_mul(10)
            .saturating_add(i64::from(b - b'0'))
            .min(1_000_000)
    });
    Ok(sign * magnitude)
}

/// Hex digits to canonical decimal, carried one nibble at a time through
/// little-endian base-10 digits.
fn hex_to_decimal(hex: &str) -> Result<String, SubjectIdError> {
    if hex.is_empty() {
        return Err(SubjectIdError::NotNumeric);
    }

    let mut decimal: Vec<u8> = vec![0];
    for c in hex.chars() {
        let mut carry = c.to_digit(16).ok_or(SubjectIdError::NotNumeric)?;
        for digit in decimal.iter_mut() {
            let value = u32::from(*digit) * 16 + carry;
            *digit = (value % 10) as u8;
            carry = value / 10;
        }
        while carry > 0 {
            decimal.push((carry % 10) as u8);
            carry /= 10;
        }
    }

    let canonical: String = decimal
        .iter()
        .rev()
        .skip_while(|&&d| d == 0)
        .map(|&d| char::from(b'0' + d))
        .collect();
    Ok(canonical)
}

impl FromStr for SubjectId {
    type Err = SubjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubjectId({})", self.0)
    }
}

impl serde::Serialize for SubjectId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}
