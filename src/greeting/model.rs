//! Wire types: the [`Greeting`] every route returns, the [`Person`] payload
//! some routes accept, and the [`DecimalId`] both are keyed by.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ApiError;

/// The response shape of every greeting route.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Greeting {
    pub sequence: u64,
    pub message: String,
}

impl Greeting {
    /// Wraps `inner` in the fixed `Hello, …!` template.
    pub fn new(sequence: u64, inner: &str) -> Self {
        Self { sequence, message: format!("Hello, {inner}!") }
    }
}

/// Input payload. Every field is optional; unknown fields are ignored.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Person {
    pub id: Option<DecimalId>,
    pub name: Option<String>,
    pub surname: Option<String>,
}

/// Renders an absent text field the way string concatenation of a null does.
pub(crate) fn or_null(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or("null")
}

// ── DecimalId ─────────────────────────────────────────────────────────────────

/// An arbitrary-precision decimal identifier.
///
/// Displays exactly as it was supplied. Compares and hashes by numeric value,
/// so `5`, `5.0`, `05` and `0.5e1` are all the same id.
#[derive(Clone, Debug)]
pub struct DecimalId {
    text: String,
    value: Normalized,
}

/// `(-1)^negative × digits × 10^exponent`, with no leading or trailing zeros
/// in `digits`. Zero is `digits == ""`, `exponent == 0`, never negative.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct Normalized {
    negative: bool,
    digits: String,
    exponent: i64,
}

impl FromStr for DecimalId {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ApiError::Validation(format!("`{s}` is not a decimal number"));

        let (negative, rest) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        let (mantissa, exp) = match rest.find(['e', 'E']) {
            Some(i) => (&rest[..i], Some(&rest[i + 1..])),
            None => (rest, None),
        };
        let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));

        let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
        if int_part.len() + frac_part.len() == 0 || !all_digits(int_part) || !all_digits(frac_part) {
            return Err(invalid());
        }

        let mut exponent = match exp {
            Some(e) => e.parse::<i64>().map_err(|_| invalid())?,
            None => 0,
        };
        exponent = exponent
            .checked_sub(i64::try_from(frac_part.len()).map_err(|_| invalid())?)
            .ok_or_else(invalid)?;

        let joined = format!("{int_part}{frac_part}");
        let significant = joined.trim_start_matches('0');
        let digits = significant.trim_end_matches('0');
        exponent = exponent
            .checked_add(i64::try_from(significant.len() - digits.len()).map_err(|_| invalid())?)
            .ok_or_else(invalid)?;

        let value = if digits.is_empty() {
            Normalized { negative: false, digits: String::new(), exponent: 0 }
        } else {
            Normalized { negative, digits: digits.to_owned(), exponent }
        };

        Ok(Self { text: s.to_owned(), value })
    }
}

impl PartialEq for DecimalId {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for DecimalId {}

impl Hash for DecimalId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl fmt::Display for DecimalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Accepts a JSON number (kept digit-for-digit) or a numeric string.
impl<'de> Deserialize<'de> for DecimalId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error as _;

        let text = match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::String(s) => s,
            other => return Err(D::Error::custom(format!("expected a decimal id, found {other}"))),
        };
        text.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> DecimalId {
        s.parse().unwrap()
    }

    #[test]
    fn equal_by_value_not_by_text() {
        assert_eq!(id("5"), id("5.0"));
        assert_eq!(id("5"), id("05"));
        assert_eq!(id("5"), id("0.5e1"));
        assert_eq!(id("-0"), id("0.000"));
        assert_ne!(id("5"), id("-5"));
        assert_ne!(id("5"), id("50"));
    }

    #[test]
    fn displays_as_supplied() {
        assert_eq!(id("5.00").to_string(), "5.00");
        assert_eq!(id("12345678901234567890123").to_string(), "12345678901234567890123");
    }

    #[test]
    fn rejects_non_numbers() {
        for bad in ["", "-", ".", "abc", "1.2.3", "1e", "1e+", "0x10", " 5"] {
            assert!(bad.parse::<DecimalId>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn person_reads_numbers_and_strings() {
        let p: Person = serde_json::from_str(r#"{"id":5,"name":"Bob","extra":true}"#).unwrap();
        assert_eq!(p.id, Some(id("5")));
        assert_eq!(p.name.as_deref(), Some("Bob"));
        assert!(p.surname.is_none());

        let p: Person = serde_json::from_str(r#"{"id":"7.0"}"#).unwrap();
        assert_eq!(p.id, Some(id("7")));

        let big: Person = serde_json::from_str(r#"{"id":98765432109876543210.5}"#).unwrap();
        assert_eq!(big.id.unwrap().to_string(), "98765432109876543210.5");
    }

    #[test]
    fn greeting_serializes_to_sequence_and_message() {
        let g = Greeting::new(3, "It's me OPTIONS!!!");
        assert_eq!(
            serde_json::to_string(&g).unwrap(),
            r#"{"sequence":3,"message":"Hello, It's me OPTIONS!!!!"}"#
        );
    }
}
