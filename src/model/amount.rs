//! Fixed-point nutrient quantities.
//!
//! Quantities are stored as integer thousandths of their unit (kcal, g, mg).
//! Integer addition is associative and commutative, so totals do not depend on
//! ingredient order and an add followed by a remove restores them exactly.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

const SCALE: i64 = 1000;

/// Largest representable quantity, in whole units. Larger input is clamped.
pub const MAX_UNITS: i64 = 1_000_000_000;

const MAX_MILLIS: i64 = MAX_UNITS * SCALE;

/// A non-negative nutrient quantity with three decimal places of precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
    /// The zero quantity.
    pub const ZERO: Amount = Amount(0);

    /// The largest quantity, [`MAX_UNITS`] whole units.
    pub const MAX: Amount = Amount(MAX_MILLIS);

    /// Build from a whole number of units, clamped to [`Amount::MAX`].
    pub fn whole(units: u32) -> Self {
        Amount((i64::from(units) * SCALE).min(MAX_MILLIS))
    }

    /// Build from raw thousandths, clamped to `0..=Amount::MAX`.
    pub fn from_millis(millis: i64) -> Self {
        Amount(millis.clamp(0, MAX_MILLIS))
    }

    /// Convert a float, rounding to the nearest thousandth.
    ///
    /// Non-finite and negative values become zero; values above
    /// [`MAX_UNITS`] become [`Amount::MAX`].
    pub fn from_f64(value: f64) -> Self {
        if !value.is_finite() || value <= 0.0 {
            return Amount::ZERO;
        }
        let scaled = (value * SCALE as f64).round();
        if scaled >= MAX_MILLIS as f64 {
            return Amount::MAX;
        }
        Amount(scaled as i64)
    }

    /// Parse free-form user or service text.
    ///
    /// Leading whitespace is skipped and the longest numeric prefix is used,
    /// so `"12.5g"` is 12.5 and `"abc"` is zero.
    pub fn parse_lenient(raw: &str) -> Self {
        leading_float(raw).map(Amount::from_f64).unwrap_or_default()
    }

    /// Read a service-provided JSON value that may be a number or a numeric string.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map(Amount::from_f64).unwrap_or_default(),
            serde_json::Value::String(s) => Amount::parse_lenient(s),
            _ => Amount::ZERO,
        }
    }

    /// Raw thousandths.
    pub fn millis(self) -> i64 {
        self.0
    }

    /// Value as a float in whole units.
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / SCALE as f64
    }

    /// Whether this quantity is zero.
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

/// Longest prefix of `raw` (after leading whitespace) that parses as a float.
fn leading_float(raw: &str) -> Option<f64> {
    let trimmed = raw.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }
    if !seen_digit {
        return None;
    }

    // Optional exponent, only taken when it is complete.
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }

    trimmed[..end].parse::<f64>().ok()
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / SCALE;
        let frac = self.0 % SCALE;
        if frac == 0 {
            write!(f, "{whole}")
        } else {
            let digits = format!("{frac:03}");
            write!(f, "{whole}.{}", digits.trim_end_matches('0'))
        }
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Amount::from_json(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_lenient_reads_plain_numbers() {
        assert_eq!(Amount::parse_lenient("50"), Amount::whole(50));
        assert_eq!(Amount::parse_lenient("  12.5"), Amount::from_millis(12_500));
    }

    #[test]
    fn parse_lenient_uses_numeric_prefix() {
        assert_eq!(Amount::parse_lenient("12.5g"), Amount::from_millis(12_500));
        assert_eq!(Amount::parse_lenient("3e2kcal"), Amount::whole(300));
        assert_eq!(Amount::parse_lenient("7e"), Amount::whole(7));
    }

    #[test]
    fn parse_lenient_treats_garbage_as_zero() {
        assert_eq!(Amount::parse_lenient(""), Amount::ZERO);
        assert_eq!(Amount::parse_lenient("abc"), Amount::ZERO);
        assert_eq!(Amount::parse_lenient("."), Amount::ZERO);
        assert_eq!(Amount::parse_lenient("-"), Amount::ZERO);
    }

    #[test]
    fn negative_values_clamp_to_zero() {
        assert_eq!(Amount::parse_lenient("-3"), Amount::ZERO);
        assert_eq!(Amount::from_f64(-0.5), Amount::ZERO);
        assert_eq!(Amount::from_millis(-10), Amount::ZERO);
    }

    #[test]
    fn huge_values_clamp_to_max() {
        assert_eq!(Amount::parse_lenient("1e300"), Amount::MAX);
        assert_eq!(Amount::from_f64(2e9), Amount::MAX);
        assert_eq!(Amount::from_millis(i64::MAX), Amount::MAX);
        assert_eq!(Amount::MAX.to_string(), "1000000000");
        assert_eq!(Amount::from_f64(999_999_999.5), Amount::from_millis(999_999_999_500));
    }

    #[test]
    fn sums_of_clamped_values_stay_exact() {
        let total: Amount = std::iter::repeat(Amount::MAX).take(1000).sum();
        assert_eq!(total.millis(), 1000 * Amount::MAX.millis());
    }

    #[test]
    fn non_finite_values_are_zero() {
        assert_eq!(Amount::from_f64(f64::NAN), Amount::ZERO);
        assert_eq!(Amount::from_f64(f64::INFINITY), Amount::ZERO);
    }

    #[test]
    fn from_f64_rounds_to_thousandths() {
        assert_eq!(Amount::from_f64(0.1234), Amount::from_millis(123));
        assert_eq!(Amount::from_f64(0.1236), Amount::from_millis(124));
    }

    #[test]
    fn from_json_accepts_numbers_and_strings() {
        assert_eq!(Amount::from_json(&serde_json::json!(42)), Amount::whole(42));
        assert_eq!(Amount::from_json(&serde_json::json!("4.5")), Amount::from_millis(4_500));
        assert_eq!(Amount::from_json(&serde_json::json!(null)), Amount::ZERO);
        assert_eq!(Amount::from_json(&serde_json::json!([1])), Amount::ZERO);
    }

    #[test]
    fn display_trims_trailing_zeros() {
        assert_eq!(Amount::whole(300).to_string(), "300");
        assert_eq!(Amount::from_millis(12_500).to_string(), "12.5");
        assert_eq!(Amount::from_millis(1_005).to_string(), "1.005");
    }

    #[test]
    fn serializes_as_decimal_number() {
        let json = serde_json::to_string(&Amount::from_millis(7_250)).unwrap();
        assert_eq!(json, "7.25");
        let back: Amount = serde_json::from_str("\"7.25\"").unwrap();
        assert_eq!(back, Amount::from_millis(7_250));
    }

    #[test]
    fn sum_of_empty_iterator_is_zero() {
        let total: Amount = std::iter::empty().sum();
        assert_eq!(total, Amount::ZERO);
    }
}
