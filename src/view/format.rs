//! Number formatting for display.
//!
//! Stored amounts keep three decimals; display rounds half away from zero:
//! calories to whole kcal, grams to one decimal, sodium to whole milligrams.

use crate::model::Amount;

/// Group digits in thousands.
///
/// Examples:
/// - `group_thousands(0)` → "0"
/// - `group_thousands(1234)` → "1,234"
/// - `group_thousands(1234567)` → "1,234,567"
pub fn group_thousands(value: u64) -> String {
    let s = value.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let len = s.len();

    for (i, c) in s.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result
}

/// Calories as a whole number: `412.5` → "413".
pub fn calories(amount: Amount) -> String {
    group_thousands(rounded(amount, 1000))
}

/// Grams with one decimal: `12.25` → "12.3".
pub fn grams(amount: Amount) -> String {
    let tenths = rounded(amount, 100);
    format!("{}.{}", group_thousands(tenths / 10), tenths % 10)
}

/// Milligrams as a whole number.
pub fn milligrams(amount: Amount) -> String {
    group_thousands(rounded(amount, 1000))
}

/// `amount` in units of `step` thousandths, rounded half up.
fn rounded(amount: Amount, step: i64) -> u64 {
    let millis = amount.millis().max(0);
    u64::try_from(millis.saturating_add(step / 2) / step).unwrap_or(0)
}
