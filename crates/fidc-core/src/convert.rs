//! Brazilian-locale numeric and date conversion.
//!
//! Filing text uses `.` as the thousands separator and `,` as the decimal
//! separator. The conversion in [`brazilian_decimal`] must only ever be applied
//! to text that originated in a filing: a machine-formatted float that contains
//! a negative exponent (`3.15e-10`) is indistinguishable, under this rule, from
//! a locale-formatted number and would be corrupted by orders of magnitude.
//! Values that are already `f64` never pass through here; see
//! [`FieldValue`](crate::types::FieldValue).

use chrono::NaiveDate;

/// Converts filing text in Brazilian number format to a float.
///
/// Removes every `.`, replaces `,` with `.`, then parses. Empty text, a lone
/// `-` placeholder and unparseable text all yield `0.0`.
///
/// ```
/// use fidc_core::convert::brazilian_decimal;
///
/// assert_eq!(brazilian_decimal("1.234.567,89"), 1_234_567.89);
/// assert_eq!(brazilian_decimal(""), 0.0);
/// ```
#[must_use]
pub fn brazilian_decimal(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return 0.0;
    }
    let cleaned = trimmed.replace('.', "").replace(',', ".");
    cleaned.parse::<f64>().unwrap_or(0.0)
}

/// Parses a filing reference period into a date.
///
/// Accepts `MM/YYYY` (resolved to the first day of the month) and
/// `DD/MM/YYYY`. Anything else yields `None`.
#[must_use]
pub fn reference_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.len() == 7 {
        return NaiveDate::parse_from_str(&format!("01/{trimmed}"), "%d/%m/%Y").ok();
    }
    NaiveDate::parse_from_str(trimmed, "%d/%m/%Y").ok()
}

/// Normalizes a raw fund identifier to exactly 14 numeric digits.
///
/// Strips every non-digit character, truncates to the first 14 digits and
/// left-pads with zeros.
#[must_use]
pub fn normalize_cnpj(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).take(14).collect();
    format!("{digits:0>14}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brazilian_format_reconstructs_float() {
        assert_eq!(brazilian_decimal("1.234.567,89"), 1_234_567.89);
        assert_eq!(brazilian_decimal("123,45"), 123.45);
        assert_eq!(brazilian_decimal("1.000.000,00"), 1_000_000.0);
        assert_eq!(brazilian_decimal("0,01"), 0.01);
    }

    #[test]
    fn empty_dash_and_garbage_are_zero() {
        assert_eq!(brazilian_decimal(""), 0.0);
        assert_eq!(brazilian_decimal("   "), 0.0);
        assert_eq!(brazilian_decimal("-"), 0.0);
        assert_eq!(brazilian_decimal("n/a"), 0.0);
    }

    #[test]
    fn monthly_reference_period() {
        assert_eq!(
            reference_date("11/2025"),
            NaiveDate::from_ymd_opt(2025, 11, 1)
        );
        assert_eq!(
            reference_date("05/12/2024"),
            NaiveDate::from_ymd_opt(2024, 12, 5)
        );
        assert_eq!(reference_date("2025-11"), None);
        assert_eq!(reference_date(""), None);
    }

    #[test]
    fn cnpj_normalization() {
        assert_eq!(normalize_cnpj("51.199.121/0001-45"), "51199121000145");
        assert_eq!(normalize_cnpj("123456"), "00000000123456");
        assert_eq!(normalize_cnpj("51199121000145999"), "51199121000145");
    }
}
