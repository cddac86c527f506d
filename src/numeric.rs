//! Numeric coercion for editable cells and form fields.
//!
//! Single point of truth for what counts as a valid value: every path that
//! reads a numeric input field goes through [`coerce_number`] before the
//! value enters the dataset or a request payload.

/// Converts raw field text into a finite number, or `None` for anything
/// that is not one. Never an error: empty, unparsable and non-finite
/// input (`NaN`, `±Infinity`) all coerce to the explicit no-value marker.
pub fn coerce_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// [`coerce_number`] for inputs that may be absent altogether.
pub fn coerce_optional(raw: Option<&str>) -> Option<f64> {
    raw.and_then(coerce_number)
}

/// Seed text for an editable cell; a missing value renders blank.
pub fn format_cell(value: Option<f64>) -> String {
    match value {
        Some(v) => format_number(v),
        None => String::new(),
    }
}

/// Shortest round-trip rendering, so `10.0` seeds the cell as `10`.
pub fn format_number(value: f64) -> String {
    format!("{value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_whitespace_coerce_to_none() {
        assert_eq!(coerce_number(""), None);
        assert_eq!(coerce_number("   "), None);
        assert_eq!(coerce_optional(None), None);
    }

    #[test]
    fn text_coerces_to_none() {
        assert_eq!(coerce_number("abc"), None);
        assert_eq!(coerce_number("12,5"), None);
    }

    #[test]
    fn non_finite_input_coerces_to_none() {
        assert_eq!(coerce_number("Infinity"), None);
        assert_eq!(coerce_number("-inf"), None);
        assert_eq!(coerce_number("NaN"), None);
    }

    #[test]
    fn valid_numbers_parse() {
        assert_eq!(coerce_number("3.14"), Some(3.14));
        assert_eq!(coerce_number(" 42 "), Some(42.0));
        assert_eq!(coerce_number("-2.5e3"), Some(-2500.0));
    }

    #[test]
    fn cells_round_trip_through_formatting() {
        assert_eq!(format_cell(None), "");
        assert_eq!(format_cell(Some(10.0)), "10");
        assert_eq!(coerce_number(&format_cell(Some(0.123))), Some(0.123));
    }
}
