//! Text parsers for localized price and quantity strings
//!
//! Oda renders prices in Norwegian number format ("1 249,50 kr" with
//! non-breaking or thin spaces as thousands separators and a decimal
//! comma). These functions are total: anything unparseable maps to a zero
//! value with a debug log, so one malformed card never aborts a scrape.

use tracing::debug;

/// Parse a localized price string into a numeric value
///
/// Strips the `kr` currency marker, NBSP (U+00A0), thin space (U+2009)
/// and regular spaces, then maps the decimal comma to a dot.
///
/// Returns `0.0` on any parse failure.
#[must_use]
pub fn parse_price(text: &str) -> f64 {
    let cleaned = text
        .replace("kr", "")
        .replace('\u{00a0}', "")
        .replace('\u{2009}', "")
        .replace(' ', "")
        .replace(',', ".");

    match cleaned.trim().parse::<f64>() {
        Ok(value) => value,
        Err(_) => {
            debug!("Unparseable price text: {text:?}");
            0.0
        }
    }
}

/// Parse a relative price string like `"24,72 kr /l"` into the numeric
/// price and the unit label (kept with its leading slash)
///
/// Input without a `/` separator still parses the price side and leaves
/// the unit empty.
#[must_use]
pub fn parse_relative_price(text: &str) -> (f64, String) {
    if text.trim().is_empty() {
        return (0.0, String::new());
    }
    match text.split_once('/') {
        Some((price_part, unit_part)) => {
            (parse_price(price_part), format!("/{}", unit_part.trim()))
        }
        None => (parse_price(text), String::new()),
    }
}

/// Parse a cart line quantity (the value of the quantity input)
///
/// Returns `0` on any parse failure.
#[must_use]
pub fn parse_quantity(text: &str) -> u32 {
    match text.trim().parse::<u32>() {
        Ok(value) => value,
        Err(_) => {
            debug!("Unparseable quantity text: {text:?}");
            0
        }
    }
}

/// Split a recipe filter label like `"Middag (12)"` into the name and the
/// trailing parenthesized count
///
/// A label without a count yields `(label, 0)`.
#[must_use]
pub fn parse_filter_label(text: &str) -> (String, u32) {
    let trimmed = text.trim();
    if let Some(open) = trimmed.rfind('(')
        && trimmed.ends_with(')')
        && let Ok(count) = trimmed[open + 1..trimmed.len() - 1].trim().parse::<u32>()
    {
        return (trimmed[..open].trim().to_string(), count);
    }
    (trimmed.to_string(), 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_price() {
        assert_eq!(parse_price("61,80 kr"), 61.80);
        assert_eq!(parse_price("7,00\u{00a0}kr"), 7.0);
        assert_eq!(parse_price("25 kr"), 25.0);
    }

    #[test]
    fn parses_price_with_thousands_separators() {
        assert_eq!(parse_price("1\u{00a0}249,50 kr"), 1249.50);
        assert_eq!(parse_price("1\u{2009}249,50 kr"), 1249.50);
        assert_eq!(parse_price("1 249,50 kr"), 1249.50);
    }

    #[test]
    fn malformed_price_is_zero() {
        assert_eq!(parse_price(""), 0.0);
        assert_eq!(parse_price("gratis"), 0.0);
        assert_eq!(parse_price("kr"), 0.0);
    }

    #[test]
    fn parses_relative_price_with_unit() {
        assert_eq!(parse_relative_price("24,72 kr /l"), (24.72, "/l".to_string()));
        assert_eq!(
            parse_relative_price("129,90 kr / kg"),
            (129.90, "/kg".to_string())
        );
    }

    #[test]
    fn relative_price_without_separator_keeps_the_price() {
        assert_eq!(parse_relative_price(""), (0.0, String::new()));
        assert_eq!(parse_relative_price("24,72 kr"), (24.72, String::new()));
        assert_eq!(parse_relative_price("gratis"), (0.0, String::new()));
    }

    #[test]
    fn parses_quantity() {
        assert_eq!(parse_quantity("3"), 3);
        assert_eq!(parse_quantity(" 12 "), 12);
        assert_eq!(parse_quantity(""), 0);
        assert_eq!(parse_quantity("mange"), 0);
    }

    #[test]
    fn splits_filter_label_with_count() {
        assert_eq!(parse_filter_label("Middag (12)"), ("Middag".to_string(), 12));
        assert_eq!(parse_filter_label("Vegetar (4)"), ("Vegetar".to_string(), 4));
    }

    #[test]
    fn filter_label_without_count_keeps_label() {
        assert_eq!(parse_filter_label("Middag"), ("Middag".to_string(), 0));
        assert_eq!(
            parse_filter_label("Rask (under 20 min)"),
            ("Rask (under 20 min)".to_string(), 0)
        );
    }
}
