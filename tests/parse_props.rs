//! Property tests for the localized text parsers

use oda_mcp::parse::{parse_price, parse_quantity, parse_relative_price};
use proptest::prelude::*;

proptest! {
    #[test]
    fn any_norwegian_price_string_parses(whole in 0u32..100_000, cents in 0u32..100) {
        let text = format!("{whole},{cents:02}\u{a0}kr");
        let parsed = parse_price(&text);
        let expected = f64::from(whole) + f64::from(cents) / 100.0;
        prop_assert!((parsed - expected).abs() < 1e-9, "{text:?} parsed to {parsed}");
    }

    #[test]
    fn relative_price_splits_any_unit(
        whole in 0u32..10_000,
        cents in 0u32..100,
        unit in "(kg|l|stk)",
    ) {
        let text = format!("{whole},{cents:02} kr /{unit}");
        let (value, parsed_unit) = parse_relative_price(&text);
        let expected = f64::from(whole) + f64::from(cents) / 100.0;
        prop_assert!((value - expected).abs() < 1e-9);
        prop_assert_eq!(parsed_unit, format!("/{unit}"));
    }

    #[test]
    fn separatorless_relative_price_matches_the_price_parser(
        whole in 0u32..10_000,
        cents in 0u32..100,
    ) {
        let text = format!("{whole},{cents:02} kr");
        let (value, unit) = parse_relative_price(&text);
        let expected = f64::from(whole) + f64::from(cents) / 100.0;
        prop_assert!((value - expected).abs() < 1e-9);
        prop_assert_eq!(unit, "");
    }

    #[test]
    fn arbitrary_text_never_panics(text in ".*") {
        let _ = parse_price(&text);
        let _ = parse_relative_price(&text);
        let _ = parse_quantity(&text);
    }
}
