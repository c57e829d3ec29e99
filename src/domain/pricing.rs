//! Supplier price parsing and marketplace price conversion.
//!
//! The supplier publishes prices as display strings ("5'990.00 руб.",
//! "10 500,50"). Both marketplaces take whole rubles.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;

/// Rounding applied when converting to whole rubles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceRounding {
    /// Drop kopecks (10 500.50 -> 10 500).
    #[default]
    Truncate,
    /// Round half away from zero (10 500.50 -> 10 501).
    HalfUp,
}

impl PriceRounding {
    fn strategy(self) -> RoundingStrategy {
        match self {
            Self::Truncate => RoundingStrategy::ToZero,
            Self::HalfUp => RoundingStrategy::MidpointAwayFromZero,
        }
    }
}

/// Converts supplier prices to marketplace prices.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceConverter {
    rounding: PriceRounding,
}

impl PriceConverter {
    /// Create a converter with the given rounding mode.
    pub fn new(rounding: PriceRounding) -> Self {
        Self { rounding }
    }

    /// Convert a supplier price to the marketplace minimal unit.
    ///
    /// Pure: the same input always yields the same output. Negative
    /// inputs clamp to zero.
    pub fn to_marketplace(&self, supplier_price: Decimal) -> Decimal {
        if supplier_price.is_sign_negative() {
            return Decimal::ZERO;
        }
        supplier_price
            .round_dp_with_strategy(0, self.rounding.strategy())
            .normalize()
    }
}

/// Parse a supplier display price.
///
/// Currency suffixes, spaces and apostrophes are dropped. When both
/// `.` and `,` occur, the last one is the decimal separator; a lone
/// separator is decimal only if it appears once and is followed by at
/// most two digits.
pub fn parse_supplier_price(raw: &str) -> Option<Decimal> {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let kept = kept.trim_matches(|c| c == '.' || c == ',');

    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let decimal_sep = match (kept.rfind('.'), kept.rfind(',')) {
        (Some(dot), Some(comma)) => Some(if dot > comma { '.' } else { ',' }),
        (Some(_), None) => lone_decimal_separator(kept, '.'),
        (None, Some(_)) => lone_decimal_separator(kept, ','),
        (None, None) => None,
    };

    let normalized: String = match decimal_sep {
        Some(sep) => {
            let idx = kept.rfind(sep)?;
            let (int_part, frac_part) = kept.split_at(idx);
            let int_digits: String = int_part.chars().filter(char::is_ascii_digit).collect();
            let frac_digits: String = frac_part.chars().filter(char::is_ascii_digit).collect();
            let int_digits = if int_digits.is_empty() { "0" } else { int_digits.as_str() };
            format!("{int_digits}.{frac_digits}")
        }
        None => kept.chars().filter(char::is_ascii_digit).collect(),
    };

    Decimal::from_str(&normalized).ok()
}

fn lone_decimal_separator(s: &str, sep: char) -> Option<char> {
    if s.matches(sep).count() != 1 {
        return None;
    }
    let after = s.rsplit(sep).next().unwrap_or_default();
    (after.len() <= 2).then_some(sep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_apostrophe_thousands() {
        assert_eq!(parse_supplier_price("5'990.00 руб."), Some(dec!(5990.00)));
        assert_eq!(parse_supplier_price("10'500.50 руб."), Some(dec!(10500.50)));
    }

    #[test]
    fn test_parse_comma_thousands_and_decimal() {
        assert_eq!(parse_supplier_price("5,990.00 руб."), Some(dec!(5990)));
        assert_eq!(parse_supplier_price("10 500,50"), Some(dec!(10500.50)));
        assert_eq!(parse_supplier_price("1,234,567"), Some(dec!(1234567)));
    }

    #[test]
    fn test_parse_plain_number() {
        assert_eq!(parse_supplier_price("9.99"), Some(dec!(9.99)));
        assert_eq!(parse_supplier_price("4990"), Some(dec!(4990)));
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_supplier_price("invalid_price"), None);
        assert_eq!(parse_supplier_price(""), None);
        assert_eq!(parse_supplier_price("руб."), None);
    }

    #[test]
    fn test_truncate_drops_kopecks() {
        let conv = PriceConverter::new(PriceRounding::Truncate);
        assert_eq!(conv.to_marketplace(dec!(10500.50)), dec!(10500));
        assert_eq!(conv.to_marketplace(dec!(9.99)), dec!(9));
    }

    #[test]
    fn test_half_up() {
        let conv = PriceConverter::new(PriceRounding::HalfUp);
        assert_eq!(conv.to_marketplace(dec!(10500.50)), dec!(10501));
        assert_eq!(conv.to_marketplace(dec!(10500.49)), dec!(10500));
        assert_eq!(conv.to_marketplace(dec!(9.99)), dec!(10));
    }

    #[test]
    fn test_negative_clamps_to_zero() {
        let conv = PriceConverter::default();
        assert_eq!(conv.to_marketplace(dec!(-5)), Decimal::ZERO);
    }
}
