//! Coin amounts in integer base units.
//!
//! User input is decimal coins ("12.5"); everything downstream works in base
//! units where one coin is `10^8` units.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

pub const DECIMALS: usize = 8;
pub const UNITS_PER_COIN: u64 = 100_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Amount(pub u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn from_units(units: u64) -> Self {
        Self(units)
    }

    pub fn units(self) -> u64 {
        self.0
    }

    /// Parses a decimal coin string into base units. At most eight fractional
    /// digits are accepted; anything finer cannot be represented.
    pub fn parse_decimal(input: &str) -> Result<Self, ValidationError> {
        let text = input.trim();
        if text.is_empty() {
            return Err(ValidationError::InvalidAmount("empty amount".to_owned()));
        }
        let (whole, frac) = match text.split_once('.') {
            Some((w, f)) => (w, f),
            None => (text, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(ValidationError::InvalidAmount(format!("not a number: {text}")));
        }
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(whole) || !all_digits(frac) {
            return Err(ValidationError::InvalidAmount(format!("not a number: {text}")));
        }
        if frac.len() > DECIMALS {
            return Err(ValidationError::InvalidAmount(format!(
                "more than {DECIMALS} decimal places: {text}"
            )));
        }

        let overflow = || ValidationError::InvalidAmount(format!("amount too large: {text}"));
        let whole_units = if whole.is_empty() {
            0
        } else {
            whole
                .parse::<u64>()
                .map_err(|_| overflow())?
                .checked_mul(UNITS_PER_COIN)
                .ok_or_else(overflow)?
        };
        let frac_units = if frac.is_empty() {
            0
        } else {
            let padded = format!("{frac:0<width$}", width = DECIMALS);
            padded.parse::<u64>().map_err(|_| overflow())?
        };
        whole_units
            .checked_add(frac_units)
            .map(Amount)
            .ok_or_else(overflow)
    }

    /// Renders the amount in coins with all eight decimals ("0.00001000").
    pub fn format_coins(self) -> String {
        format!(
            "{}.{:0width$}",
            self.0 / UNITS_PER_COIN,
            self.0 % UNITS_PER_COIN,
            width = DECIMALS
        )
    }

    pub fn display_with(self, ticker: &str) -> String {
        format!("{} {ticker}", self.format_coins())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_coins())
    }
}

/// Cleans up free-typed price input the way the price field does on every
/// keystroke: the second `.` is dropped, surrounding whitespace is trimmed and
/// the first `,` becomes a decimal point.
pub fn normalize_price_input(text: &str) -> String {
    let mut dots = 0;
    let deduped: String = text
        .chars()
        .filter(|c| {
            if *c == '.' {
                dots += 1;
                return dots != 2;
            }
            true
        })
        .collect();
    deduped.trim().replacen(',', ".", 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_and_fractional_coins() {
        assert_eq!(Amount::parse_decimal("1").unwrap(), Amount(100_000_000));
        assert_eq!(Amount::parse_decimal("12.5").unwrap(), Amount(1_250_000_000));
        assert_eq!(Amount::parse_decimal(".00000001").unwrap(), Amount(1));
        assert_eq!(Amount::parse_decimal("3.").unwrap(), Amount(300_000_000));
    }

    #[test]
    fn rejects_garbage_and_excess_precision() {
        assert!(Amount::parse_decimal("").is_err());
        assert!(Amount::parse_decimal(".").is_err());
        assert!(Amount::parse_decimal("1.2.3").is_err());
        assert!(Amount::parse_decimal("-1").is_err());
        assert!(Amount::parse_decimal("0.000000001").is_err());
        assert!(Amount::parse_decimal("999999999999999999").is_err());
    }

    #[test]
    fn formats_fee_with_eight_decimals() {
        assert_eq!(Amount(1000).format_coins(), "0.00001000");
        assert_eq!(Amount(250_000_000).display_with("xNAV"), "2.50000000 xNAV");
    }

    #[test]
    fn normalizes_price_keystrokes() {
        assert_eq!(normalize_price_input(" 1,5 "), "1.5");
        assert_eq!(normalize_price_input("1.5."), "1.5");
        assert_eq!(normalize_price_input("1..5"), "1.5");
        assert_eq!(normalize_price_input("10"), "10");
    }
}
