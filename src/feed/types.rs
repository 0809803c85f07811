//! Tick feed types

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single price update for a symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tick {
    /// Trading symbol (e.g., "R_100")
    pub symbol: String,
    /// Quote price
    pub price: Decimal,
    /// Time the tick was produced
    pub timestamp: DateTime<Utc>,
}

impl Tick {
    /// Last digit of the quote at the given pip precision
    ///
    /// A quote of 1234.56 with two pip digits yields 6.
    pub fn last_digit(&self, pip_digits: u32) -> u8 {
        let scale = Decimal::from(10u64.pow(pip_digits));
        let units = (self.price * scale).round();
        let digit = units.to_i64().unwrap_or(0).rem_euclid(10);
        digit as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tick(price: Decimal) -> Tick {
        Tick {
            symbol: "R_100".to_string(),
            price,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_last_digit_two_pips() {
        assert_eq!(tick(dec!(1234.56)).last_digit(2), 6);
        assert_eq!(tick(dec!(1234.50)).last_digit(2), 0);
        assert_eq!(tick(dec!(0.01)).last_digit(2), 1);
    }

    #[test]
    fn test_last_digit_three_pips() {
        assert_eq!(tick(dec!(987.654)).last_digit(3), 4);
    }

    #[test]
    fn test_last_digit_integer_quote() {
        // 1234 with two pip digits reads as 1234.00
        assert_eq!(tick(dec!(1234)).last_digit(2), 0);
    }
}
