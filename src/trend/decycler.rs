//! Decycler trend filter
//!
//! Recursive low-pass/high-pass decomposition that strips cycle noise
//! from a price series, leaving the low-frequency trend. The recurrence
//! only ever looks at the previous raw price and the two previous
//! filtered values, so batch and incremental evaluation produce
//! identical output.

use rust_decimal::Decimal;

/// Smoothing coefficient used when the configured one is out of range
fn fallback_alpha() -> Decimal {
    Decimal::new(7, 2) // 0.07
}

/// Clamp alpha into (0, 1]; malformed input degrades to the default
fn sanitize_alpha(alpha: Decimal) -> Decimal {
    if alpha <= Decimal::ZERO || alpha > Decimal::ONE {
        fallback_alpha()
    } else {
        alpha
    }
}

/// Apply the decycler to a full price series
///
/// Returns one filtered value per input price, seeded with the first two
/// raw prices. Fewer than three inputs yield an empty result.
pub fn decycle(prices: &[Decimal], alpha: Decimal) -> Vec<Decimal> {
    if prices.len() < 3 {
        return vec![];
    }

    let mut filter = Decycler::new(alpha);
    prices.iter().map(|p| filter.update(*p)).collect()
}

/// Incremental decycler holding only the three-value lookback
pub struct Decycler {
    alpha: Decimal,
    prev_price: Option<Decimal>,
    prev: Option<Decimal>,
    prev2: Option<Decimal>,
}

impl Decycler {
    /// Create a filter with the given smoothing coefficient
    pub fn new(alpha: Decimal) -> Self {
        Self {
            alpha: sanitize_alpha(alpha),
            prev_price: None,
            prev: None,
            prev2: None,
        }
    }

    /// Fold in the next price and return the filtered value
    pub fn update(&mut self, price: Decimal) -> Decimal {
        let half = Decimal::new(5, 1);
        let quarter = Decimal::new(25, 2);

        let value = match (self.prev_price, self.prev, self.prev2) {
            (Some(prev_price), Some(prev), Some(prev2)) => {
                let one_minus = Decimal::ONE - self.alpha;
                self.alpha * half * (price + prev_price) + one_minus * prev
                    - one_minus * quarter * (prev - prev2)
            }
            // First two outputs are the raw seeds
            _ => price,
        };

        self.prev_price = Some(price);
        self.prev2 = self.prev;
        self.prev = Some(value);
        value
    }
}
