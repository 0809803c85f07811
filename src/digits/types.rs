//! Digit-frequency types

use crate::feed::Tick;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Last-digit distribution of a symbol's recent ticks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigitStats {
    pub symbol: String,
    /// Last digit of the most recent tick
    pub current_last_digit: u8,
    /// Occurrences of each digit 0..=9 in the window
    pub counts: [u32; 10],
    /// Number of ticks sampled
    pub sample_size: usize,
}

impl DigitStats {
    /// Build stats from a tick window; `None` when the window is empty
    pub fn from_ticks<'a>(
        symbol: impl Into<String>,
        ticks: impl IntoIterator<Item = &'a Tick>,
        pip_digits: u32,
    ) -> Option<Self> {
        let mut counts = [0u32; 10];
        let mut sample_size = 0usize;
        let mut current = None;

        for tick in ticks {
            let digit = tick.last_digit(pip_digits);
            counts[digit as usize] += 1;
            sample_size += 1;
            current = Some(digit);
        }

        Some(Self {
            symbol: symbol.into(),
            current_last_digit: current?,
            counts,
            sample_size,
        })
    }

    /// Least-frequent digit; ties break toward the lowest digit
    pub fn least_frequent(&self) -> u8 {
        self.extreme_by(|best, candidate| candidate < best)
    }

    /// Most-frequent digit; ties break toward the lowest digit
    pub fn most_frequent(&self) -> u8 {
        self.extreme_by(|best, candidate| candidate > best)
    }

    fn extreme_by(&self, better: impl Fn(u32, u32) -> bool) -> u8 {
        let mut digit = 0u8;
        for (i, &count) in self.counts.iter().enumerate().skip(1) {
            if better(self.counts[digit as usize], count) {
                digit = i as u8;
            }
        }
        digit
    }

    /// Count for a single digit
    pub fn count(&self, digit: u8) -> u32 {
        self.counts[digit as usize]
    }
}

/// Scored trade opportunity for one symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolOpportunity {
    pub symbol: String,
    /// Enough ticks sampled to trust the distribution
    pub ready: bool,
    /// All entry conditions hold
    pub meets_conditions: bool,
    pub least_digit: u8,
    pub most_digit: u8,
    pub score: Decimal,
}
