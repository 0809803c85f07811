//! Trend analysis types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction classification of a single timeframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    /// Short and medium deltas both up
    Bullish,
    /// Short and medium deltas both down
    Bearish,
    /// Disagreement or insufficient data
    Neutral,
}

/// One timeframe's classification for an aggregation cycle
///
/// Superseded by the next cycle's sample, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendSample {
    /// Candle granularity in seconds
    pub timeframe: u64,
    /// Direction classification
    pub trend: Trend,
    /// Last decycler output for the timeframe
    pub filter_value: Decimal,
    /// When the sample was produced
    pub timestamp: DateTime<Utc>,
}

/// Combined verdict across all configured timeframes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    AlignedBullish,
    AlignedBearish,
    Mixed,
    Neutral,
}

/// Alignment verdict with the samples that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignmentVerdict {
    pub alignment: Alignment,
    pub samples: Vec<TrendSample>,
}

impl AlignmentVerdict {
    /// Trade direction implied by the verdict, if any
    pub fn direction(&self) -> Option<Trend> {
        match self.alignment {
            Alignment::AlignedBullish => Some(Trend::Bullish),
            Alignment::AlignedBearish => Some(Trend::Bearish),
            Alignment::Mixed | Alignment::Neutral => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_for_aligned_verdicts() {
        let verdict = AlignmentVerdict {
            alignment: Alignment::AlignedBullish,
            samples: vec![],
        };
        assert_eq!(verdict.direction(), Some(Trend::Bullish));

        let verdict = AlignmentVerdict {
            alignment: Alignment::AlignedBearish,
            samples: vec![],
        };
        assert_eq!(verdict.direction(), Some(Trend::Bearish));
    }

    #[test]
    fn test_no_direction_when_mixed_or_neutral() {
        for alignment in [Alignment::Mixed, Alignment::Neutral] {
            let verdict = AlignmentVerdict {
                alignment,
                samples: vec![],
            };
            assert_eq!(verdict.direction(), None);
        }
    }
}
