//! Multi-timeframe trend aggregation
//!
//! Runs the decycler per timeframe, classifies each as bullish, bearish,
//! or neutral, and combines the classifications into one alignment
//! verdict. A reversal guard downgrades verdicts where the short-horizon
//! timeframes have already flipped against the long-horizon ones.

use super::{decycle, Alignment, AlignmentVerdict, Trend, TrendSample};
use crate::config::TrendConfig;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Short-horizon agreement below this triggers the reversal guard
const REVERSAL_SHORT_MAX: Decimal = Decimal::from_parts(3, 0, 0, false, 1); // 0.3
/// Long-horizon agreement above this triggers the reversal guard
const REVERSAL_LONG_MIN: Decimal = Decimal::from_parts(7, 0, 0, false, 1); // 0.7

/// Classify a filtered close series from its last three values
///
/// Both deltas up is bullish, both down is bearish, anything else (or
/// fewer than three points) is neutral.
pub fn classify(filtered: &[Decimal]) -> Trend {
    if filtered.len() < 3 {
        return Trend::Neutral;
    }

    let cur = filtered[filtered.len() - 1];
    let prev = filtered[filtered.len() - 2];
    let prev2 = filtered[filtered.len() - 3];

    let short_up = cur > prev;
    let med_up = prev > prev2;
    let short_down = cur < prev;
    let med_down = prev < prev2;

    if short_up && med_up {
        Trend::Bullish
    } else if short_down && med_down {
        Trend::Bearish
    } else {
        Trend::Neutral
    }
}

/// Aggregates per-timeframe classifications into an alignment verdict
pub struct TimeframeAggregator {
    config: TrendConfig,
}

impl TimeframeAggregator {
    /// Create an aggregator with the given trend configuration
    pub fn new(config: TrendConfig) -> Self {
        Self { config }
    }

    /// Produce one timeframe's sample from its closing prices
    pub fn sample(&self, timeframe: u64, closes: &[Decimal], now: DateTime<Utc>) -> TrendSample {
        let filtered = decycle(closes, self.config.alpha);
        let trend = classify(&filtered);
        let filter_value = filtered.last().copied().unwrap_or(Decimal::ZERO);

        TrendSample {
            timeframe,
            trend,
            filter_value,
            timestamp: now,
        }
    }

    /// Evaluate all timeframes and combine them into one verdict
    ///
    /// `closes_by_timeframe` must be ordered shortest timeframe first;
    /// the reversal guard splits the list at its midpoint.
    pub fn evaluate(
        &self,
        closes_by_timeframe: &[(u64, Vec<Decimal>)],
        now: DateTime<Utc>,
    ) -> AlignmentVerdict {
        let samples: Vec<TrendSample> = closes_by_timeframe
            .iter()
            .map(|(tf, closes)| self.sample(*tf, closes, now))
            .collect();
        self.aggregate(samples)
    }

    /// Combine already-classified samples into a verdict
    pub fn aggregate(&self, samples: Vec<TrendSample>) -> AlignmentVerdict {
        let total = samples.len();
        if total == 0 {
            return AlignmentVerdict {
                alignment: Alignment::Neutral,
                samples,
            };
        }

        let bullish = samples.iter().filter(|s| s.trend == Trend::Bullish).count();
        let bearish = samples.iter().filter(|s| s.trend == Trend::Bearish).count();

        let candidate = if bullish == total {
            Some(Trend::Bullish)
        } else if bearish == total {
            Some(Trend::Bearish)
        } else {
            let threshold = self.config.alignment_threshold;
            let frac = |count: usize| Decimal::from(count) / Decimal::from(total);

            if frac(bullish) >= threshold && bullish > bearish {
                Some(Trend::Bullish)
            } else if frac(bearish) >= threshold && bearish > bullish {
                Some(Trend::Bearish)
            } else {
                None
            }
        };

        let alignment = match candidate {
            Some(direction) if self.is_reversing(&samples, direction) => {
                tracing::debug!(?direction, "Reversal guard downgraded aligned verdict");
                Alignment::Mixed
            }
            Some(Trend::Bullish) => Alignment::AlignedBullish,
            Some(Trend::Bearish) => Alignment::AlignedBearish,
            Some(Trend::Neutral) | None => Alignment::Mixed,
        };

        AlignmentVerdict { alignment, samples }
    }

    /// Short-horizon half barely agrees while long-horizon half strongly
    /// agrees: the trend is flipping, not confirmed.
    fn is_reversing(&self, samples: &[TrendSample], direction: Trend) -> bool {
        let mid = samples.len() / 2;
        if mid == 0 {
            return false;
        }

        let agreement = |half: &[TrendSample]| {
            let agreeing = half.iter().filter(|s| s.trend == direction).count();
            Decimal::from(agreeing) / Decimal::from(half.len())
        };

        agreement(&samples[..mid]) < REVERSAL_SHORT_MAX
            && agreement(&samples[mid..]) > REVERSAL_LONG_MIN
    }
}
