//! Tick-to-candle synthesis
//!
//! Buckets tick timestamps into fixed-granularity windows and tracks
//! running OHLC per bucket. Only the most recent bucket is mutable; a
//! candle is final once a newer bucket starts.

use super::Tick;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Aggregated open/high/low/close over one time bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    /// Bucket start, unix seconds, aligned to the granularity
    pub epoch: i64,
}

/// Rolling candle series for one symbol at one granularity
pub struct CandleSeries {
    granularity: i64,
    capacity: usize,
    candles: VecDeque<Candle>,
}

impl CandleSeries {
    /// Create a series with the given granularity (seconds) and capacity
    pub fn new(granularity: u64, capacity: usize) -> Self {
        Self {
            granularity: granularity as i64,
            capacity,
            candles: VecDeque::with_capacity(capacity.min(256)),
        }
    }

    /// Fold a tick into the series
    ///
    /// Ticks older than the current bucket are dropped; candle history is
    /// immutable once a newer bucket has started.
    pub fn push_tick(&mut self, tick: &Tick) {
        let epoch = tick.timestamp.timestamp().div_euclid(self.granularity) * self.granularity;

        match self.candles.back_mut() {
            Some(current) if current.epoch == epoch => {
                current.high = current.high.max(tick.price);
                current.low = current.low.min(tick.price);
                current.close = tick.price;
            }
            Some(current) if current.epoch > epoch => {
                tracing::debug!(epoch, current = current.epoch, "Dropping out-of-order tick");
            }
            _ => {
                if self.candles.len() == self.capacity {
                    self.candles.pop_front();
                }
                self.candles.push_back(Candle {
                    open: tick.price,
                    high: tick.price,
                    low: tick.price,
                    close: tick.price,
                    epoch,
                });
            }
        }
    }

    /// Closing prices oldest-first
    pub fn closes(&self) -> Vec<Decimal> {
        self.candles.iter().map(|c| c.close).collect()
    }

    /// Candles oldest-first
    pub fn candles(&self) -> Vec<Candle> {
        self.candles.iter().cloned().collect()
    }

    /// Number of candles in the series
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    /// True when the series holds no candles
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }
}

/// Synthesize candles from a tick stream in one pass
///
/// Produces identical output for identical input, so a series rebuilt
/// from the same ticks matches an incrementally maintained one.
pub fn synthesize(ticks: impl IntoIterator<Item = Tick>, granularity: u64) -> Vec<Candle> {
    let mut series = CandleSeries::new(granularity, usize::MAX);
    for tick in ticks {
        series.push_tick(&tick);
    }
    series.candles()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn tick_at(secs: i64, price: Decimal) -> Tick {
        Tick {
            symbol: "R_100".to_string(),
            price,
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_single_bucket_tracks_ohlc() {
        let mut series = CandleSeries::new(60, 10);
        series.push_tick(&tick_at(1000, dec!(100.0)));
        series.push_tick(&tick_at(1010, dec!(102.0)));
        series.push_tick(&tick_at(1020, dec!(99.0)));
        series.push_tick(&tick_at(1030, dec!(101.0)));

        assert_eq!(series.len(), 1);
        let candle = &series.candles()[0];
        assert_eq!(candle.open, dec!(100.0));
        assert_eq!(candle.high, dec!(102.0));
        assert_eq!(candle.low, dec!(99.0));
        assert_eq!(candle.close, dec!(101.0));
        assert_eq!(candle.epoch, 960); // floor(1000/60)*60
    }

    #[test]
    fn test_new_bucket_finalizes_previous() {
        let mut series = CandleSeries::new(60, 10);
        series.push_tick(&tick_at(1000, dec!(100.0)));
        series.push_tick(&tick_at(1080, dec!(105.0)));

        assert_eq!(series.len(), 2);
        let candles = series.candles();
        assert_eq!(candles[0].close, dec!(100.0));
        assert_eq!(candles[1].open, dec!(105.0));
        assert_eq!(candles[1].epoch, 1080);
    }

    #[test]
    fn test_out_of_order_tick_dropped() {
        let mut series = CandleSeries::new(60, 10);
        series.push_tick(&tick_at(1080, dec!(105.0)));
        series.push_tick(&tick_at(1000, dec!(100.0)));

        // Finalized history is untouched
        assert_eq!(series.len(), 1);
        assert_eq!(series.candles()[0].close, dec!(105.0));
    }

    #[test]
    fn test_capacity_evicts_oldest_candle() {
        let mut series = CandleSeries::new(60, 2);
        series.push_tick(&tick_at(0, dec!(1)));
        series.push_tick(&tick_at(60, dec!(2)));
        series.push_tick(&tick_at(120, dec!(3)));

        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![dec!(2), dec!(3)]);
    }

    #[test]
    fn test_synthesize_idempotent() {
        let ticks: Vec<Tick> = (0..50)
            .map(|i| tick_at(i * 17, Decimal::from(100 + i % 7)))
            .collect();

        let first = synthesize(ticks.clone(), 60);
        let second = synthesize(ticks, 60);
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }
}
