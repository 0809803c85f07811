//! Trend analysis module
//!
//! Decycler filtering, per-timeframe classification, and multi-timeframe
//! alignment with reversal detection.

mod aggregator;
mod decycler;
mod types;

pub use aggregator::{classify, TimeframeAggregator};
pub use decycler::{decycle, Decycler};
pub use types::{Alignment, AlignmentVerdict, Trend, TrendSample};
