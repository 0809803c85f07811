//! Digit-frequency analysis module
//!
//! Scores last-digit distributions for the over/under dual-leg strategy
//! and selects the best-scoring ready symbol across the universe.

mod scorer;
mod types;

pub use scorer::DigitScorer;
pub use types::{DigitStats, SymbolOpportunity};
