//! Market data module
//!
//! Tick ingestion, bounded per-symbol buffering, and tick-to-candle
//! synthesis for timeframes where native candles are unavailable.

mod buffer;
mod candles;
mod types;

pub use buffer::TickBuffer;
pub use candles::{synthesize, Candle, CandleSeries};
pub use types::Tick;
