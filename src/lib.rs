//! synthbot: trading engine for short-duration binary contracts on
//! synthetic volatility indices
//!
//! This library provides the core components for:
//! - Real-time tick ingestion with bounded per-symbol buffers
//! - Tick-to-candle synthesis across multiple timeframes
//! - Decycler trend filtering and multi-timeframe alignment
//! - Last-digit frequency scoring for the over/under dual-leg strategy
//! - Martingale stake control with debounced loss compounding
//! - Contract lifecycle coordination with exactly-once settlement
//! - Paper/live market clients over a reconnecting WebSocket transport
//! - Full observability stack

pub mod cli;
pub mod client;
pub mod config;
pub mod digits;
pub mod feed;
pub mod stake;
pub mod telemetry;
pub mod trade;
pub mod trend;
pub mod ws;
