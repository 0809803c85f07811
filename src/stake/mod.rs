//! Stake management module
//!
//! Loss-compounding stake control with win reset and duplicate-loss
//! debouncing.

mod controller;

pub use controller::{StakeAction, StakeController};
