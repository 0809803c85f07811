//! Bounded rolling tick buffer

use super::Tick;
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Rolling window of the most recent ticks for one symbol
///
/// Oldest ticks are evicted once the fixed capacity is reached.
pub struct TickBuffer {
    ticks: VecDeque<Tick>,
    capacity: usize,
}

impl TickBuffer {
    /// Create a buffer holding at most `capacity` ticks
    pub fn new(capacity: usize) -> Self {
        Self {
            ticks: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a tick, evicting the oldest beyond capacity
    pub fn push(&mut self, tick: Tick) {
        if self.ticks.len() == self.capacity {
            self.ticks.pop_front();
        }
        self.ticks.push_back(tick);
    }

    /// Most recent tick
    pub fn last(&self) -> Option<&Tick> {
        self.ticks.back()
    }

    /// Prices oldest-first
    pub fn prices(&self) -> Vec<Decimal> {
        self.ticks.iter().map(|t| t.price).collect()
    }

    /// Iterate ticks oldest-first
    pub fn iter(&self) -> impl Iterator<Item = &Tick> {
        self.ticks.iter()
    }

    /// Number of buffered ticks
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    /// True when no ticks are buffered
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}
