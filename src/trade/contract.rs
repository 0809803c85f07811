//! Contract handle state machine
//!
//! Tracks one logical trade (one or two legs) from placement to
//! settlement. Applying the same terminal update twice leaves the handle
//! unchanged, which lets the push and poll notification paths share one
//! reducer.

use super::types::{ContractId, HandleStatus, LegInfo, TradeOutcome};
use crate::client::ContractStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// One logical trade owned by the coordinator
#[derive(Debug, Clone)]
pub struct ContractHandle {
    pub trade_id: Uuid,
    pub symbol: String,
    pub legs: Vec<LegInfo>,
    pub stake_per_leg: Decimal,
    pub placed_at: DateTime<Utc>,
    pub status: HandleStatus,
}

impl ContractHandle {
    /// Create a handle for freshly placed legs
    pub fn new(
        symbol: impl Into<String>,
        legs: Vec<LegInfo>,
        stake_per_leg: Decimal,
        placed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            trade_id: Uuid::new_v4(),
            symbol: symbol.into(),
            legs,
            stake_per_leg,
            placed_at,
            status: HandleStatus::Open,
        }
    }

    /// Contract id representing the whole trade for dedup purposes
    pub fn primary_id(&self) -> Option<ContractId> {
        self.legs.first().map(|leg| leg.contract_id)
    }

    /// Ids of legs still awaiting a terminal state
    pub fn open_leg_ids(&self) -> Vec<ContractId> {
        self.legs
            .iter()
            .filter(|leg| !leg.is_settled())
            .map(|leg| leg.contract_id)
            .collect()
    }

    /// True when this handle owns the given contract id
    pub fn owns(&self, contract_id: ContractId) -> bool {
        self.legs.iter().any(|leg| leg.contract_id == contract_id)
    }

    /// Fold a platform update into the matching leg
    ///
    /// Returns true when the update changed anything. Non-terminal
    /// updates and repeats of an already-settled leg are no-ops.
    pub fn apply_update(&mut self, update: &ContractStatus) -> bool {
        let Some(leg) = self
            .legs
            .iter_mut()
            .find(|leg| leg.contract_id == update.contract_id)
        else {
            return false;
        };

        if !update.is_settled || leg.is_settled() {
            return false;
        }

        leg.profit = Some(update.profit);
        if self.all_settled() {
            self.status = HandleStatus::Settling;
        }
        true
    }

    /// True once every leg has a terminal state
    pub fn all_settled(&self) -> bool {
        self.legs.iter().all(|leg| leg.is_settled())
    }

    /// Combined outcome, once every leg is terminal
    ///
    /// A trade wins when at least one leg is profitable; the reported
    /// profit is the sum across legs.
    pub fn outcome(&self) -> Option<(TradeOutcome, Decimal)> {
        if !self.all_settled() {
            return None;
        }

        let total: Decimal = self.legs.iter().filter_map(|leg| leg.profit).sum();
        let any_profitable = self
            .legs
            .iter()
            .any(|leg| leg.profit.is_some_and(|p| p > Decimal::ZERO));

        let outcome = if any_profitable {
            TradeOutcome::Win
        } else {
            TradeOutcome::Loss
        };
        Some((outcome, total))
    }
}
