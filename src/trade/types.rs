//! Trade coordination types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Contract identifier assigned by the trading platform
pub type ContractId = u64;

/// Contract variety submitted to the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractKind {
    /// Settles as a win when the exit quote is above the entry quote
    Rise,
    /// Settles as a win when the exit quote is below the entry quote
    Fall,
    /// Settles as a win when the exit digit is above the barrier
    DigitOver(u8),
    /// Settles as a win when the exit digit is below the barrier
    DigitUnder(u8),
}

impl std::fmt::Display for ContractKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContractKind::Rise => write!(f, "rise"),
            ContractKind::Fall => write!(f, "fall"),
            ContractKind::DigitOver(b) => write!(f, "over-{}", b),
            ContractKind::DigitUnder(b) => write!(f, "under-{}", b),
        }
    }
}

/// Cooldown class a trade belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyClass {
    SingleLeg,
    DualLeg,
}

/// A trade decision handed to the coordinator
#[derive(Debug, Clone)]
pub enum TradeSignal {
    /// One directional contract from an alignment verdict
    Single { symbol: String, kind: ContractKind },
    /// Two complementary digit contracts on one symbol
    Dual { symbol: String, over: u8, under: u8 },
}

impl TradeSignal {
    /// Symbol the trade targets
    pub fn symbol(&self) -> &str {
        match self {
            TradeSignal::Single { symbol, .. } | TradeSignal::Dual { symbol, .. } => symbol,
        }
    }

    /// Cooldown class of the signal
    pub fn class(&self) -> StrategyClass {
        match self {
            TradeSignal::Single { .. } => StrategyClass::SingleLeg,
            TradeSignal::Dual { .. } => StrategyClass::DualLeg,
        }
    }

    /// Contract kinds to submit, one per leg
    pub fn kinds(&self) -> Vec<ContractKind> {
        match self {
            TradeSignal::Single { kind, .. } => vec![*kind],
            TradeSignal::Dual { over, under, .. } => {
                vec![ContractKind::DigitOver(*over), ContractKind::DigitUnder(*under)]
            }
        }
    }
}

/// One leg of an open trade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegInfo {
    pub contract_id: ContractId,
    pub kind: ContractKind,
    pub entry_price: Decimal,
    /// Settled profit; `None` while the leg is open
    pub profit: Option<Decimal>,
}

impl LegInfo {
    /// True once the platform reported a terminal state for this leg
    pub fn is_settled(&self) -> bool {
        self.profit.is_some()
    }
}

/// Lifecycle status of a trade handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandleStatus {
    Pending,
    Open,
    Settling,
    Settled,
}

/// Combined result of a settled trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeOutcome {
    Win,
    Loss,
}

/// Fire-and-forget notification raised by the coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TradeEvent {
    Placed {
        trade_id: Uuid,
        symbol: String,
        kinds: Vec<ContractKind>,
        stake: Decimal,
        at: DateTime<Utc>,
    },
    Settled {
        trade_id: Uuid,
        symbol: String,
        outcome: TradeOutcome,
        profit: Decimal,
        at: DateTime<Utc>,
    },
}
