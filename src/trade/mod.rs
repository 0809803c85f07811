//! Trade coordination module
//!
//! Contract lifecycle orchestration: gated placement, dual-leg support,
//! push/poll settlement reconciliation, and stake bookkeeping.

mod contract;
mod coordinator;
mod types;

pub use contract::ContractHandle;
pub use coordinator::{PlaceOutcome, RejectReason, SessionSummary, TradeCoordinator};
pub use types::{
    ContractId, ContractKind, HandleStatus, LegInfo, StrategyClass, TradeEvent, TradeOutcome,
    TradeSignal,
};
