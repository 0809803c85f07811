//! Market client types

use crate::trade::{ContractId, ContractKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An order to be submitted to the platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSpec {
    /// Symbol to trade (e.g., "R_100")
    pub symbol: String,
    /// Contract variety
    pub kind: ContractKind,
    /// Stake in account currency
    pub stake: Decimal,
    /// Contract duration in ticks
    pub duration_ticks: u32,
}

/// Confirmation of a placed order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub contract_id: ContractId,
    pub entry_price: Decimal,
}

/// Point-in-time contract state reported by the platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractStatus {
    pub contract_id: ContractId,
    /// True once the contract reached a terminal state
    pub is_settled: bool,
    /// Realized profit; meaningful only when settled
    pub profit: Decimal,
    /// Latest spot while the contract is open
    pub current_price: Option<Decimal>,
}

/// Market client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("api error: {0}")]
    Api(String),

    #[error("native candles unsupported for {0}")]
    CandlesUnsupported(String),

    #[error("unknown contract {0}")]
    UnknownContract(ContractId),
}
