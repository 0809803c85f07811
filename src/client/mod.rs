//! Market client module
//!
//! The engine's only view of the trading platform: tick subscription,
//! candle history, order placement, and contract queries. Implementations
//! cover paper simulation and the live WebSocket API.

mod deriv;
mod paper;
mod types;

pub use deriv::DerivClient;
pub use paper::PaperClient;
pub use types::{ClientError, ContractStatus, OrderReceipt, OrderSpec};

use crate::feed::{Candle, Tick};
use crate::trade::ContractId;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Trait for market/trading client implementations
#[async_trait]
pub trait MarketClient: Send + Sync {
    /// Subscribe to tick updates for a symbol
    async fn subscribe_ticks(&self, symbol: &str) -> Result<mpsc::Receiver<Tick>, ClientError>;

    /// Fetch native candle history
    ///
    /// Returns `ClientError::CandlesUnsupported` for symbols without
    /// native candles; callers fall back to tick synthesis.
    async fn fetch_candles(
        &self,
        symbol: &str,
        granularity: u64,
        count: usize,
    ) -> Result<Vec<Candle>, ClientError>;

    /// Submit one order
    async fn place_order(&self, spec: OrderSpec) -> Result<OrderReceipt, ClientError>;

    /// Query the current state of a contract
    async fn query_contract(&self, contract_id: ContractId) -> Result<ContractStatus, ClientError>;

    /// Subscribe to push updates for contracts placed through this client
    async fn contract_updates(&self) -> Result<mpsc::Receiver<ContractStatus>, ClientError>;
}
