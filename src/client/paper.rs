//! Paper trading client with simulated ticks and settlement
//!
//! Generates a deterministic price walk per symbol, fills orders at the
//! latest simulated quote, and settles contracts after their tick
//! duration. Native candles are deliberately unsupported so paper mode
//! exercises the tick-synthesis fallback.

use super::{ClientError, ContractStatus, MarketClient, OrderReceipt, OrderSpec};
use crate::feed::{Candle, Tick};
use crate::trade::{ContractId, ContractKind};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};

/// Simulated market client
#[derive(Clone)]
pub struct PaperClient {
    tick_interval: Duration,
    /// Win profit as a fraction of stake
    payout: Decimal,
    pip_digits: u32,
    state: Arc<RwLock<PaperState>>,
}

struct PaperState {
    next_id: ContractId,
    last_price: HashMap<String, Decimal>,
    contracts: HashMap<ContractId, PaperContract>,
    update_txs: Vec<mpsc::Sender<ContractStatus>>,
}

struct PaperContract {
    spec: OrderSpec,
    entry: Decimal,
    ticks_remaining: u32,
    profit: Option<Decimal>,
}

impl PaperClient {
    /// Create a paper client with the given tick cadence
    pub fn new(tick_interval: Duration, payout: Decimal, pip_digits: u32) -> Self {
        Self {
            tick_interval,
            payout,
            pip_digits,
            state: Arc::new(RwLock::new(PaperState {
                next_id: 1,
                last_price: HashMap::new(),
                contracts: HashMap::new(),
                update_txs: vec![],
            })),
        }
    }

    /// Create a client with defaults suitable for the CLI paper mode
    pub fn with_defaults() -> Self {
        Self::new(Duration::from_millis(250), Decimal::new(95, 2), 2)
    }

    /// Feed one tick into the simulation
    ///
    /// Updates the latest quote, advances open contracts on the symbol,
    /// and pushes settlement updates to `contract_updates` subscribers.
    pub async fn inject_tick(&self, tick: &Tick) {
        let (settled, txs) = {
            let mut state = self.state.write().await;
            state.last_price.insert(tick.symbol.clone(), tick.price);

            let mut settled = vec![];
            for (id, contract) in state.contracts.iter_mut() {
                if contract.profit.is_some() || contract.spec.symbol != tick.symbol {
                    continue;
                }

                contract.ticks_remaining -= 1;
                if contract.ticks_remaining > 0 {
                    continue;
                }

                let won = evaluate(&contract.spec.kind, contract.entry, tick, self.pip_digits);
                let profit = if won {
                    (contract.spec.stake * self.payout).round_dp(2)
                } else {
                    -contract.spec.stake
                };
                contract.profit = Some(profit);

                tracing::info!(contract_id = id, %profit, "Paper contract settled");
                settled.push(ContractStatus {
                    contract_id: *id,
                    is_settled: true,
                    profit,
                    current_price: Some(tick.price),
                });
            }

            state.update_txs.retain(|tx| !tx.is_closed());
            (settled, state.update_txs.clone())
        };

        for status in settled {
            for tx in &txs {
                let _ = tx.send(status.clone()).await;
            }
        }
    }
}

/// Deterministic pseudo-random pip step in -9..=9
fn next_step(lcg: &mut u64) -> i64 {
    *lcg = lcg
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    ((*lcg >> 33) % 19) as i64 - 9
}

fn evaluate(kind: &ContractKind, entry: Decimal, exit: &Tick, pip_digits: u32) -> bool {
    match kind {
        ContractKind::Rise => exit.price > entry,
        ContractKind::Fall => exit.price < entry,
        ContractKind::DigitOver(barrier) => exit.last_digit(pip_digits) > *barrier,
        ContractKind::DigitUnder(barrier) => exit.last_digit(pip_digits) < *barrier,
    }
}

#[async_trait]
impl MarketClient for PaperClient {
    async fn subscribe_ticks(&self, symbol: &str) -> Result<mpsc::Receiver<Tick>, ClientError> {
        let (tick_tx, tick_rx) = mpsc::channel(1024);
        let client = self.clone();
        let symbol = symbol.to_string();

        tokio::spawn(async move {
            let mut lcg: u64 = symbol.bytes().map(u64::from).sum::<u64>().wrapping_mul(2654435761);
            let mut price = Decimal::from(1000) + Decimal::new((lcg % 10000) as i64, 2);
            let mut interval = tokio::time::interval(client.tick_interval);

            loop {
                interval.tick().await;
                price += Decimal::new(next_step(&mut lcg), client.pip_digits);

                let tick = Tick {
                    symbol: symbol.clone(),
                    price,
                    timestamp: Utc::now(),
                };
                client.inject_tick(&tick).await;

                if tick_tx.send(tick).await.is_err() {
                    tracing::debug!(%symbol, "Tick receiver dropped, stopping simulation");
                    break;
                }
            }
        });

        Ok(tick_rx)
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        _granularity: u64,
        _count: usize,
    ) -> Result<Vec<Candle>, ClientError> {
        // Force the tick-synthesis fallback in paper mode
        Err(ClientError::CandlesUnsupported(symbol.to_string()))
    }

    async fn place_order(&self, spec: OrderSpec) -> Result<OrderReceipt, ClientError> {
        let mut state = self.state.write().await;

        let entry_price = state
            .last_price
            .get(&spec.symbol)
            .copied()
            .ok_or_else(|| ClientError::Api(format!("no quote yet for {}", spec.symbol)))?;

        let contract_id = state.next_id;
        state.next_id += 1;

        state.contracts.insert(
            contract_id,
            PaperContract {
                ticks_remaining: spec.duration_ticks.max(1),
                profit: None,
                entry: entry_price,
                spec,
            },
        );

        tracing::info!(contract_id, %entry_price, "Paper order filled");
        Ok(OrderReceipt {
            contract_id,
            entry_price,
        })
    }

    async fn query_contract(&self, contract_id: ContractId) -> Result<ContractStatus, ClientError> {
        let state = self.state.read().await;
        let contract = state
            .contracts
            .get(&contract_id)
            .ok_or(ClientError::UnknownContract(contract_id))?;

        Ok(ContractStatus {
            contract_id,
            is_settled: contract.profit.is_some(),
            profit: contract.profit.unwrap_or(Decimal::ZERO),
            current_price: state.last_price.get(&contract.spec.symbol).copied(),
        })
    }

    async fn contract_updates(&self) -> Result<mpsc::Receiver<ContractStatus>, ClientError> {
        let (tx, rx) = mpsc::channel(256);
        self.state.write().await.update_txs.push(tx);
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tick(symbol: &str, price: Decimal) -> Tick {
        Tick {
            symbol: symbol.to_string(),
            price,
            timestamp: Utc::now(),
        }
    }

    fn client() -> PaperClient {
        PaperClient::new(Duration::from_millis(10), dec!(0.95), 2)
    }

    #[tokio::test]
    async fn test_place_order_requires_quote() {
        let client = client();
        let spec = OrderSpec {
            symbol: "R_100".to_string(),
            kind: ContractKind::Rise,
            stake: dec!(0.35),
            duration_ticks: 5,
        };

        let result = client.place_order(spec).await;
        assert!(matches!(result, Err(ClientError::Api(_))));
    }

    #[tokio::test]
    async fn test_rise_contract_wins_on_higher_exit() {
        let client = client();
        client.inject_tick(&tick("R_100", dec!(1000.00))).await;

        let receipt = client
            .place_order(OrderSpec {
                symbol: "R_100".to_string(),
                kind: ContractKind::Rise,
                stake: dec!(1.00),
                duration_ticks: 2,
            })
            .await
            .unwrap();
        assert_eq!(receipt.entry_price, dec!(1000.00));

        client.inject_tick(&tick("R_100", dec!(1000.10))).await;
        client.inject_tick(&tick("R_100", dec!(1000.20))).await;

        let status = client.query_contract(receipt.contract_id).await.unwrap();
        assert!(status.is_settled);
        assert_eq!(status.profit, dec!(0.95));
    }

    #[tokio::test]
    async fn test_digit_under_contract_losses_on_high_digit() {
        let client = client();
        client.inject_tick(&tick("R_100", dec!(1000.00))).await;

        let receipt = client
            .place_order(OrderSpec {
                symbol: "R_100".to_string(),
                kind: ContractKind::DigitUnder(4),
                stake: dec!(0.35),
                duration_ticks: 1,
            })
            .await
            .unwrap();

        client.inject_tick(&tick("R_100", dec!(1000.09))).await;

        let status = client.query_contract(receipt.contract_id).await.unwrap();
        assert!(status.is_settled);
        assert_eq!(status.profit, dec!(-0.35));
    }

    #[tokio::test]
    async fn test_settlement_pushed_to_update_subscribers() {
        let client = client();
        let mut updates = client.contract_updates().await.unwrap();
        client.inject_tick(&tick("R_100", dec!(1000.00))).await;

        let receipt = client
            .place_order(OrderSpec {
                symbol: "R_100".to_string(),
                kind: ContractKind::Fall,
                stake: dec!(0.50),
                duration_ticks: 1,
            })
            .await
            .unwrap();

        client.inject_tick(&tick("R_100", dec!(999.00))).await;

        let status = updates.recv().await.unwrap();
        assert_eq!(status.contract_id, receipt.contract_id);
        assert!(status.is_settled);
        assert_eq!(status.profit, dec!(0.48)); // 0.50 * 0.95 rounded
    }

    #[tokio::test]
    async fn test_query_unknown_contract() {
        let client = client();
        let result = client.query_contract(999).await;
        assert!(matches!(result, Err(ClientError::UnknownContract(999))));
    }

    #[tokio::test]
    async fn test_ticks_only_advance_their_own_symbol() {
        let client = client();
        client.inject_tick(&tick("R_100", dec!(1000.00))).await;

        let receipt = client
            .place_order(OrderSpec {
                symbol: "R_100".to_string(),
                kind: ContractKind::Rise,
                stake: dec!(1.00),
                duration_ticks: 1,
            })
            .await
            .unwrap();

        client.inject_tick(&tick("R_50", dec!(500.00))).await;

        let status = client.query_contract(receipt.contract_id).await.unwrap();
        assert!(!status.is_settled);
    }
}
