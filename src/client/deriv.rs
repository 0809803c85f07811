//! Live trading API client over WebSocket
//!
//! JSON request/response with `req_id` correlation on one bidirectional
//! connection. Tick and contract updates arrive as server pushes and are
//! routed to subscribers by message type; everything else resolves a
//! pending request. Subscriptions are replayed after every reconnect.

use super::{ClientError, ContractStatus, MarketClient, OrderReceipt, OrderSpec};
use crate::config::ClientConfig;
use crate::feed::{Candle, Tick};
use crate::trade::{ContractId, ContractKind};
use crate::ws::{WsClient, WsConfig, WsMessage};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex};

/// Upper bound on a request/response round trip
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

struct Inner {
    send_tx: mpsc::Sender<String>,
    next_req_id: AtomicU64,
    pending: Mutex<HashMap<u64, oneshot::Sender<Value>>>,
    tick_subs: Mutex<HashMap<String, Vec<mpsc::Sender<Tick>>>>,
    contract_subs: Mutex<Vec<mpsc::Sender<ContractStatus>>>,
    /// Subscribe payloads replayed after a reconnect
    resubscribe: Mutex<Vec<String>>,
}

/// Live market client
pub struct DerivClient {
    inner: Arc<Inner>,
}

impl DerivClient {
    /// Connect to the trading API described by the config
    pub fn connect(config: &ClientConfig) -> Self {
        let url = format!("{}?app_id={}", config.endpoint, config.app_id);
        let ws_config = WsConfig::new(url)
            .keepalive_interval(Duration::from_secs(30))
            .keepalive_text(r#"{"ping": 1}"#);

        Self::with_transport(WsClient::new(ws_config))
    }

    fn with_transport(ws: WsClient) -> Self {
        let (ws_rx, send_tx) = ws.connect();
        let inner = Arc::new(Inner {
            send_tx,
            next_req_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
            tick_subs: Mutex::new(HashMap::new()),
            contract_subs: Mutex::new(vec![]),
            resubscribe: Mutex::new(vec![]),
        });

        tokio::spawn(Self::route_messages(Arc::clone(&inner), ws_rx));

        Self { inner }
    }

    /// Send a request and await its correlated response
    async fn request(&self, mut payload: Value) -> Result<Value, ClientError> {
        let req_id = self.inner.next_req_id.fetch_add(1, Ordering::SeqCst);
        payload["req_id"] = json!(req_id);

        let (tx, rx) = oneshot::channel();
        self.inner.pending.lock().await.insert(req_id, tx);

        if self.inner.send_tx.send(payload.to_string()).await.is_err() {
            self.inner.pending.lock().await.remove(&req_id);
            return Err(ClientError::Transport("connection task stopped".into()));
        }

        match tokio::time::timeout(REQUEST_TIMEOUT, rx).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(ClientError::Transport("connection dropped".into())),
            Err(_) => {
                self.inner.pending.lock().await.remove(&req_id);
                Err(ClientError::Timeout)
            }
        }
    }

    /// Send a subscription payload and remember it for reconnect replay
    async fn subscribe(&self, payload: Value) -> Result<(), ClientError> {
        let text = payload.to_string();
        self.inner.resubscribe.lock().await.push(text.clone());
        self.inner
            .send_tx
            .send(text)
            .await
            .map_err(|_| ClientError::Transport("connection task stopped".into()))
    }

    async fn route_messages(inner: Arc<Inner>, mut ws_rx: mpsc::Receiver<WsMessage>) {
        while let Some(msg) = ws_rx.recv().await {
            match msg {
                WsMessage::Text(text) => Self::dispatch(&inner, &text).await,
                WsMessage::Connected => {
                    let payloads = inner.resubscribe.lock().await.clone();
                    if !payloads.is_empty() {
                        tracing::info!(count = payloads.len(), "Replaying subscriptions");
                    }
                    for payload in payloads {
                        if inner.send_tx.send(payload).await.is_err() {
                            return;
                        }
                    }
                }
                WsMessage::Disconnected => {
                    // Dropping the senders fails every in-flight request
                    inner.pending.lock().await.clear();
                    tracing::warn!("Trading API connection closed");
                    break;
                }
                WsMessage::Reconnecting { attempt } => {
                    tracing::warn!(attempt, "Trading API reconnecting...");
                }
                WsMessage::Binary(_) => {}
            }
        }
    }

    async fn dispatch(inner: &Inner, text: &str) {
        let Ok(value) = serde_json::from_str::<Value>(text) else {
            tracing::warn!("Dropping unparseable API message");
            return;
        };

        // Request/response correlation wins over stream routing; pushes
        // carry no pending req_id
        if let Some(req_id) = value.get("req_id").and_then(Value::as_u64) {
            if let Some(tx) = inner.pending.lock().await.remove(&req_id) {
                let _ = tx.send(value);
                return;
            }
        }

        match value.get("msg_type").and_then(Value::as_str) {
            Some("tick") => {
                if let Some(tick) = parse_tick(&value) {
                    let mut subs = inner.tick_subs.lock().await;
                    if let Some(senders) = subs.get_mut(&tick.symbol) {
                        senders.retain(|tx| !tx.is_closed());
                        for tx in senders.iter() {
                            let _ = tx.send(tick.clone()).await;
                        }
                    }
                }
            }
            Some("proposal_open_contract") => {
                if let Some(status) = parse_contract(&value) {
                    let mut subs = inner.contract_subs.lock().await;
                    subs.retain(|tx| !tx.is_closed());
                    for tx in subs.iter() {
                        let _ = tx.send(status.clone()).await;
                    }
                }
            }
            Some("pong") => {}
            other => {
                tracing::trace!(msg_type = ?other, "Unrouted API message");
            }
        }
    }
}

#[async_trait]
impl MarketClient for DerivClient {
    async fn subscribe_ticks(&self, symbol: &str) -> Result<mpsc::Receiver<Tick>, ClientError> {
        let (tx, rx) = mpsc::channel(1024);
        self.inner
            .tick_subs
            .lock()
            .await
            .entry(symbol.to_string())
            .or_default()
            .push(tx);

        self.subscribe(json!({"ticks": symbol, "subscribe": 1}))
            .await?;
        Ok(rx)
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        granularity: u64,
        count: usize,
    ) -> Result<Vec<Candle>, ClientError> {
        let response = self
            .request(json!({
                "ticks_history": symbol,
                "style": "candles",
                "granularity": granularity,
                "count": count,
            }))
            .await?;

        if let Some((code, message)) = api_error(&response) {
            if code == "NotAvailable" {
                return Err(ClientError::CandlesUnsupported(symbol.to_string()));
            }
            return Err(ClientError::Api(message));
        }

        parse_candles(&response)
            .ok_or_else(|| ClientError::Api("malformed candles response".to_string()))
    }

    async fn place_order(&self, spec: OrderSpec) -> Result<OrderReceipt, ClientError> {
        let response = self.request(build_buy_request(&spec)).await?;

        if let Some((_, message)) = api_error(&response) {
            return Err(ClientError::Api(message));
        }

        let receipt = parse_receipt(&response)
            .ok_or_else(|| ClientError::Api("malformed buy response".to_string()))?;

        // Stream settlement pushes for the new contract
        self.subscribe(json!({
            "proposal_open_contract": 1,
            "contract_id": receipt.contract_id,
            "subscribe": 1,
        }))
        .await?;

        Ok(receipt)
    }

    async fn query_contract(&self, contract_id: ContractId) -> Result<ContractStatus, ClientError> {
        let response = self
            .request(json!({
                "proposal_open_contract": 1,
                "contract_id": contract_id,
            }))
            .await?;

        if let Some((code, message)) = api_error(&response) {
            if code == "ContractNotFound" {
                return Err(ClientError::UnknownContract(contract_id));
            }
            return Err(ClientError::Api(message));
        }

        parse_contract(&response)
            .ok_or_else(|| ClientError::Api("malformed contract response".to_string()))
    }

    async fn contract_updates(&self) -> Result<mpsc::Receiver<ContractStatus>, ClientError> {
        let (tx, rx) = mpsc::channel(256);
        self.inner.contract_subs.lock().await.push(tx);
        Ok(rx)
    }
}

fn decimal_field(value: &Value, key: &str) -> Option<Decimal> {
    Decimal::from_f64_retain(value.get(key)?.as_f64()?)
}

fn api_error(value: &Value) -> Option<(String, String)> {
    let err = value.get("error")?;
    let code = err
        .get("code")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let message = err
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown api error")
        .to_string();
    Some((code, message))
}

fn parse_tick(value: &Value) -> Option<Tick> {
    let tick = value.get("tick")?;
    Some(Tick {
        symbol: tick.get("symbol")?.as_str()?.to_string(),
        price: decimal_field(tick, "quote")?,
        timestamp: Utc.timestamp_opt(tick.get("epoch")?.as_i64()?, 0).single()?,
    })
}

fn parse_contract(value: &Value) -> Option<ContractStatus> {
    let contract = value.get("proposal_open_contract")?;
    Some(ContractStatus {
        contract_id: contract.get("contract_id")?.as_u64()?,
        is_settled: contract.get("is_sold").and_then(Value::as_i64).unwrap_or(0) == 1,
        profit: decimal_field(contract, "profit").unwrap_or(Decimal::ZERO),
        current_price: decimal_field(contract, "current_spot"),
    })
}

fn parse_receipt(value: &Value) -> Option<OrderReceipt> {
    let buy = value.get("buy")?;
    Some(OrderReceipt {
        contract_id: buy.get("contract_id")?.as_u64()?,
        entry_price: decimal_field(buy, "entry_spot")?,
    })
}

fn parse_candles(value: &Value) -> Option<Vec<Candle>> {
    value
        .get("candles")?
        .as_array()?
        .iter()
        .map(|candle| {
            Some(Candle {
                open: decimal_field(candle, "open")?,
                high: decimal_field(candle, "high")?,
                low: decimal_field(candle, "low")?,
                close: decimal_field(candle, "close")?,
                epoch: candle.get("epoch")?.as_i64()?,
            })
        })
        .collect()
}

fn build_buy_request(spec: &OrderSpec) -> Value {
    let (contract_type, barrier) = match spec.kind {
        ContractKind::Rise => ("CALL", None),
        ContractKind::Fall => ("PUT", None),
        ContractKind::DigitOver(b) => ("DIGITOVER", Some(b)),
        ContractKind::DigitUnder(b) => ("DIGITUNDER", Some(b)),
    };

    let mut parameters = json!({
        "symbol": spec.symbol,
        "contract_type": contract_type,
        "amount": spec.stake,
        "basis": "stake",
        "currency": "USD",
        "duration": spec.duration_ticks,
        "duration_unit": "t",
    });
    if let Some(barrier) = barrier {
        parameters["barrier"] = json!(barrier.to_string());
    }

    json!({"buy": 1, "parameters": parameters})
}
