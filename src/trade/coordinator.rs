//! Contract lifecycle coordination
//!
//! Owns the single active trade from gated placement through monitoring
//! to settlement. All mutable trading state (stake, active handle,
//! in-progress flag, processed-id markers) lives behind one write lock;
//! the scheduler tick, the poll tick, and the push callback all go
//! through it, so the duplicate-notification race resolves to whichever
//! path takes the lock first.

use super::contract::ContractHandle;
use super::types::{
    ContractId, LegInfo, StrategyClass, TradeEvent, TradeOutcome, TradeSignal,
};
use crate::client::{ClientError, ContractStatus, MarketClient, OrderSpec};
use crate::config::{StakeConfig, TradeConfig};
use crate::stake::StakeController;
use crate::telemetry::{record_latency, set_gauge, GaugeMetric, LatencyMetric};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, mpsc, RwLock};
use uuid::Uuid;

/// Why a trade signal was not acted on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// A placement is still in flight
    TradeInProgress,
    /// An earlier trade has not settled yet
    ContractOpen,
    /// The per-strategy cooldown since the last trade has not elapsed
    Cooldown,
    /// The quiet period after the last settlement has not elapsed
    QuietPeriod,
}

/// Result of offering a signal to the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceOutcome {
    Placed { trade_id: Uuid },
    Rejected(RejectReason),
}

/// Session counters exposed to collaborators
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub wins: u32,
    pub losses: u32,
    pub consecutive_losses: u32,
    pub current_stake: Decimal,
    pub trade_open: bool,
}

struct CoordinatorState {
    stake: StakeController,
    active: Option<ContractHandle>,
    trade_in_progress: bool,
    last_trade_at: Option<DateTime<Utc>>,
    last_settled_at: Option<DateTime<Utc>>,
    /// Leg ids of the last consumed trade, for duplicate-notification dedup
    last_processed: Vec<ContractId>,
    wins: u32,
    losses: u32,
}

/// Coordinates trade placement, monitoring, and settlement
pub struct TradeCoordinator {
    client: Arc<dyn MarketClient>,
    /// Linked accounts receiving fire-and-forget mirror orders
    mirrors: Vec<Arc<dyn MarketClient>>,
    config: TradeConfig,
    call_timeout: std::time::Duration,
    state: Arc<RwLock<CoordinatorState>>,
    event_tx: broadcast::Sender<TradeEvent>,
}

impl TradeCoordinator {
    /// Create a coordinator trading through the given client
    pub fn new(
        client: Arc<dyn MarketClient>,
        mirrors: Vec<Arc<dyn MarketClient>>,
        config: TradeConfig,
        stake_config: &StakeConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(64);

        Self {
            client,
            mirrors,
            call_timeout: std::time::Duration::from_secs(config.order_timeout_secs),
            config,
            state: Arc::new(RwLock::new(CoordinatorState {
                stake: StakeController::new(stake_config, Utc::now()),
                active: None,
                trade_in_progress: false,
                last_trade_at: None,
                last_settled_at: None,
                last_processed: vec![],
                wins: 0,
                losses: 0,
            })),
            event_tx,
        }
    }

    /// Subscribe to placement and settlement notifications
    pub fn subscribe_events(&self) -> broadcast::Receiver<TradeEvent> {
        self.event_tx.subscribe()
    }

    /// Session counters and current stake
    pub async fn summary(&self) -> SessionSummary {
        let state = self.state.read().await;
        SessionSummary {
            wins: state.wins,
            losses: state.losses,
            consecutive_losses: state.stake.consecutive_losses(),
            current_stake: state.stake.get(),
            trade_open: state.active.is_some(),
        }
    }

    /// Attempt to place a trade for the signal
    ///
    /// The in-progress flag is checked-and-set under the write lock and
    /// cleared again on every exit path, so a failed placement leaves the
    /// coordinator eligible to retry on a later signal with the stake
    /// untouched.
    pub async fn try_place(&self, signal: TradeSignal) -> Result<PlaceOutcome, ClientError> {
        let now = Utc::now();
        let stake = {
            let mut state = self.state.write().await;
            if let Some(reason) = self.gate(&state, &signal, now) {
                tracing::debug!(?reason, symbol = signal.symbol(), "Trade signal rejected");
                return Ok(PlaceOutcome::Rejected(reason));
            }
            state.trade_in_progress = true;
            state.stake.get()
        };

        let started = Instant::now();
        let result = self.place_legs(&signal, stake).await;
        record_latency(LatencyMetric::OrderPlacement, started.elapsed());

        let mut state = self.state.write().await;
        state.trade_in_progress = false;

        let legs = result?;
        let handle = ContractHandle::new(signal.symbol(), legs, stake, now);
        let trade_id = handle.trade_id;
        let event = TradeEvent::Placed {
            trade_id,
            symbol: handle.symbol.clone(),
            kinds: handle.legs.iter().map(|leg| leg.kind).collect(),
            stake,
            at: now,
        };

        state.last_trade_at = Some(now);
        state.active = Some(handle);
        drop(state);

        set_gauge(GaugeMetric::OpenTrades, 1.0);
        tracing::info!(%trade_id, symbol = signal.symbol(), %stake, "Trade placed");
        self.emit(event);

        Ok(PlaceOutcome::Placed { trade_id })
    }

    /// Feed a contract status from either notification path
    ///
    /// Idempotent: the first path to observe the terminal state performs
    /// the settlement; repeats and strays are logged and dropped.
    pub async fn handle_update(&self, update: ContractStatus) {
        let now = Utc::now();
        let event = {
            let mut state = self.state.write().await;
            Self::apply_settlement(&mut state, &update, now)
        };

        if let Some(event) = event {
            self.emit(event);
        }
    }

    /// Query every open leg once; failures retry on the next tick
    pub async fn poll_open(&self) {
        let leg_ids = {
            let state = self.state.read().await;
            state
                .active
                .as_ref()
                .map(|handle| handle.open_leg_ids())
                .unwrap_or_default()
        };

        for contract_id in leg_ids {
            let started = Instant::now();
            match self.with_timeout(self.client.query_contract(contract_id)).await {
                Ok(status) => {
                    record_latency(LatencyMetric::ContractPoll, started.elapsed());
                    self.handle_update(status).await;
                }
                Err(e) => {
                    tracing::warn!(contract_id, error = %e, "Contract poll failed, retrying next tick");
                }
            }
        }
    }

    /// Drive the coordinator until the signal channel closes
    ///
    /// Selects across incoming signals, the push update stream, and the
    /// poll interval. Stopping abandons (does not cancel) a placed trade
    /// and resets the in-flight flag.
    pub async fn run(
        self: Arc<Self>,
        mut signals: mpsc::Receiver<TradeSignal>,
    ) -> Result<(), ClientError> {
        let mut updates = self.client.contract_updates().await?;
        let mut poll = tokio::time::interval(std::time::Duration::from_millis(
            self.config.poll_interval_ms,
        ));
        poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                signal = signals.recv() => {
                    match signal {
                        Some(signal) => {
                            if let Err(e) = self.try_place(signal).await {
                                tracing::warn!(error = %e, "Placement failed, eligible to retry");
                            }
                        }
                        None => break,
                    }
                }

                Some(update) = updates.recv() => {
                    self.handle_update(update).await;
                }

                _ = poll.tick() => {
                    self.poll_open().await;
                }
            }
        }

        let mut state = self.state.write().await;
        state.trade_in_progress = false;
        if let Some(handle) = &state.active {
            tracing::info!(trade_id = %handle.trade_id, "Stopping with open trade, abandoning");
        }
        Ok(())
    }

    fn gate(
        &self,
        state: &CoordinatorState,
        signal: &TradeSignal,
        now: DateTime<Utc>,
    ) -> Option<RejectReason> {
        if state.trade_in_progress {
            return Some(RejectReason::TradeInProgress);
        }
        if state.active.is_some() {
            return Some(RejectReason::ContractOpen);
        }

        if let Some(last) = state.last_trade_at {
            let cooldown_ms = match signal.class() {
                StrategyClass::SingleLeg => self.config.single_cooldown_ms,
                StrategyClass::DualLeg => self.config.dual_cooldown_ms,
            };
            if now - last < Duration::milliseconds(cooldown_ms as i64) {
                return Some(RejectReason::Cooldown);
            }
        }

        if let Some(settled) = state.last_settled_at {
            if now - settled < Duration::milliseconds(self.config.settle_quiet_ms as i64) {
                return Some(RejectReason::QuietPeriod);
            }
        }

        None
    }

    /// Submit one order per leg
    ///
    /// A failure on the first leg aborts the trade. A failure on the
    /// second leg of a dual trade keeps the placed leg; the platform
    /// holds a real position that must be monitored.
    async fn place_legs(
        &self,
        signal: &TradeSignal,
        stake: Decimal,
    ) -> Result<Vec<LegInfo>, ClientError> {
        let mut legs = Vec::new();

        for kind in signal.kinds() {
            let spec = OrderSpec {
                symbol: signal.symbol().to_string(),
                kind,
                stake,
                duration_ticks: self.config.duration_ticks,
            };

            match self.with_timeout(self.client.place_order(spec.clone())).await {
                Ok(receipt) => {
                    self.mirror(spec);
                    legs.push(LegInfo {
                        contract_id: receipt.contract_id,
                        kind,
                        entry_price: receipt.entry_price,
                        profit: None,
                    });
                }
                Err(e) if legs.is_empty() => return Err(e),
                Err(e) => {
                    tracing::warn!(error = %e, %kind, "Leg placement failed, keeping placed leg");
                }
            }
        }

        Ok(legs)
    }

    /// Fire-and-forget copies of an order to linked accounts
    fn mirror(&self, spec: OrderSpec) {
        for client in &self.mirrors {
            let client = Arc::clone(client);
            let spec = spec.clone();
            tokio::spawn(async move {
                if let Err(e) = client.place_order(spec).await {
                    tracing::warn!(error = %e, "Mirror order failed");
                }
            });
        }
    }

    /// Settlement reducer shared by the push and poll paths
    ///
    /// Runs under the state write lock. Returns the settlement event once
    /// every leg of the active trade is terminal; all other inputs are
    /// no-ops.
    fn apply_settlement(
        state: &mut CoordinatorState,
        update: &ContractStatus,
        now: DateTime<Utc>,
    ) -> Option<TradeEvent> {
        match state.active.as_mut() {
            Some(handle) if handle.owns(update.contract_id) => {
                handle.apply_update(update);
                if !handle.all_settled() {
                    return None;
                }
            }
            Some(_) => {
                tracing::debug!(
                    contract_id = update.contract_id,
                    "Update outside the active trade ignored"
                );
                return None;
            }
            None => {
                if update.is_settled {
                    if state.last_processed.contains(&update.contract_id) {
                        tracing::debug!(
                            contract_id = update.contract_id,
                            "Duplicate settlement notification ignored"
                        );
                    } else {
                        tracing::warn!(
                            contract_id = update.contract_id,
                            "Settlement for unknown contract ignored"
                        );
                    }
                }
                return None;
            }
        }

        let handle = state.active.take()?;
        state.last_processed = handle.legs.iter().map(|leg| leg.contract_id).collect();
        state.last_settled_at = Some(now);

        let (outcome, profit) = handle.outcome()?;
        match outcome {
            TradeOutcome::Win => {
                state.wins += 1;
                state.stake.reset(now);
            }
            TradeOutcome::Loss => {
                state.losses += 1;
                state.stake.martingale(None, now);
            }
        }

        set_gauge(GaugeMetric::OpenTrades, 0.0);
        set_gauge(GaugeMetric::Wins, state.wins as f64);
        set_gauge(GaugeMetric::Losses, state.losses as f64);
        set_gauge(
            GaugeMetric::ConsecutiveLosses,
            state.stake.consecutive_losses() as f64,
        );
        set_gauge(
            GaugeMetric::CurrentStake,
            state.stake.get().to_f64().unwrap_or(0.0),
        );

        tracing::info!(
            trade_id = %handle.trade_id,
            ?outcome,
            %profit,
            next_stake = %state.stake.get(),
            "Trade settled"
        );

        Some(TradeEvent::Settled {
            trade_id: handle.trade_id,
            symbol: handle.symbol,
            outcome,
            profit,
            at: now,
        })
    }

    fn emit(&self, event: TradeEvent) {
        // Fire-and-forget: no subscribers is fine
        let _ = self.event_tx.send(event);
    }

    async fn with_timeout<T, F>(&self, fut: F) -> Result<T, ClientError>
    where
        F: std::future::Future<Output = Result<T, ClientError>>,
    {
        match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(result) => result,
            // A timed-out call proves nothing about the trade; re-query
            // on a later tick instead of assuming an outcome
            Err(_) => Err(ClientError::Timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::OrderReceipt;
    use crate::feed::{Candle, Tick};
    use crate::trade::ContractKind;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use tokio::sync::Mutex;

    struct MockClient {
        fail_orders: AtomicBool,
        next_id: AtomicU64,
        placed: Mutex<Vec<OrderSpec>>,
    }

    impl MockClient {
        fn new() -> Self {
            Self {
                fail_orders: AtomicBool::new(false),
                next_id: AtomicU64::new(1),
                placed: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl MarketClient for MockClient {
        async fn subscribe_ticks(
            &self,
            _symbol: &str,
        ) -> Result<mpsc::Receiver<Tick>, ClientError> {
            let (_tx, rx) = mpsc::channel(1);
            Ok(rx)
        }

        async fn fetch_candles(
            &self,
            symbol: &str,
            _granularity: u64,
            _count: usize,
        ) -> Result<Vec<Candle>, ClientError> {
            Err(ClientError::CandlesUnsupported(symbol.to_string()))
        }

        async fn place_order(&self, spec: OrderSpec) -> Result<OrderReceipt, ClientError> {
            if self.fail_orders.load(Ordering::SeqCst) {
                return Err(ClientError::Api("placement rejected".to_string()));
            }

            let contract_id = self.next_id.fetch_add(1, Ordering::SeqCst);
            self.placed.lock().await.push(spec);
            Ok(OrderReceipt {
                contract_id,
                entry_price: dec!(1234.56),
            })
        }

        async fn query_contract(
            &self,
            contract_id: ContractId,
        ) -> Result<ContractStatus, ClientError> {
            Err(ClientError::UnknownContract(contract_id))
        }

        async fn contract_updates(&self) -> Result<mpsc::Receiver<ContractStatus>, ClientError> {
            let (_tx, rx) = mpsc::channel(1);
            Ok(rx)
        }
    }

    fn test_config() -> TradeConfig {
        TradeConfig {
            single_cooldown_ms: 0,
            dual_cooldown_ms: 0,
            settle_quiet_ms: 0,
            ..Default::default()
        }
    }

    fn coordinator_with(config: TradeConfig) -> (Arc<TradeCoordinator>, Arc<MockClient>) {
        let client = Arc::new(MockClient::new());
        let coordinator = Arc::new(TradeCoordinator::new(
            client.clone(),
            vec![],
            config,
            &StakeConfig::default(),
        ));
        (coordinator, client)
    }

    fn single_signal() -> TradeSignal {
        TradeSignal::Single {
            symbol: "R_100".to_string(),
            kind: ContractKind::Rise,
        }
    }

    fn dual_signal() -> TradeSignal {
        TradeSignal::Dual {
            symbol: "R_100".to_string(),
            over: 5,
            under: 4,
        }
    }

    fn settled(contract_id: ContractId, profit: Decimal) -> ContractStatus {
        ContractStatus {
            contract_id,
            is_settled: true,
            profit,
            current_price: None,
        }
    }

    #[tokio::test]
    async fn test_place_single_trade() {
        let (coordinator, client) = coordinator_with(test_config());

        let outcome = coordinator.try_place(single_signal()).await.unwrap();
        assert!(matches!(outcome, PlaceOutcome::Placed { .. }));

        let summary = coordinator.summary().await;
        assert!(summary.trade_open);
        assert_eq!(summary.current_stake, dec!(0.35));

        let placed = client.placed.lock().await;
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].stake, dec!(0.35));
        assert_eq!(placed[0].kind, ContractKind::Rise);
    }

    #[tokio::test]
    async fn test_place_rejected_while_contract_open() {
        let (coordinator, _) = coordinator_with(test_config());

        coordinator.try_place(single_signal()).await.unwrap();
        let outcome = coordinator.try_place(single_signal()).await.unwrap();

        assert_eq!(outcome, PlaceOutcome::Rejected(RejectReason::ContractOpen));
    }

    #[tokio::test]
    async fn test_place_rejected_while_trade_in_progress() {
        let (coordinator, client) = coordinator_with(test_config());

        coordinator.state.write().await.trade_in_progress = true;
        let outcome = coordinator.try_place(single_signal()).await.unwrap();

        assert_eq!(
            outcome,
            PlaceOutcome::Rejected(RejectReason::TradeInProgress)
        );
        assert!(client.placed.lock().await.is_empty());
        assert_eq!(coordinator.summary().await.current_stake, dec!(0.35));
    }

    #[tokio::test]
    async fn test_failed_placement_clears_flag_and_keeps_stake() {
        let (coordinator, client) = coordinator_with(test_config());
        client.fail_orders.store(true, Ordering::SeqCst);

        let result = coordinator.try_place(single_signal()).await;
        assert!(result.is_err());

        let summary = coordinator.summary().await;
        assert!(!summary.trade_open);
        assert_eq!(summary.current_stake, dec!(0.35));

        // Eligible to retry once the client recovers
        client.fail_orders.store(false, Ordering::SeqCst);
        let outcome = coordinator.try_place(single_signal()).await.unwrap();
        assert!(matches!(outcome, PlaceOutcome::Placed { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_settlement_compounds_once() {
        let (coordinator, _) = coordinator_with(test_config());
        coordinator.try_place(single_signal()).await.unwrap();

        // Push path and poll path both report the same terminal state
        coordinator.handle_update(settled(1, dec!(-0.35))).await;
        coordinator.handle_update(settled(1, dec!(-0.35))).await;

        let summary = coordinator.summary().await;
        assert_eq!(summary.losses, 1);
        assert_eq!(summary.consecutive_losses, 1);
        assert_eq!(summary.current_stake, dec!(0.70));
        assert!(!summary.trade_open);
    }

    #[tokio::test]
    async fn test_dual_leg_settles_only_when_both_terminal() {
        let (coordinator, client) = coordinator_with(test_config());
        coordinator.try_place(dual_signal()).await.unwrap();
        assert_eq!(client.placed.lock().await.len(), 2);

        coordinator.handle_update(settled(1, dec!(-0.35))).await;
        let summary = coordinator.summary().await;
        assert!(summary.trade_open); // one leg still open
        assert_eq!(summary.wins + summary.losses, 0);

        coordinator.handle_update(settled(2, dec!(0.33))).await;
        let summary = coordinator.summary().await;
        assert_eq!(summary.wins, 1);
        assert_eq!(summary.losses, 0);
        // One leg profitable: win, single stake reset
        assert_eq!(summary.current_stake, dec!(0.35));
        assert_eq!(summary.consecutive_losses, 0);
    }

    #[tokio::test]
    async fn test_cooldown_rejects_immediate_retrade() {
        let config = TradeConfig {
            single_cooldown_ms: 60_000,
            dual_cooldown_ms: 0,
            settle_quiet_ms: 0,
            ..Default::default()
        };
        let (coordinator, _) = coordinator_with(config);

        coordinator.try_place(single_signal()).await.unwrap();
        coordinator.handle_update(settled(1, dec!(0.33))).await;

        let outcome = coordinator.try_place(single_signal()).await.unwrap();
        assert_eq!(outcome, PlaceOutcome::Rejected(RejectReason::Cooldown));
    }

    #[tokio::test]
    async fn test_quiet_period_after_settlement() {
        let config = TradeConfig {
            single_cooldown_ms: 0,
            dual_cooldown_ms: 0,
            settle_quiet_ms: 60_000,
            ..Default::default()
        };
        let (coordinator, _) = coordinator_with(config);

        coordinator.try_place(single_signal()).await.unwrap();
        coordinator.handle_update(settled(1, dec!(0.33))).await;

        let outcome = coordinator.try_place(single_signal()).await.unwrap();
        assert_eq!(outcome, PlaceOutcome::Rejected(RejectReason::QuietPeriod));
    }

    #[tokio::test]
    async fn test_settlement_for_unknown_contract_ignored() {
        let (coordinator, _) = coordinator_with(test_config());
        coordinator.try_place(single_signal()).await.unwrap();

        coordinator.handle_update(settled(99, dec!(-1))).await;

        let summary = coordinator.summary().await;
        assert!(summary.trade_open);
        assert_eq!(summary.losses, 0);
    }

    #[tokio::test]
    async fn test_events_emitted_on_place_and_settle() {
        let (coordinator, _) = coordinator_with(test_config());
        let mut events = coordinator.subscribe_events();

        coordinator.try_place(single_signal()).await.unwrap();
        coordinator.handle_update(settled(1, dec!(-0.35))).await;

        let placed = events.recv().await.unwrap();
        assert!(matches!(placed, TradeEvent::Placed { .. }));

        let settled_event = events.recv().await.unwrap();
        match settled_event {
            TradeEvent::Settled {
                outcome, profit, ..
            } => {
                assert_eq!(outcome, TradeOutcome::Loss);
                assert_eq!(profit, dec!(-0.35));
            }
            other => panic!("expected settled event, got {other:?}"),
        }
    }
}
