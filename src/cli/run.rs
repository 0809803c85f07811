//! Run command implementation
//!
//! Wires the tick feed through the analysis stages and hands trade
//! signals to the coordinator: ticks accumulate in per-symbol buffers
//! and candle series, a recurring evaluation tick turns them into
//! alignment verdicts and digit opportunities, and the coordinator's own
//! loop does the placing and monitoring.

use crate::client::{ClientError, DerivClient, MarketClient, PaperClient};
use crate::config::{ClientMode, Config};
use crate::digits::{DigitScorer, DigitStats};
use crate::feed::{CandleSeries, Tick, TickBuffer};
use crate::telemetry::{record_latency, LatencyMetric};
use crate::trade::{ContractKind, TradeCoordinator, TradeSignal};
use crate::trend::{TimeframeAggregator, Trend};
use chrono::Utc;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// Which strategies feed the coordinator
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyChoice {
    /// Trend-following single-leg trades only
    Trend,
    /// Over/under dual-leg trades only
    Digits,
    /// Both strategies, sharing the one trade slot
    #[default]
    Both,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Strategy to run
    #[arg(short, long, value_enum, default_value = "both")]
    pub strategy: StrategyChoice,
}

impl RunArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let client: Arc<dyn MarketClient> = match config.client.mode {
            ClientMode::Paper => Arc::new(PaperClient::new(
                std::time::Duration::from_millis(250),
                dec!(0.95),
                config.feed.pip_digits,
            )),
            ClientMode::Live => Arc::new(DerivClient::connect(&config.client)),
        };

        let coordinator = Arc::new(TradeCoordinator::new(
            Arc::clone(&client),
            vec![],
            config.trade.clone(),
            &config.stake,
        ));

        let mut events = coordinator.subscribe_events();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                tracing::info!(?event, "Trade event");
            }
        });

        let (signal_tx, signal_rx) = mpsc::channel(16);
        tokio::spawn(Arc::clone(&coordinator).run(signal_rx));

        Engine::new(config, client, signal_tx, self.strategy)
            .run()
            .await
    }
}

/// Analysis loop feeding signals to the coordinator
struct Engine {
    config: Config,
    client: Arc<dyn MarketClient>,
    signal_tx: mpsc::Sender<TradeSignal>,
    strategy: StrategyChoice,
    aggregator: TimeframeAggregator,
    scorer: DigitScorer,
    buffers: HashMap<String, TickBuffer>,
    /// Synthesized candles for the trend symbol, one series per timeframe
    series: HashMap<u64, CandleSeries>,
}

impl Engine {
    fn new(
        config: Config,
        client: Arc<dyn MarketClient>,
        signal_tx: mpsc::Sender<TradeSignal>,
        strategy: StrategyChoice,
    ) -> Self {
        let series = config
            .trend
            .timeframes
            .iter()
            .map(|&tf| (tf, CandleSeries::new(tf, config.trend.candle_count)))
            .collect();

        Self {
            aggregator: TimeframeAggregator::new(config.trend.clone()),
            scorer: DigitScorer::new(config.digits.clone()),
            buffers: HashMap::new(),
            series,
            config,
            client,
            signal_tx,
            strategy,
        }
    }

    /// First configured symbol carries the trend strategy
    fn trend_symbol(&self) -> Option<&str> {
        self.config.feed.symbols.first().map(String::as_str)
    }

    async fn run(mut self) -> anyhow::Result<()> {
        let mut ticks = self.subscribe_all().await?;

        let mut eval = tokio::time::interval(std::time::Duration::from_millis(
            self.config.trade.eval_interval_ms,
        ));
        eval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                Some(tick) = ticks.recv() => {
                    self.ingest(tick);
                }

                _ = eval.tick() => {
                    self.evaluate().await;
                }

                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutting down");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Merge every symbol's tick stream into one channel
    async fn subscribe_all(&self) -> Result<mpsc::Receiver<Tick>, ClientError> {
        let (tx, rx) = mpsc::channel(1024);

        for symbol in &self.config.feed.symbols {
            let mut sub = self.client.subscribe_ticks(symbol).await?;
            let tx = tx.clone();
            tokio::spawn(async move {
                while let Some(tick) = sub.recv().await {
                    if tx.send(tick).await.is_err() {
                        break;
                    }
                }
            });
        }

        Ok(rx)
    }

    fn ingest(&mut self, tick: Tick) {
        if self.trend_symbol() == Some(tick.symbol.as_str()) {
            for series in self.series.values_mut() {
                series.push_tick(&tick);
            }
        }

        let capacity = self.config.feed.buffer_capacity;
        self.buffers
            .entry(tick.symbol.clone())
            .or_insert_with(|| TickBuffer::new(capacity))
            .push(tick);
    }

    async fn evaluate(&mut self) {
        let started = Instant::now();

        if matches!(self.strategy, StrategyChoice::Trend | StrategyChoice::Both) {
            self.evaluate_trend().await;
        }
        if matches!(self.strategy, StrategyChoice::Digits | StrategyChoice::Both) {
            self.evaluate_digits().await;
        }

        record_latency(LatencyMetric::SignalEvaluation, started.elapsed());
    }

    /// Multi-timeframe alignment on the trend symbol
    ///
    /// Native candles are preferred per timeframe; symbols without them
    /// fall back to the tick-synthesized series.
    async fn evaluate_trend(&self) {
        let Some(symbol) = self.trend_symbol() else {
            return;
        };

        let mut closes_by_timeframe: Vec<(u64, Vec<Decimal>)> = Vec::new();
        for &timeframe in &self.config.trend.timeframes {
            let closes = match self
                .client
                .fetch_candles(symbol, timeframe, self.config.trend.candle_count)
                .await
            {
                Ok(candles) => candles.iter().map(|c| c.close).collect(),
                Err(ClientError::CandlesUnsupported(_)) => self
                    .series
                    .get(&timeframe)
                    .map(|s| s.closes())
                    .unwrap_or_default(),
                Err(e) => {
                    tracing::warn!(error = %e, timeframe, "Candle fetch failed, skipping cycle");
                    return;
                }
            };
            closes_by_timeframe.push((timeframe, closes));
        }

        let verdict = self.aggregator.evaluate(&closes_by_timeframe, Utc::now());
        let kind = match verdict.direction() {
            Some(Trend::Bullish) => ContractKind::Rise,
            Some(Trend::Bearish) => ContractKind::Fall,
            _ => return,
        };

        let _ = self
            .signal_tx
            .send(TradeSignal::Single {
                symbol: symbol.to_string(),
                kind,
            })
            .await;
    }

    /// Best dual-leg opportunity across the symbol universe
    async fn evaluate_digits(&self) {
        let pip_digits = self.config.feed.pip_digits;
        let stats: Vec<DigitStats> = self
            .config
            .feed
            .symbols
            .iter()
            .filter_map(|symbol| {
                let buffer = self.buffers.get(symbol)?;
                DigitStats::from_ticks(symbol.clone(), buffer.iter(), pip_digits)
            })
            .collect();

        let opportunities = self.scorer.score_universe(stats.iter());
        let Some(best) = self.scorer.best(&opportunities) else {
            return;
        };

        tracing::debug!(symbol = %best.symbol, score = %best.score, "Dual-leg opportunity");
        let _ = self
            .signal_tx
            .send(TradeSignal::Dual {
                symbol: best.symbol.clone(),
                over: self.config.digits.over_barrier,
                under: self.config.digits.under_barrier,
            })
            .await;
    }
}
