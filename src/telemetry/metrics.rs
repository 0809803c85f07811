//! Prometheus metrics

use std::time::Duration;

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Order submission round trip
    OrderPlacement,
    /// Open-contract poll round trip
    ContractPoll,
    /// One strategy evaluation pass
    SignalEvaluation,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Stake the next trade will use
    CurrentStake,
    /// Consecutive losses since the last win
    ConsecutiveLosses,
    /// Settled winning trades this session
    Wins,
    /// Settled losing trades this session
    Losses,
    /// Open trade count (0 or 1)
    OpenTrades,
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let name = match metric {
        LatencyMetric::OrderPlacement => "synthbot_order_placement_latency_ms",
        LatencyMetric::ContractPoll => "synthbot_contract_poll_latency_ms",
        LatencyMetric::SignalEvaluation => "synthbot_signal_evaluation_latency_ms",
    };

    metrics::histogram!(name).record(duration.as_millis() as f64);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let name = match metric {
        GaugeMetric::CurrentStake => "synthbot_current_stake",
        GaugeMetric::ConsecutiveLosses => "synthbot_consecutive_losses",
        GaugeMetric::Wins => "synthbot_wins_total",
        GaugeMetric::Losses => "synthbot_losses_total",
        GaugeMetric::OpenTrades => "synthbot_open_trades",
    };

    metrics::gauge!(name).set(value);
}
