//! Configuration types for synthbot

use rust_decimal::Decimal;
use serde::Deserialize;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub trend: TrendConfig,
    #[serde(default)]
    pub digits: DigitConfig,
    #[serde(default)]
    pub stake: StakeConfig,
    #[serde(default)]
    pub trade: TradeConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Tick feed configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Symbol universe to analyze (first entry is the trend symbol)
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    /// Rolling tick buffer capacity per symbol
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,

    /// Decimal places of a quote, used for last-digit extraction
    #[serde(default = "default_pip_digits")]
    pub pip_digits: u32,
}

fn default_symbols() -> Vec<String> {
    vec!["R_100".to_string()]
}
fn default_buffer_capacity() -> usize {
    120
}
fn default_pip_digits() -> u32 {
    2
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            buffer_capacity: default_buffer_capacity(),
            pip_digits: default_pip_digits(),
        }
    }
}

/// Trend filter and alignment configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TrendConfig {
    /// Decycler smoothing coefficient, in (0, 1]
    #[serde(default = "default_alpha")]
    pub alpha: Decimal,

    /// Candle granularities in seconds, short to long
    #[serde(default = "default_timeframes")]
    pub timeframes: Vec<u64>,

    /// Fraction of timeframes that must agree for an aligned verdict
    #[serde(default = "default_alignment_threshold")]
    pub alignment_threshold: Decimal,

    /// Candles requested (or synthesized) per timeframe
    #[serde(default = "default_candle_count")]
    pub candle_count: usize,
}

fn default_alpha() -> Decimal {
    Decimal::new(7, 2) // 0.07
}
fn default_timeframes() -> Vec<u64> {
    vec![60, 120, 180, 300, 600, 900]
}
fn default_alignment_threshold() -> Decimal {
    Decimal::new(8, 1) // 0.8
}
fn default_candle_count() -> usize {
    60
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            timeframes: default_timeframes(),
            alignment_threshold: default_alignment_threshold(),
            candle_count: default_candle_count(),
        }
    }
}

/// Digit-frequency strategy configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DigitConfig {
    /// Minimum ticks sampled before a symbol is scoreable
    #[serde(default = "default_min_sample")]
    pub min_sample: usize,

    /// Barrier for the "over" leg
    #[serde(default = "default_over_barrier")]
    pub over_barrier: u8,

    /// Barrier for the "under" leg
    #[serde(default = "default_under_barrier")]
    pub under_barrier: u8,
}

fn default_min_sample() -> usize {
    20
}
fn default_over_barrier() -> u8 {
    5
}
fn default_under_barrier() -> u8 {
    4
}

impl Default for DigitConfig {
    fn default() -> Self {
        Self {
            min_sample: default_min_sample(),
            over_barrier: default_over_barrier(),
            under_barrier: default_under_barrier(),
        }
    }
}

/// Stake controller configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StakeConfig {
    /// Base stake in account currency
    #[serde(default = "default_base_stake")]
    pub base_stake: Decimal,

    /// Loss-compounding multiplier, >= 1
    #[serde(default = "default_multiplier")]
    pub multiplier: Decimal,

    /// Hard cap on consecutive compounded losses
    #[serde(default = "default_max_loss_cap")]
    pub max_loss_cap: u32,

    /// Smallest stake the platform accepts
    #[serde(default = "default_min_stake")]
    pub min_stake: Decimal,

    /// Window in which a repeated martingale is treated as a duplicate
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_base_stake() -> Decimal {
    Decimal::new(35, 2) // 0.35
}
fn default_multiplier() -> Decimal {
    Decimal::TWO
}
fn default_max_loss_cap() -> u32 {
    10
}
fn default_min_stake() -> Decimal {
    Decimal::new(35, 2) // 0.35
}
fn default_debounce_ms() -> u64 {
    2000
}

impl Default for StakeConfig {
    fn default() -> Self {
        Self {
            base_stake: default_base_stake(),
            multiplier: default_multiplier(),
            max_loss_cap: default_max_loss_cap(),
            min_stake: default_min_stake(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Trade coordination configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TradeConfig {
    /// Cooldown after a single-leg trade (milliseconds)
    #[serde(default = "default_single_cooldown_ms")]
    pub single_cooldown_ms: u64,

    /// Cooldown after a dual-leg trade (milliseconds)
    #[serde(default = "default_dual_cooldown_ms")]
    pub dual_cooldown_ms: u64,

    /// Quiet period after a settlement before the next placement
    #[serde(default = "default_settle_quiet_ms")]
    pub settle_quiet_ms: u64,

    /// Open-contract poll interval (milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Strategy evaluation interval (milliseconds)
    #[serde(default = "default_eval_interval_ms")]
    pub eval_interval_ms: u64,

    /// Timeout applied to every market client call (seconds)
    #[serde(default = "default_order_timeout_secs")]
    pub order_timeout_secs: u64,

    /// Contract duration in ticks
    #[serde(default = "default_duration_ticks")]
    pub duration_ticks: u32,
}

fn default_single_cooldown_ms() -> u64 {
    3000
}
fn default_dual_cooldown_ms() -> u64 {
    1000
}
fn default_settle_quiet_ms() -> u64 {
    1000
}
fn default_poll_interval_ms() -> u64 {
    1000
}
fn default_eval_interval_ms() -> u64 {
    1000
}
fn default_order_timeout_secs() -> u64 {
    5
}
fn default_duration_ticks() -> u32 {
    5
}

impl Default for TradeConfig {
    fn default() -> Self {
        Self {
            single_cooldown_ms: default_single_cooldown_ms(),
            dual_cooldown_ms: default_dual_cooldown_ms(),
            settle_quiet_ms: default_settle_quiet_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            eval_interval_ms: default_eval_interval_ms(),
            order_timeout_secs: default_order_timeout_secs(),
            duration_ticks: default_duration_ticks(),
        }
    }
}

/// Market client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub mode: ClientMode,

    /// WebSocket endpoint for the live API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Application identifier appended to the endpoint
    #[serde(default = "default_app_id")]
    pub app_id: String,
}

/// Client mode: paper simulation or live API
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClientMode {
    #[default]
    Paper,
    Live,
}

fn default_endpoint() -> String {
    "wss://ws.derivws.com/websockets/v3".to_string()
}
fn default_app_id() -> String {
    "1089".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            mode: ClientMode::default(),
            endpoint: default_endpoint(),
            app_id: default_app_id(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_metrics_port() -> u16 {
    9090
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_port: default_metrics_port(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
