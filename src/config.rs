//! Configuration types for poly-oracle

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub voting: VotingConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Configuration errors. Any of these aborts startup.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("rule '{rule}' has non-positive weight {weight}")]
    NonPositiveWeight { rule: &'static str, weight: f64 },
    #[error("rule '{rule}' has invalid threshold/scale ({threshold} / {full_scale})")]
    InvalidRuleScale {
        rule: &'static str,
        threshold: f64,
        full_scale: f64,
    },
    #[error("short CVD window ({short}s) must be shorter than long window ({long}s)")]
    InvertedWindows { short: u64, long: u64 },
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
    #[error("MACD fast period ({fast}) must be below slow period ({slow})")]
    InvalidMacd { fast: usize, slow: usize },
    #[error("{name} = {value} is outside [0, 1]")]
    OutOfUnitRange { name: &'static str, value: String },
    #[error("price tiers must be nested inside (0, 1): {0}")]
    InvalidPriceTiers(String),
    #[error("min_remaining_secs ({min}) must be below max_remaining_secs ({max})")]
    InvertedExpiry { min: i64, max: i64 },
    #[error("caution_crossings ({caution}) must not exceed max_crossings ({max})")]
    InvalidCrossings { caution: u32, max: u32 },
}

/// Market data feed configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Reference instrument, e.g. "btcusdt"
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default = "default_ws_base_url")]
    pub ws_base_url: String,
    #[serde(default = "default_rest_base_url")]
    pub rest_base_url: String,
    /// First reconnect delay (milliseconds)
    #[serde(default = "default_initial_reconnect_ms")]
    pub initial_reconnect_ms: u64,
    /// Backoff ceiling (milliseconds)
    #[serde(default = "default_max_reconnect_ms")]
    pub max_reconnect_ms: u64,
    /// 0 = retry forever
    #[serde(default)]
    pub max_reconnect_attempts: u32,
    /// How often candles are re-fetched for the trend labels
    #[serde(default = "default_kline_refresh_secs")]
    pub kline_refresh_secs: u64,
    #[serde(default = "default_kline_limit")]
    pub kline_limit: u32,
}

fn default_symbol() -> String {
    "btcusdt".to_string()
}
fn default_ws_base_url() -> String {
    "wss://stream.binance.com:9443/ws".to_string()
}
fn default_rest_base_url() -> String {
    "https://api.binance.com".to_string()
}
fn default_initial_reconnect_ms() -> u64 {
    1_000
}
fn default_max_reconnect_ms() -> u64 {
    30_000
}
fn default_kline_refresh_secs() -> u64 {
    60
}
fn default_kline_limit() -> u32 {
    200
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            ws_base_url: default_ws_base_url(),
            rest_base_url: default_rest_base_url(),
            initial_reconnect_ms: default_initial_reconnect_ms(),
            max_reconnect_ms: default_max_reconnect_ms(),
            max_reconnect_attempts: 0,
            kline_refresh_secs: default_kline_refresh_secs(),
            kline_limit: default_kline_limit(),
        }
    }
}

/// Unit used for signed trade volume
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeltaUnit {
    /// `size * sign`
    Base,
    /// `price * size * sign` (notional)
    #[default]
    Quote,
}

/// Streaming aggregator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    #[serde(default = "default_cvd_short_secs")]
    pub cvd_short_secs: u64,
    #[serde(default = "default_cvd_long_secs")]
    pub cvd_long_secs: u64,
    #[serde(default)]
    pub delta_unit: DeltaUnit,
    /// Ticks older than the newest accepted tick by more than this are dropped
    #[serde(default = "default_late_tolerance_ms")]
    pub late_tolerance_ms: i64,
    /// Append the long CVD to its history every N accepted trades
    #[serde(default = "default_cvd_history_every")]
    pub cvd_history_every: u64,
    #[serde(default = "default_cvd_history_len")]
    pub cvd_history_len: usize,
    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,
    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,
    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,
    #[serde(default = "default_zscore_window")]
    pub zscore_window: usize,
    /// Depth updates averaged for the imbalance metric
    #[serde(default = "default_wall_smoothing")]
    pub wall_smoothing: usize,
    /// Momentum ring capacity (samples)
    #[serde(default = "default_momentum_capacity")]
    pub momentum_capacity: usize,
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,
    #[serde(default = "default_publish_interval_ms")]
    pub publish_interval_ms: u64,
    /// Snapshots older than this are treated as absent
    #[serde(default = "default_freshness_secs")]
    pub freshness_secs: i64,
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
    #[serde(default = "default_ut_bot_key")]
    pub ut_bot_key: f64,
    #[serde(default = "default_ut_bot_atr_period")]
    pub ut_bot_atr_period: usize,
    #[serde(default = "default_hull_length")]
    pub hull_length: usize,
    #[serde(default = "default_trend_ema_period")]
    pub trend_ema_period: usize,
    #[serde(default = "default_trend_min_candles")]
    pub trend_min_candles: usize,
}

fn default_cvd_short_secs() -> u64 {
    60
}
fn default_cvd_long_secs() -> u64 {
    300
}
fn default_late_tolerance_ms() -> i64 {
    2_000
}
fn default_cvd_history_every() -> u64 {
    10
}
fn default_cvd_history_len() -> usize {
    100
}
fn default_macd_fast() -> usize {
    12
}
fn default_macd_slow() -> usize {
    26
}
fn default_macd_signal() -> usize {
    9
}
fn default_zscore_window() -> usize {
    20
}
fn default_wall_smoothing() -> usize {
    10
}
fn default_momentum_capacity() -> usize {
    600
}
fn default_sample_interval_ms() -> u64 {
    1_000
}
fn default_publish_interval_ms() -> u64 {
    1_000
}
fn default_freshness_secs() -> i64 {
    60
}
fn default_snapshot_path() -> PathBuf {
    PathBuf::from("oracle_snapshot.json")
}
fn default_ut_bot_key() -> f64 {
    1.5
}
fn default_ut_bot_atr_period() -> usize {
    10
}
fn default_hull_length() -> usize {
    20
}
fn default_trend_ema_period() -> usize {
    20
}
fn default_trend_min_candles() -> usize {
    50
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            cvd_short_secs: default_cvd_short_secs(),
            cvd_long_secs: default_cvd_long_secs(),
            delta_unit: DeltaUnit::Quote,
            late_tolerance_ms: default_late_tolerance_ms(),
            cvd_history_every: default_cvd_history_every(),
            cvd_history_len: default_cvd_history_len(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            zscore_window: default_zscore_window(),
            wall_smoothing: default_wall_smoothing(),
            momentum_capacity: default_momentum_capacity(),
            sample_interval_ms: default_sample_interval_ms(),
            publish_interval_ms: default_publish_interval_ms(),
            freshness_secs: default_freshness_secs(),
            snapshot_path: default_snapshot_path(),
            ut_bot_key: default_ut_bot_key(),
            ut_bot_atr_period: default_ut_bot_atr_period(),
            hull_length: default_hull_length(),
            trend_ema_period: default_trend_ema_period(),
            trend_min_candles: default_trend_min_candles(),
        }
    }
}

/// Activation threshold, confidence scale and weight of one magnitude rule.
///
/// The rule abstains below `threshold`; confidence is `|value| / full_scale`,
/// capped at `RulesConfig::max_confidence`.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct RuleParams {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub threshold: f64,
    pub full_scale: f64,
    pub weight: f64,
}

impl RuleParams {
    pub const fn new(threshold: f64, full_scale: f64, weight: f64) -> Self {
        Self {
            enabled: true,
            threshold,
            full_scale,
            weight,
        }
    }
}

/// A magnitude rule that looks back over the last `lookback` price samples
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct LookbackRuleParams {
    #[serde(flatten)]
    pub params: RuleParams,
    pub lookback: usize,
}

/// RSI extremes rule
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct RsiRuleParams {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_rsi_period")]
    pub period: usize,
    #[serde(default = "default_overbought")]
    pub overbought: f64,
    #[serde(default = "default_oversold")]
    pub oversold: f64,
    #[serde(default = "default_unit_weight")]
    pub weight: f64,
}

fn default_rsi_period() -> usize {
    14
}
fn default_overbought() -> f64 {
    60.0
}
fn default_oversold() -> f64 {
    40.0
}
fn default_unit_weight() -> f64 {
    1.0
}

impl Default for RsiRuleParams {
    fn default() -> Self {
        Self {
            enabled: true,
            period: default_rsi_period(),
            overbought: default_overbought(),
            oversold: default_oversold(),
            weight: default_unit_weight(),
        }
    }
}

/// Coarse trend confirmation rule
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct TrendRuleParams {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_trend_confidence")]
    pub confidence: f64,
    #[serde(default = "default_unit_weight")]
    pub weight: f64,
}

fn default_trend_confidence() -> f64 {
    0.70
}

impl Default for TrendRuleParams {
    fn default() -> Self {
        Self {
            enabled: true,
            confidence: default_trend_confidence(),
            weight: default_unit_weight(),
        }
    }
}

/// Rule set configuration. Every rule carries its own threshold and weight.
#[derive(Debug, Clone, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "default_max_confidence")]
    pub max_confidence: f64,
    #[serde(default = "default_momentum_30s")]
    pub momentum_30s: RuleParams,
    #[serde(default = "default_momentum_60s")]
    pub momentum_60s: RuleParams,
    #[serde(default = "default_momentum_120s")]
    pub momentum_120s: RuleParams,
    #[serde(default = "default_price_momentum")]
    pub price_momentum: LookbackRuleParams,
    #[serde(default = "default_trend_strength")]
    pub trend_strength: LookbackRuleParams,
    #[serde(default)]
    pub rsi: RsiRuleParams,
    #[serde(default = "default_vwap")]
    pub vwap: RuleParams,
    #[serde(default = "default_cvd_long")]
    pub cvd_long: RuleParams,
    #[serde(default = "default_cvd_short")]
    pub cvd_short: RuleParams,
    #[serde(default = "default_delta_zscore")]
    pub delta_zscore: RuleParams,
    #[serde(default = "default_wall_imbalance")]
    pub wall_imbalance: RuleParams,
    #[serde(default)]
    pub trend: TrendRuleParams,
}

fn default_true() -> bool {
    true
}
fn default_max_confidence() -> f64 {
    0.99
}
fn default_momentum_30s() -> RuleParams {
    RuleParams::new(0.2, 3.0, 0.8)
}
fn default_momentum_60s() -> RuleParams {
    RuleParams::new(0.2, 3.0, 0.9)
}
fn default_momentum_120s() -> RuleParams {
    RuleParams::new(0.2, 3.0, 1.0)
}
fn default_price_momentum() -> LookbackRuleParams {
    LookbackRuleParams {
        params: RuleParams::new(1.0, 5.0, 1.0),
        lookback: 10,
    }
}
fn default_trend_strength() -> LookbackRuleParams {
    LookbackRuleParams {
        params: RuleParams::new(0.5, 3.0, 1.0),
        lookback: 3,
    }
}
fn default_vwap() -> RuleParams {
    RuleParams::new(0.5, 2.0, 1.0)
}
fn default_cvd_long() -> RuleParams {
    RuleParams::new(50_000.0, 150_000.0, 3.0)
}
fn default_cvd_short() -> RuleParams {
    RuleParams::new(20_000.0, 50_000.0, 1.5)
}
fn default_delta_zscore() -> RuleParams {
    RuleParams::new(2.0, 4.0, 1.0)
}
fn default_wall_imbalance() -> RuleParams {
    RuleParams::new(0.3, 1.0, 1.0)
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            max_confidence: default_max_confidence(),
            momentum_30s: default_momentum_30s(),
            momentum_60s: default_momentum_60s(),
            momentum_120s: default_momentum_120s(),
            price_momentum: default_price_momentum(),
            trend_strength: default_trend_strength(),
            rsi: RsiRuleParams::default(),
            vwap: default_vwap(),
            cvd_long: default_cvd_long(),
            cvd_short: default_cvd_short(),
            delta_zscore: default_delta_zscore(),
            wall_imbalance: default_wall_imbalance(),
            trend: TrendRuleParams::default(),
        }
    }
}

/// Vote aggregation thresholds
#[derive(Debug, Clone, Deserialize)]
pub struct VotingConfig {
    #[serde(default = "default_min_votes")]
    pub min_votes: usize,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    /// Bound on the contract price history ring
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_min_votes() -> usize {
    3
}
fn default_min_confidence() -> f64 {
    0.60
}
fn default_history_capacity() -> usize {
    200
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            min_votes: default_min_votes(),
            min_confidence: default_min_confidence(),
            history_capacity: default_history_capacity(),
        }
    }
}

/// Session-memory prior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Parquet file of recorded sessions; absent means an empty store
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    /// Only the most recent K sessions are scanned
    #[serde(default = "default_memory_lookback")]
    pub lookback: usize,
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
    /// Maximum L1 distance between bucket tuples for a match
    #[serde(default = "default_max_distance")]
    pub max_distance: u32,
    /// Length of one contract window (seconds)
    #[serde(default = "default_window_secs")]
    pub window_secs: i64,
    /// Confidence adjustment per unit of bias
    #[serde(default = "default_prior_weight")]
    pub prior_weight: f64,
    #[serde(default = "default_max_adjustment")]
    pub max_adjustment: f64,
}

fn default_memory_lookback() -> usize {
    200
}
fn default_min_samples() -> usize {
    30
}
fn default_max_distance() -> u32 {
    1
}
fn default_window_secs() -> i64 {
    900
}
fn default_prior_weight() -> f64 {
    0.10
}
fn default_max_adjustment() -> f64 {
    0.10
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            store_path: None,
            lookback: default_memory_lookback(),
            min_samples: default_min_samples(),
            max_distance: default_max_distance(),
            window_secs: default_window_secs(),
            prior_weight: default_prior_weight(),
            max_adjustment: default_max_adjustment(),
        }
    }
}

/// Risk gate configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Veto when less time than this remains before the deadline
    #[serde(default = "default_min_remaining_secs")]
    pub min_remaining_secs: i64,
    /// Early-window limit; `None` disables the check
    #[serde(default = "default_max_remaining_secs")]
    pub max_remaining_secs: Option<i64>,
    /// Multiplier applied above `max_remaining_secs`; `None` vetoes instead
    #[serde(default = "default_early_multiplier")]
    pub early_multiplier: Option<Decimal>,

    #[serde(default = "default_max_crossings")]
    pub max_crossings: u32,
    #[serde(default = "default_caution_crossings")]
    pub caution_crossings: u32,
    #[serde(default = "default_caution_multiplier")]
    pub caution_multiplier: Decimal,
    /// Confirming long-window CVD that lets a choppy window through
    #[serde(default = "default_chop_override_cvd")]
    pub chop_override_cvd: f64,

    #[serde(default = "default_optimal_low")]
    pub optimal_low: Decimal,
    #[serde(default = "default_optimal_high")]
    pub optimal_high: Decimal,
    #[serde(default = "default_fair_low")]
    pub fair_low: Decimal,
    #[serde(default = "default_fair_high")]
    pub fair_high: Decimal,
    #[serde(default = "default_fair_multiplier")]
    pub fair_multiplier: Decimal,
    #[serde(default = "default_edge_low")]
    pub edge_low: Decimal,
    #[serde(default = "default_edge_high")]
    pub edge_high: Decimal,
    #[serde(default = "default_edge_multiplier")]
    pub edge_multiplier: Decimal,

    #[serde(default = "default_strong_disagreement_cvd")]
    pub strong_disagreement_cvd: f64,
    #[serde(default = "default_strong_disagreement_multiplier")]
    pub strong_disagreement_multiplier: Decimal,
    #[serde(default = "default_disagreement_cvd")]
    pub disagreement_cvd: f64,
    #[serde(default = "default_disagreement_multiplier")]
    pub disagreement_multiplier: Decimal,
    /// Used when no fresh snapshot is available to confirm the direction
    #[serde(default = "default_missing_snapshot_multiplier")]
    pub missing_snapshot_multiplier: Decimal,

    #[serde(default = "default_baseline")]
    pub baseline: Decimal,
    #[serde(default = "default_near_distance")]
    pub near_distance: Decimal,
    #[serde(default = "default_near_multiplier")]
    pub near_multiplier: Decimal,
    #[serde(default = "default_mid_distance")]
    pub mid_distance: Decimal,
    #[serde(default = "default_mid_multiplier")]
    pub mid_multiplier: Decimal,
}

fn default_min_remaining_secs() -> i64 {
    180
}
fn default_max_remaining_secs() -> Option<i64> {
    Some(540)
}
fn default_early_multiplier() -> Option<Decimal> {
    Some(dec!(0.5))
}
fn default_max_crossings() -> u32 {
    5
}
fn default_caution_crossings() -> u32 {
    4
}
fn default_caution_multiplier() -> Decimal {
    dec!(0.5)
}
fn default_chop_override_cvd() -> f64 {
    150_000.0
}
fn default_optimal_low() -> Decimal {
    dec!(0.35)
}
fn default_optimal_high() -> Decimal {
    dec!(0.65)
}
fn default_fair_low() -> Decimal {
    dec!(0.25)
}
fn default_fair_high() -> Decimal {
    dec!(0.75)
}
fn default_fair_multiplier() -> Decimal {
    dec!(0.6)
}
fn default_edge_low() -> Decimal {
    dec!(0.15)
}
fn default_edge_high() -> Decimal {
    dec!(0.85)
}
fn default_edge_multiplier() -> Decimal {
    dec!(0.3)
}
fn default_strong_disagreement_cvd() -> f64 {
    100_000.0
}
fn default_strong_disagreement_multiplier() -> Decimal {
    dec!(0.3)
}
fn default_disagreement_cvd() -> f64 {
    50_000.0
}
fn default_disagreement_multiplier() -> Decimal {
    dec!(0.6)
}
fn default_missing_snapshot_multiplier() -> Decimal {
    dec!(0.5)
}
fn default_baseline() -> Decimal {
    dec!(0.5)
}
fn default_near_distance() -> Decimal {
    dec!(0.05)
}
fn default_near_multiplier() -> Decimal {
    dec!(0.5)
}
fn default_mid_distance() -> Decimal {
    dec!(0.10)
}
fn default_mid_multiplier() -> Decimal {
    dec!(0.7)
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            min_remaining_secs: default_min_remaining_secs(),
            max_remaining_secs: default_max_remaining_secs(),
            early_multiplier: default_early_multiplier(),
            max_crossings: default_max_crossings(),
            caution_crossings: default_caution_crossings(),
            caution_multiplier: default_caution_multiplier(),
            chop_override_cvd: default_chop_override_cvd(),
            optimal_low: default_optimal_low(),
            optimal_high: default_optimal_high(),
            fair_low: default_fair_low(),
            fair_high: default_fair_high(),
            fair_multiplier: default_fair_multiplier(),
            edge_low: default_edge_low(),
            edge_high: default_edge_high(),
            edge_multiplier: default_edge_multiplier(),
            strong_disagreement_cvd: default_strong_disagreement_cvd(),
            strong_disagreement_multiplier: default_strong_disagreement_multiplier(),
            disagreement_cvd: default_disagreement_cvd(),
            disagreement_multiplier: default_disagreement_multiplier(),
            missing_snapshot_multiplier: default_missing_snapshot_multiplier(),
            baseline: default_baseline(),
            near_distance: default_near_distance(),
            near_multiplier: default_near_multiplier(),
            mid_distance: default_mid_distance(),
            mid_multiplier: default_mid_multiplier(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format
    #[default]
    Pretty,
    /// JSON format for log aggregation
    Json,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub metrics_enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
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
            metrics_enabled: false,
            metrics_port: default_metrics_port(),
            log_level: default_log_level(),
            log_format: LogFormat::Pretty,
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

    /// Reject configurations the runtime cannot honor
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.oracle.validate()?;
        self.rules.validate()?;
        self.voting.validate()?;
        self.memory.validate()?;
        self.risk.validate()?;
        Ok(())
    }
}

impl OracleConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.cvd_short_secs == 0 {
            return Err(ConfigError::ZeroInterval("oracle.cvd_short_secs"));
        }
        if self.cvd_short_secs >= self.cvd_long_secs {
            return Err(ConfigError::InvertedWindows {
                short: self.cvd_short_secs,
                long: self.cvd_long_secs,
            });
        }
        if self.macd_fast == 0 || self.macd_fast >= self.macd_slow {
            return Err(ConfigError::InvalidMacd {
                fast: self.macd_fast,
                slow: self.macd_slow,
            });
        }
        let intervals = [
            ("oracle.sample_interval_ms", self.sample_interval_ms),
            ("oracle.publish_interval_ms", self.publish_interval_ms),
            ("oracle.cvd_history_every", self.cvd_history_every),
            ("oracle.macd_signal", self.macd_signal as u64),
            ("oracle.wall_smoothing", self.wall_smoothing as u64),
            ("oracle.momentum_capacity", self.momentum_capacity as u64),
            ("oracle.hull_length", self.hull_length as u64),
            ("oracle.ut_bot_atr_period", self.ut_bot_atr_period as u64),
            ("oracle.trend_ema_period", self.trend_ema_period as u64),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(ConfigError::ZeroInterval(name));
            }
        }
        // Sample standard deviation needs two points
        if self.zscore_window < 2 {
            return Err(ConfigError::ZeroInterval("oracle.zscore_window"));
        }
        if self.freshness_secs <= 0 {
            return Err(ConfigError::ZeroInterval("oracle.freshness_secs"));
        }
        if self.late_tolerance_ms < 0 {
            return Err(ConfigError::ZeroInterval("oracle.late_tolerance_ms"));
        }
        Ok(())
    }
}

impl RulesConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        check_unit("rules.max_confidence", self.max_confidence)?;

        let magnitude_rules = [
            ("momentum_30s", self.momentum_30s),
            ("momentum_60s", self.momentum_60s),
            ("momentum_120s", self.momentum_120s),
            ("price_momentum", self.price_momentum.params),
            ("trend_strength", self.trend_strength.params),
            ("vwap", self.vwap),
            ("cvd_long", self.cvd_long),
            ("cvd_short", self.cvd_short),
            ("delta_zscore", self.delta_zscore),
            ("wall_imbalance", self.wall_imbalance),
        ];
        for (rule, params) in magnitude_rules {
            check_weight(rule, params.weight)?;
            if params.threshold < 0.0 || params.full_scale <= 0.0 {
                return Err(ConfigError::InvalidRuleScale {
                    rule,
                    threshold: params.threshold,
                    full_scale: params.full_scale,
                });
            }
        }
        if self.price_momentum.lookback < 2 {
            return Err(ConfigError::ZeroInterval("rules.price_momentum.lookback"));
        }
        if self.trend_strength.lookback < 2 {
            return Err(ConfigError::ZeroInterval("rules.trend_strength.lookback"));
        }

        check_weight("rsi", self.rsi.weight)?;
        if self.rsi.period == 0 {
            return Err(ConfigError::ZeroInterval("rules.rsi.period"));
        }
        if !(0.0..=100.0).contains(&self.rsi.oversold)
            || !(0.0..=100.0).contains(&self.rsi.overbought)
            || self.rsi.oversold >= self.rsi.overbought
        {
            return Err(ConfigError::InvalidRuleScale {
                rule: "rsi",
                threshold: self.rsi.oversold,
                full_scale: self.rsi.overbought,
            });
        }

        check_weight("trend", self.trend.weight)?;
        check_unit("rules.trend.confidence", self.trend.confidence)?;
        Ok(())
    }
}

impl VotingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_votes == 0 {
            return Err(ConfigError::ZeroInterval("voting.min_votes"));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::ZeroInterval("voting.history_capacity"));
        }
        check_unit("voting.min_confidence", self.min_confidence)
    }
}

impl MemoryConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_samples == 0 {
            return Err(ConfigError::ZeroInterval("memory.min_samples"));
        }
        if self.lookback == 0 {
            return Err(ConfigError::ZeroInterval("memory.lookback"));
        }
        if self.window_secs <= 0 {
            return Err(ConfigError::ZeroInterval("memory.window_secs"));
        }
        check_unit("memory.prior_weight", self.prior_weight)?;
        check_unit("memory.max_adjustment", self.max_adjustment)
    }
}

impl RiskConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_remaining_secs < 0 {
            return Err(ConfigError::ZeroInterval("risk.min_remaining_secs"));
        }
        if let Some(max) = self.max_remaining_secs {
            if self.min_remaining_secs >= max {
                return Err(ConfigError::InvertedExpiry {
                    min: self.min_remaining_secs,
                    max,
                });
            }
        }
        if self.max_crossings == 0 {
            return Err(ConfigError::ZeroInterval("risk.max_crossings"));
        }
        if self.caution_crossings > self.max_crossings {
            return Err(ConfigError::InvalidCrossings {
                caution: self.caution_crossings,
                max: self.max_crossings,
            });
        }

        let tiers = [
            self.edge_low,
            self.fair_low,
            self.optimal_low,
            self.optimal_high,
            self.fair_high,
            self.edge_high,
        ];
        let ordered = tiers.windows(2).all(|w| w[0] <= w[1]);
        if !ordered || tiers[0] <= Decimal::ZERO || tiers[5] >= Decimal::ONE {
            return Err(ConfigError::InvalidPriceTiers(format!(
                "{} <= {} <= {} <= {} <= {} <= {}",
                tiers[0], tiers[1], tiers[2], tiers[3], tiers[4], tiers[5]
            )));
        }

        let multipliers = [
            ("risk.early_multiplier", self.early_multiplier.unwrap_or(Decimal::ONE)),
            ("risk.caution_multiplier", self.caution_multiplier),
            ("risk.fair_multiplier", self.fair_multiplier),
            ("risk.edge_multiplier", self.edge_multiplier),
            (
                "risk.strong_disagreement_multiplier",
                self.strong_disagreement_multiplier,
            ),
            ("risk.disagreement_multiplier", self.disagreement_multiplier),
            (
                "risk.missing_snapshot_multiplier",
                self.missing_snapshot_multiplier,
            ),
            ("risk.near_multiplier", self.near_multiplier),
            ("risk.mid_multiplier", self.mid_multiplier),
            ("risk.baseline", self.baseline),
        ];
        for (name, value) in multipliers {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(ConfigError::OutOfUnitRange {
                    name,
                    value: value.to_string(),
                });
            }
        }
        if self.near_distance > self.mid_distance {
            return Err(ConfigError::InvalidPriceTiers(format!(
                "near_distance {} > mid_distance {}",
                self.near_distance, self.mid_distance
            )));
        }
        Ok(())
    }
}

fn check_weight(rule: &'static str, weight: f64) -> Result<(), ConfigError> {
    if weight.is_finite() && weight > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositiveWeight { rule, weight })
    }
}

fn check_unit(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange {
            name,
            value: value.to_string(),
        })
    }
}
