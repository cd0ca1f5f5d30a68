//! Shared data model: wire types, the closed event-type enumeration, and
//! environment-derived configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Execution mode the whole system runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Paper,
    Live,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Paper => "paper",
            ExecutionMode::Live => "live",
        }
    }
}

/// A single priced observation for a symbol on a venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTick {
    pub symbol: String,
    pub venue: String,
    pub price: f64,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

/// A funding-rate observation. `funding_rate` is per-period (8h on the
/// venues this system models); annualization factor is 3*365.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingTick {
    pub venue: String,
    pub market: String,
    pub funding_rate: f64,
    pub timestamp: DateTime<Utc>,
}

/// A single orderbook level: (price, qty).
pub type BookLevel = (f64, f64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderbookSnap {
    pub venue: String,
    pub market: String,
    /// Descending by price.
    pub bids: Vec<BookLevel>,
    /// Ascending by price.
    pub asks: Vec<BookLevel>,
    pub timestamp: DateTime<Utc>,
}

impl OrderbookSnap {
    pub fn top_n_volume(&self, n: usize, side_bids: bool) -> f64 {
        let side = if side_bids { &self.bids } else { &self.asks };
        side.iter().take(n).map(|(_, qty)| qty).sum()
    }

    pub fn best_bid(&self) -> Option<f64> {
        self.bids.first().map(|(p, _)| *p)
    }

    pub fn best_ask(&self) -> Option<f64> {
        self.asks.first().map(|(p, _)| *p)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexTick {
    pub tariff_index: f64,
    pub shock_score: f64,
    pub rate_of_change: f64,
    pub components: HashMap<String, f64>,
    pub timestamp: DateTime<Utc>,
}

/// A position at (venue, market). `signed_size > 0` is long, `< 0` is
/// short, `== 0` means "no position" and must not be stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub venue: String,
    pub market: String,
    pub signed_size: f64,
    pub entry_price: f64,
    pub pnl: f64,
    pub margin: f64,
    pub liq_price: Option<f64>,
}

impl Position {
    pub fn key(&self) -> (String, String) {
        (self.venue.clone(), self.market.clone())
    }

    pub fn is_long(&self) -> bool {
        self.signed_size > 0.0
    }

    pub fn notional(&self, mark_price: f64) -> f64 {
        self.signed_size.abs() * mark_price
    }
}

/// The closed event-type enumeration. Names are wire-stable: `Serialize`
/// renders the exact SCREAMING_SNAKE_CASE string every producer/consumer
/// agrees on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    IndexUpdate,
    ShockSpike,
    DivergenceAlert,
    FundingRegimeFlip,
    RiskThrottleOn,
    RiskThrottleOff,
    RuleActionProposed,
    OrderSent,
    OrderFilled,
    SwapQuoted,
    SwapSent,
    Error,
    StableDepegAlert,
    StableVolumeSpike,
    StableFundingSpike,
    StableStressAlert,
    PegBreakProbUpdate,
    PredictionUpdate,
    PredictionConfidenceLow,
    MonteCarloRun,
    RiskVarBreach,
    MicrostructureSignal,
    DislocationAlert,
    CarryUpdate,
    CarryRegimeFlip,
    AgentSignal,
    AgentActionProposed,
    AgentBlocked,
    MacroTerminalUpdate,
    PriceDislocationAlert,
    PnlAttributionUpdate,
    RegimeMemoryUpdate,
    ExecutionMetricsUpdate,
    SlippageAnomalyAlert,
    SolanaCongestionWarning,
    JupiterRouteRisk,
    ExecutionThrottle,
    FundingArbOpportunity,
    FundingArbRegimeFlip,
    BasisUpdate,
    BasisOpportunity,
    BasisFeasibilityLow,
    LiquidityThinningWarning,
    StableFlowUpdate,
    AdaptiveWeightsUpdate,
    RegimeAnalogMatch,
    PortfolioProposal,
    LiquidationHeatmapUpdate,
    JupiterQuoteStale,
    JupiterSlippageSpike,
    HedgeProposal,
    HedgeRebalanceSuggested,
    HedgeThrottleRecommended,
    SandboxComparisonRun,
    ReplayCompleted,
    SlippageModelUpdate,
    SafeSizeWarning,
    HedgeRatioUpdate,
    StablecoinPlaybookTriggered,
    TradeBlockedStaleData,
    TradeDegradedData,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::IndexUpdate => "INDEX_UPDATE",
            EventType::ShockSpike => "SHOCK_SPIKE",
            EventType::DivergenceAlert => "DIVERGENCE_ALERT",
            EventType::FundingRegimeFlip => "FUNDING_REGIME_FLIP",
            EventType::RiskThrottleOn => "RISK_THROTTLE_ON",
            EventType::RiskThrottleOff => "RISK_THROTTLE_OFF",
            EventType::RuleActionProposed => "RULE_ACTION_PROPOSED",
            EventType::OrderSent => "ORDER_SENT",
            EventType::OrderFilled => "ORDER_FILLED",
            EventType::SwapQuoted => "SWAP_QUOTED",
            EventType::SwapSent => "SWAP_SENT",
            EventType::Error => "ERROR",
            EventType::StableDepegAlert => "STABLE_DEPEG_ALERT",
            EventType::StableVolumeSpike => "STABLE_VOLUME_SPIKE",
            EventType::StableFundingSpike => "STABLE_FUNDING_SPIKE",
            EventType::StableStressAlert => "STABLE_STRESS_ALERT",
            EventType::PegBreakProbUpdate => "PEG_BREAK_PROB_UPDATE",
            EventType::PredictionUpdate => "PREDICTION_UPDATE",
            EventType::PredictionConfidenceLow => "PREDICTION_CONFIDENCE_LOW",
            EventType::MonteCarloRun => "MONTE_CARLO_RUN",
            EventType::RiskVarBreach => "RISK_VAR_BREACH",
            EventType::MicrostructureSignal => "MICROSTRUCTURE_SIGNAL",
            EventType::DislocationAlert => "DISLOCATION_ALERT",
            EventType::CarryUpdate => "CARRY_UPDATE",
            EventType::CarryRegimeFlip => "CARRY_REGIME_FLIP",
            EventType::AgentSignal => "AGENT_SIGNAL",
            EventType::AgentActionProposed => "AGENT_ACTION_PROPOSED",
            EventType::AgentBlocked => "AGENT_BLOCKED",
            EventType::MacroTerminalUpdate => "MACRO_TERMINAL_UPDATE",
            EventType::PriceDislocationAlert => "PRICE_DISLOCATION_ALERT",
            EventType::PnlAttributionUpdate => "PNL_ATTRIBUTION_UPDATE",
            EventType::RegimeMemoryUpdate => "REGIME_MEMORY_UPDATE",
            EventType::ExecutionMetricsUpdate => "EXECUTION_METRICS_UPDATE",
            EventType::SlippageAnomalyAlert => "SLIPPAGE_ANOMALY_ALERT",
            EventType::SolanaCongestionWarning => "SOLANA_CONGESTION_WARNING",
            EventType::JupiterRouteRisk => "JUPITER_ROUTE_RISK",
            EventType::ExecutionThrottle => "EXECUTION_THROTTLE",
            EventType::FundingArbOpportunity => "FUNDING_ARB_OPPORTUNITY",
            EventType::FundingArbRegimeFlip => "FUNDING_ARB_REGIME_FLIP",
            EventType::BasisUpdate => "BASIS_UPDATE",
            EventType::BasisOpportunity => "BASIS_OPPORTUNITY",
            EventType::BasisFeasibilityLow => "BASIS_FEASIBILITY_LOW",
            EventType::LiquidityThinningWarning => "LIQUIDITY_THINNING_WARNING",
            EventType::StableFlowUpdate => "STABLE_FLOW_UPDATE",
            EventType::AdaptiveWeightsUpdate => "ADAPTIVE_WEIGHTS_UPDATE",
            EventType::RegimeAnalogMatch => "REGIME_ANALOG_MATCH",
            EventType::PortfolioProposal => "PORTFOLIO_PROPOSAL",
            EventType::LiquidationHeatmapUpdate => "LIQUIDATION_HEATMAP_UPDATE",
            EventType::JupiterQuoteStale => "JUPITER_QUOTE_STALE",
            EventType::JupiterSlippageSpike => "JUPITER_SLIPPAGE_SPIKE",
            EventType::HedgeProposal => "HEDGE_PROPOSAL",
            EventType::HedgeRebalanceSuggested => "HEDGE_REBALANCE_SUGGESTED",
            EventType::HedgeThrottleRecommended => "HEDGE_THROTTLE_RECOMMENDED",
            EventType::SandboxComparisonRun => "SANDBOX_COMPARISON_RUN",
            EventType::ReplayCompleted => "REPLAY_COMPLETED",
            EventType::SlippageModelUpdate => "SLIPPAGE_MODEL_UPDATE",
            EventType::SafeSizeWarning => "SAFE_SIZE_WARNING",
            EventType::HedgeRatioUpdate => "HEDGE_RATIO_UPDATE",
            EventType::StablecoinPlaybookTriggered => "STABLECOIN_PLAYBOOK_TRIGGERED",
            EventType::TradeBlockedStaleData => "TRADE_BLOCKED_STALE_DATA",
            EventType::TradeDegradedData => "TRADE_DEGRADED_DATA",
        }
    }
}

/// An append-only, uniquely-identified, monotonically-timestamped (per
/// source) event on the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub event_type: EventType,
    pub source: String,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn signed(&self, size: f64) -> f64 {
        match self {
            Side::Buy => size,
            Side::Sell => -size,
        }
    }
}

/// Data quality marker attached to a routed order when the router
/// proceeded on less-than-fresh inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataQuality {
    Ok,
    Degraded,
}

/// Volatility regime classification shared by several analytics modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolRegime {
    Low,
    Normal,
    High,
    Extreme,
}

/// Funding regime classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingRegime {
    Contango,
    Neutral,
    Backwardation,
}

/// Risk engine persistent state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskState {
    pub throttle_active: bool,
    pub throttle_reason: String,
    pub last_action_ts: DateTime<Utc>,
    pub daily_pnl: f64,
    pub daily_pnl_reset_date: String,
}

impl Default for RiskState {
    fn default() -> Self {
        Self {
            throttle_active: false,
            throttle_reason: String::new(),
            last_action_ts: DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
            daily_pnl: 0.0,
            daily_pnl_reset_date: crate::time::today_utc_date_string(),
        }
    }
}

/// Typed state record passed into analytics and agents in place of the
/// legacy source's dynamic mapping. Every field this spec enumerates is
/// present; `extra` preserves forward-compatible, not-yet-modeled inputs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketState {
    pub tariff_index: f64,
    pub tariff_rate_of_change: f64,
    pub shock_score: f64,
    pub vol_regime: Option<VolRegime>,
    pub funding_regime: Option<FundingRegime>,
    pub funding_regime_flipped: bool,
    pub divergence_alert_active: bool,
    pub carry_score: f64,
    pub cross_venue_spread_bps: f64,
    pub stablecoin_health_score: f64,
    pub ob_imbalance: f64,
    pub positions: Vec<Position>,
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Environment-derived configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub execution_mode: ExecutionMode,
    pub max_leverage: f64,
    pub max_margin_usage: f64,
    pub max_daily_loss: f64,
    pub cooldown_seconds: i64,
    pub wits_countries: Vec<String>,
    pub wits_products: Vec<String>,
    pub gdelt_keywords: Vec<String>,
    pub price_freshness_threshold_s: i64,
    pub price_integrity_block_live: bool,
    pub adaptive_weights: bool,
    pub log_level: String,
}

fn parse_csv_env(key: &str, default: &str) -> Vec<String> {
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let execution_mode = match std::env::var("EXECUTION_MODE").as_deref() {
            Ok("live") => ExecutionMode::Live,
            Ok("paper") => ExecutionMode::Paper,
            Ok(other) => {
                tracing::warn!(value = other, "unknown EXECUTION_MODE, downgrading to paper");
                ExecutionMode::Paper
            }
            Err(_) => ExecutionMode::Paper,
        };

        Self {
            database_url: std::env::var("DATABASE_URL").ok(),
            redis_url: std::env::var("REDIS_URL").ok(),
            execution_mode,
            max_leverage: parse_env("MAX_LEVERAGE", 3.0),
            max_margin_usage: parse_env("MAX_MARGIN_USAGE", 0.6),
            max_daily_loss: parse_env("MAX_DAILY_LOSS", 500.0),
            cooldown_seconds: parse_env("COOLDOWN_SECONDS", 300),
            wits_countries: parse_csv_env("WITS_COUNTRIES", "US,CN,EU"),
            wits_products: parse_csv_env("WITS_PRODUCTS", "steel,aluminum,semiconductors"),
            gdelt_keywords: parse_csv_env("GDELT_KEYWORDS", "tariff,sanctions,trade war"),
            price_freshness_threshold_s: parse_env("PRICE_FRESHNESS_THRESHOLD_S", 30),
            price_integrity_block_live: parse_env("PRICE_INTEGRITY_BLOCK_LIVE", true),
            adaptive_weights: parse_env("ADAPTIVE_WEIGHTS", false),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }
}
