//! Agent layer: seven stateless evaluators, each consuming a snapshot-
//! derived market state and returning a sequence of typed `AGENT_SIGNAL`
//! signals (§4.8).

mod execution_agent;
mod hedging_agent;
mod hyperliquid_agent;
mod jupiter_agent;
mod liquidity_agent;
mod macro_agent;
mod risk_agent;

pub use execution_agent::ExecutionAgent;
pub use hedging_agent::HedgingAgent;
pub use hyperliquid_agent::HyperliquidAgent;
pub use jupiter_agent::{assess_congestion, CongestionReport, JupiterAgent};
pub use liquidity_agent::LiquidityAgent;
pub use macro_agent::MacroAgent;
pub use risk_agent::RiskAgent;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSignal {
    #[serde(rename = "type")]
    pub signal_type: &'static str,
    pub agent: &'static str,
    pub signal: String,
    pub severity: Severity,
    pub confidence: f64,
    pub data_ts_used: DateTime<Utc>,
    pub ts: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposed_action: Option<String>,
}

impl AgentSignal {
    pub fn new(agent: &'static str, signal: impl Into<String>, severity: Severity, confidence: f64, data_ts_used: DateTime<Utc>) -> Self {
        Self {
            signal_type: "AGENT_SIGNAL",
            agent,
            signal: signal.into(),
            severity,
            confidence: confidence.clamp(0.0, 1.0),
            data_ts_used,
            ts: crate::time::now(),
            proposed_action: None,
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.proposed_action = Some(action.into());
        self
    }
}
