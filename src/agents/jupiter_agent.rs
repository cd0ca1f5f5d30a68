//! Solana/Jupiter swap-routing signals: quote staleness, route
//! complexity, price impact, and Solana congestion via the shared
//! `assess_congestion` thresholds.

use super::{AgentSignal, Severity};
use crate::models::MarketState;
use serde::{Deserialize, Serialize};

const CONGESTED_RPC_MS: f64 = 1500.0;
const CONGESTED_SLOT_DELTA: f64 = 10.0;
const QUOTE_STALE_S: i64 = 15;
const HIGH_PRICE_IMPACT_BPS: f64 = 100.0;
const COMPLEX_ROUTE_HOPS: u64 = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CongestionReport {
    pub congested: bool,
    pub high_severity: bool,
}

/// Shared congestion gate reused by any venue adapter that rides Solana:
/// congested when RPC latency or slot delta breach their thresholds;
/// high severity when BOTH breach simultaneously.
pub fn assess_congestion(rpc_latency_ms: f64, slot_delta: f64) -> CongestionReport {
    let rpc_congested = rpc_latency_ms >= CONGESTED_RPC_MS;
    let slot_congested = slot_delta >= CONGESTED_SLOT_DELTA;
    CongestionReport {
        congested: rpc_congested || slot_congested,
        high_severity: rpc_congested && slot_congested,
    }
}

pub struct JupiterAgent;

impl JupiterAgent {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, state: &MarketState, data_ts_used: chrono::DateTime<chrono::Utc>) -> Vec<AgentSignal> {
        let mut signals = Vec::new();

        if let Some(quote_age_s) = state.extra.get("jupiter_quote_age_s").and_then(|v| v.as_i64()) {
            if quote_age_s > QUOTE_STALE_S {
                signals.push(AgentSignal::new(
                    "JupiterAgent",
                    format!("swap quote is {quote_age_s}s old"),
                    Severity::Medium,
                    (quote_age_s as f64 / 60.0).clamp(0.0, 1.0),
                    data_ts_used,
                ));
            }
        }

        if let Some(hops) = state.extra.get("jupiter_route_hops").and_then(|v| v.as_u64()) {
            if hops >= COMPLEX_ROUTE_HOPS {
                signals.push(AgentSignal::new(
                    "JupiterAgent",
                    format!("swap route has {hops} hops"),
                    Severity::Low,
                    (hops as f64 / 6.0).clamp(0.0, 1.0),
                    data_ts_used,
                ));
            }
        }

        if let Some(price_impact_bps) = state.extra.get("jupiter_price_impact_bps").and_then(|v| v.as_f64()) {
            if price_impact_bps > HIGH_PRICE_IMPACT_BPS {
                signals.push(AgentSignal::new(
                    "JupiterAgent",
                    format!("swap price impact {price_impact_bps:.1}bps is high"),
                    Severity::High,
                    (price_impact_bps / 500.0).clamp(0.0, 1.0),
                    data_ts_used,
                ));
            }
        }

        if let (Some(rpc_latency_ms), Some(slot_delta)) = (
            state.extra.get("solana_rpc_latency_ms").and_then(|v| v.as_f64()),
            state.extra.get("solana_slot_delta").and_then(|v| v.as_f64()),
        ) {
            let report = assess_congestion(rpc_latency_ms, slot_delta);
            if report.congested {
                signals.push(AgentSignal::new(
                    "JupiterAgent",
                    format!("solana congestion: rpc_latency_ms={rpc_latency_ms:.0} slot_delta={slot_delta:.0}"),
                    if report.high_severity { Severity::High } else { Severity::Medium },
                    if report.high_severity { 0.9 } else { 0.6 },
                    data_ts_used,
                ));
            }
        }

        signals
    }
}

impl Default for JupiterAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn congestion_requires_either_threshold() {
        assert!(!assess_congestion(500.0, 2.0).congested);
        assert!(assess_congestion(1600.0, 2.0).congested);
        assert!(assess_congestion(500.0, 12.0).congested);
    }

    #[test]
    fn congestion_is_high_severity_only_when_both_breach() {
        assert!(!assess_congestion(1600.0, 2.0).high_severity);
        assert!(assess_congestion(1600.0, 12.0).high_severity);
    }

    #[test]
    fn calm_state_produces_no_signals() {
        let agent = JupiterAgent::new();
        let state = MarketState::default();
        assert!(agent.evaluate(&state, crate::time::now()).is_empty());
    }

    #[test]
    fn stale_quote_is_flagged() {
        let agent = JupiterAgent::new();
        let mut state = MarketState::default();
        state.extra.insert("jupiter_quote_age_s".to_string(), serde_json::json!(30));
        let signals = agent.evaluate(&state, crate::time::now());
        assert_eq!(signals.len(), 1);
    }
}
