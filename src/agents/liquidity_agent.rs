//! Stable depeg, extreme orderbook imbalance, and wide cross-venue spread
//! warnings. Depeg is read from `MarketState::extra["stablecoin_depeg_bps"]`
//! since the typed state carries a composite health score rather than the
//! raw bps figure (see `models::MarketState`'s forward-compatible `extra`).

use super::{AgentSignal, Severity};
use crate::models::MarketState;

const DEPEG_WARNING_BPS: f64 = 50.0;
const EXTREME_IMBALANCE: f64 = 0.5;
const WIDE_SPREAD_BPS: f64 = 50.0;

pub struct LiquidityAgent;

impl LiquidityAgent {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, state: &MarketState, data_ts_used: chrono::DateTime<chrono::Utc>) -> Vec<AgentSignal> {
        let mut signals = Vec::new();

        if let Some(depeg_bps) = state.extra.get("stablecoin_depeg_bps").and_then(|v| v.as_f64()) {
            if depeg_bps.abs() > DEPEG_WARNING_BPS {
                signals.push(
                    AgentSignal::new(
                        "LiquidityAgent",
                        format!("stablecoin depeg {depeg_bps:.1}bps exceeds warning threshold"),
                        Severity::High,
                        (depeg_bps.abs() / 200.0).clamp(0.0, 1.0),
                        data_ts_used,
                    )
                    .with_action("rotate_to_stables"),
                );
            }
        }

        if state.ob_imbalance.abs() > EXTREME_IMBALANCE {
            signals.push(AgentSignal::new(
                "LiquidityAgent",
                format!("orderbook imbalance {:.2} is extreme", state.ob_imbalance),
                Severity::Medium,
                state.ob_imbalance.abs().clamp(0.0, 1.0),
                data_ts_used,
            ));
        }

        if state.cross_venue_spread_bps.abs() > WIDE_SPREAD_BPS {
            signals.push(AgentSignal::new(
                "LiquidityAgent",
                format!("cross-venue spread {:.1}bps is wide", state.cross_venue_spread_bps),
                Severity::Medium,
                (state.cross_venue_spread_bps.abs() / 150.0).clamp(0.0, 1.0),
                data_ts_used,
            ));
        }

        signals
    }
}

impl Default for LiquidityAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calm_state_produces_no_signals() {
        let agent = LiquidityAgent::new();
        let state = MarketState::default();
        assert!(agent.evaluate(&state, crate::time::now()).is_empty());
    }

    #[test]
    fn depeg_in_extra_triggers_rotation_signal() {
        let agent = LiquidityAgent::new();
        let mut state = MarketState::default();
        state.extra.insert("stablecoin_depeg_bps".to_string(), serde_json::json!(75.0));
        let signals = agent.evaluate(&state, crate::time::now());
        assert!(signals.iter().any(|s| s.proposed_action.as_deref() == Some("rotate_to_stables")));
    }

    #[test]
    fn extreme_imbalance_triggers_warning() {
        let agent = LiquidityAgent::new();
        let mut state = MarketState::default();
        state.ob_imbalance = 0.7;
        let signals = agent.evaluate(&state, crate::time::now());
        assert_eq!(signals.len(), 1);
    }
}
