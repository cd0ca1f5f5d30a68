//! Venue-specific microstructure-edge and liquidity-thinning signals for
//! Hyperliquid perps.

use super::{AgentSignal, Severity};
use crate::models::MarketState;

const EDGE_IMBALANCE_THRESHOLD: f64 = 0.2;
const THIN_BOOK_VOLUME: f64 = 100.0;

pub struct HyperliquidAgent;

impl HyperliquidAgent {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, state: &MarketState, data_ts_used: chrono::DateTime<chrono::Utc>) -> Vec<AgentSignal> {
        let mut signals = Vec::new();

        if state.ob_imbalance > EDGE_IMBALANCE_THRESHOLD {
            signals.push(AgentSignal::new(
                "HyperliquidAgent",
                format!("bullish orderbook imbalance {:.2}", state.ob_imbalance),
                Severity::Low,
                state.ob_imbalance.clamp(0.0, 1.0),
                data_ts_used,
            ));
        } else if state.ob_imbalance < -EDGE_IMBALANCE_THRESHOLD {
            signals.push(AgentSignal::new(
                "HyperliquidAgent",
                format!("bearish orderbook imbalance {:.2}", state.ob_imbalance),
                Severity::Low,
                state.ob_imbalance.abs().clamp(0.0, 1.0),
                data_ts_used,
            ));
        }

        if let Some(combined_volume) = state.extra.get("hyperliquid_combined_volume").and_then(|v| v.as_f64()) {
            if combined_volume < THIN_BOOK_VOLUME {
                signals.push(AgentSignal::new(
                    "HyperliquidAgent",
                    format!("combined top-of-book volume {combined_volume:.1} is thin"),
                    Severity::Medium,
                    (1.0 - combined_volume / THIN_BOOK_VOLUME).clamp(0.0, 1.0),
                    data_ts_used,
                ));
            }
        }

        signals
    }
}

impl Default for HyperliquidAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calm_state_produces_no_signals() {
        let agent = HyperliquidAgent::new();
        let state = MarketState::default();
        assert!(agent.evaluate(&state, crate::time::now()).is_empty());
    }

    #[test]
    fn bullish_imbalance_is_flagged() {
        let agent = HyperliquidAgent::new();
        let mut state = MarketState::default();
        state.ob_imbalance = 0.35;
        let signals = agent.evaluate(&state, crate::time::now());
        assert!(signals.iter().any(|s| s.signal.contains("bullish")));
    }

    #[test]
    fn thin_book_is_flagged() {
        let agent = HyperliquidAgent::new();
        let mut state = MarketState::default();
        state.extra.insert("hyperliquid_combined_volume".to_string(), serde_json::json!(40.0));
        let signals = agent.evaluate(&state, crate::time::now());
        assert!(signals.iter().any(|s| s.signal.contains("thin")));
    }
}
