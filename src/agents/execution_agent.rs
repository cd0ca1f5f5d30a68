//! Pre-trade spread/liquidity/integrity gate consumed directly by the
//! execution router ahead of live dispatch (§4.7 step 6), plus the
//! standard per-tick signal evaluation.

use super::{AgentSignal, Severity};
use crate::models::{MarketState, Side};
use crate::store::Store;
use serde::{Deserialize, Serialize};

const MAX_SPREAD_BPS: f64 = 50.0;
const MIN_TOP_OF_BOOK_VOLUME: f64 = 100.0;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PreTradeCheck {
    pub allowed: bool,
    pub reasons: Vec<String>,
}

pub struct ExecutionAgent;

impl ExecutionAgent {
    pub fn new() -> Self {
        Self
    }

    /// Spread/liquidity/integrity gate run only in live mode ahead of
    /// dispatch to a live executor.
    pub fn pre_trade_check(&self, market: &str, _side: Side, _size: f64, _price: f64, store: &dyn Store) -> PreTradeCheck {
        let mut reasons = Vec::new();

        if let Some(microstructure) = store.get("microstructure:latest") {
            if let Some(spread_bps) = microstructure.get("cross_venue_spread_bps").and_then(|v| v.as_f64()) {
                if spread_bps.abs() > MAX_SPREAD_BPS {
                    reasons.push(format!("spread {spread_bps:.1}bps exceeds {MAX_SPREAD_BPS}bps gate"));
                }
            }
            if let Some(combined_volume) = microstructure.get("combined_volume").and_then(|v| v.as_f64()) {
                if combined_volume < MIN_TOP_OF_BOOK_VOLUME {
                    reasons.push(format!("combined top-of-book volume {combined_volume:.1} below minimum"));
                }
            }
        }

        if let Some(integrity) = store.get("price:integrity") {
            if integrity.get("status").and_then(|s| s.as_str()) == Some("WARNING") {
                reasons.push(format!("price integrity warning for {market}"));
            }
        }

        PreTradeCheck { allowed: reasons.is_empty(), reasons }
    }

    pub fn evaluate(&self, state: &MarketState, data_ts_used: chrono::DateTime<chrono::Utc>) -> Vec<AgentSignal> {
        let mut signals = Vec::new();
        if state.cross_venue_spread_bps.abs() > MAX_SPREAD_BPS {
            signals.push(AgentSignal::new(
                "ExecutionAgent",
                format!("cross-venue spread {:.1}bps is wide", state.cross_venue_spread_bps),
                Severity::Medium,
                (state.cross_venue_spread_bps.abs() / 100.0).clamp(0.0, 1.0),
                data_ts_used,
            ));
        }
        signals
    }
}

impl Default for ExecutionAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    #[test]
    fn passes_when_store_has_no_microstructure_data() {
        let agent = ExecutionAgent::new();
        let store = InMemoryStore::new();
        let check = agent.pre_trade_check("BTC-PERP", Side::Buy, 1.0, 100.0, &store);
        assert!(check.allowed);
    }

    #[test]
    fn blocks_on_wide_spread() {
        let agent = ExecutionAgent::new();
        let store = InMemoryStore::new();
        store.set("microstructure:latest", serde_json::json!({"cross_venue_spread_bps": 80.0}), None);
        let check = agent.pre_trade_check("BTC-PERP", Side::Buy, 1.0, 100.0, &store);
        assert!(!check.allowed);
    }

    #[test]
    fn blocks_on_integrity_warning() {
        let agent = ExecutionAgent::new();
        let store = InMemoryStore::new();
        store.set("price:integrity", serde_json::json!({"status": "WARNING"}), None);
        let check = agent.pre_trade_check("BTC-PERP", Side::Buy, 1.0, 100.0, &store);
        assert!(!check.allowed);
    }
}
