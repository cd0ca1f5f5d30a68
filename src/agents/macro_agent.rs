//! Tariff momentum, news shock, and high-tariff-regime signals.

use super::{AgentSignal, Severity};
use crate::models::MarketState;

const HIGH_TARIFF_THRESHOLD: f64 = 70.0;
const MOMENTUM_THRESHOLD: f64 = 5.0;
const SHOCK_THRESHOLD: f64 = 2.0;

pub struct MacroAgent;

impl MacroAgent {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, state: &MarketState, data_ts_used: chrono::DateTime<chrono::Utc>) -> Vec<AgentSignal> {
        let mut signals = Vec::new();

        if state.tariff_rate_of_change.abs() > MOMENTUM_THRESHOLD {
            signals.push(AgentSignal::new(
                "MacroAgent",
                format!("tariff rate_of_change {:.2} exceeds momentum threshold", state.tariff_rate_of_change),
                Severity::Medium,
                (state.tariff_rate_of_change.abs() / 20.0).clamp(0.0, 1.0),
                data_ts_used,
            ));
        }

        if state.shock_score > SHOCK_THRESHOLD {
            signals.push(
                AgentSignal::new(
                    "MacroAgent",
                    format!("news shock_score {:.2} above threshold", state.shock_score),
                    Severity::High,
                    (state.shock_score / 4.0).clamp(0.0, 1.0),
                    data_ts_used,
                )
                .with_action("reduce_exposure"),
            );
        }

        if state.tariff_index > HIGH_TARIFF_THRESHOLD {
            signals.push(AgentSignal::new(
                "MacroAgent",
                format!("tariff_index {:.1} in high-tariff regime", state.tariff_index),
                Severity::Medium,
                (state.tariff_index / 100.0).clamp(0.0, 1.0),
                data_ts_used,
            ));
        }

        signals
    }
}

impl Default for MacroAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calm_state_produces_no_signals() {
        let agent = MacroAgent::new();
        let state = MarketState::default();
        assert!(agent.evaluate(&state, crate::time::now()).is_empty());
    }

    #[test]
    fn high_tariff_and_shock_both_fire() {
        let agent = MacroAgent::new();
        let mut state = MarketState::default();
        state.tariff_index = 80.0;
        state.shock_score = 3.0;
        let signals = agent.evaluate(&state, crate::time::now());
        assert_eq!(signals.len(), 2);
    }
}
