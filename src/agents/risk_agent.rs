//! Liquidation-distance warnings, a throttle recommendation on combined
//! shock+vol stress, and an aggregate margin-usage warning.

use super::{AgentSignal, Severity};
use crate::models::{MarketState, VolRegime};

/// Positions closer than this to their liquidation price (as a percent of
/// entry price) are flagged.
const LIQUIDATION_DISTANCE_WARNING_PCT: f64 = 10.0;
const MARGIN_USAGE_WARNING: f64 = 0.5;

pub struct RiskAgent;

impl RiskAgent {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, state: &MarketState, data_ts_used: chrono::DateTime<chrono::Utc>) -> Vec<AgentSignal> {
        let mut signals = Vec::new();

        for position in &state.positions {
            let Some(liq_price) = position.liq_price else { continue };
            if position.entry_price <= 0.0 {
                continue;
            }
            let distance_pct = (position.entry_price - liq_price).abs() / position.entry_price * 100.0;
            if distance_pct < LIQUIDATION_DISTANCE_WARNING_PCT {
                let severity = if distance_pct < LIQUIDATION_DISTANCE_WARNING_PCT / 2.0 { Severity::High } else { Severity::Medium };
                signals.push(
                    AgentSignal::new(
                        "RiskAgent",
                        format!("{}/{} within {:.2}% of liquidation", position.venue, position.market, distance_pct),
                        severity,
                        (1.0 - distance_pct / LIQUIDATION_DISTANCE_WARNING_PCT).clamp(0.0, 1.0),
                        data_ts_used,
                    )
                    .with_action("reduce_exposure"),
                );
            }
        }

        if state.shock_score > 1.5 && matches!(state.vol_regime, Some(VolRegime::High) | Some(VolRegime::Extreme)) {
            signals.push(
                AgentSignal::new(
                    "RiskAgent",
                    format!("shock_score {:.2} with elevated vol_regime", state.shock_score),
                    Severity::High,
                    0.8,
                    data_ts_used,
                )
                .with_action("enable_risk_throttle"),
            );
        }

        let total_margin: f64 = state.positions.iter().map(|p| p.margin).sum();
        let total_notional: f64 = state.positions.iter().map(|p| p.notional(p.entry_price)).sum::<f64>().max(1.0);
        let margin_usage = total_margin / total_notional;
        if margin_usage > MARGIN_USAGE_WARNING {
            signals.push(AgentSignal::new(
                "RiskAgent",
                format!("aggregate margin usage {:.0}% exceeds warning threshold", margin_usage * 100.0),
                Severity::Medium,
                margin_usage.clamp(0.0, 1.0),
                data_ts_used,
            ));
        }

        signals
    }
}

impl Default for RiskAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;

    fn position_near_liquidation() -> Position {
        Position {
            venue: "hyperliquid".to_string(),
            market: "BTC-PERP".to_string(),
            signed_size: 2.0,
            entry_price: 100.0,
            pnl: 0.0,
            margin: 50.0,
            liq_price: Some(95.0),
        }
    }

    #[test]
    fn flags_position_close_to_liquidation() {
        let agent = RiskAgent::new();
        let mut state = MarketState::default();
        state.positions.push(position_near_liquidation());
        let signals = agent.evaluate(&state, crate::time::now());
        assert!(signals.iter().any(|s| s.signal.contains("liquidation")));
    }

    #[test]
    fn recommends_throttle_on_shock_and_extreme_vol() {
        let agent = RiskAgent::new();
        let mut state = MarketState::default();
        state.shock_score = 2.0;
        state.vol_regime = Some(VolRegime::Extreme);
        let signals = agent.evaluate(&state, crate::time::now());
        assert!(signals.iter().any(|s| s.proposed_action.as_deref() == Some("enable_risk_throttle")));
    }

    #[test]
    fn calm_state_produces_no_signals() {
        let agent = RiskAgent::new();
        let state = MarketState::default();
        assert!(agent.evaluate(&state, crate::time::now()).is_empty());
    }
}
