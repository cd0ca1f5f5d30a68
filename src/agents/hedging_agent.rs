//! Combines shock, vol, margin usage, stablecoin depeg, and funding
//! pressure into a bearish-vs-neutral hedge proposal with a target beta,
//! delta, suggested hedge legs, and urgency.

use super::{AgentSignal, Severity};
use crate::models::{FundingRegime, MarketState, VolRegime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HedgeStance {
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HedgeProposal {
    pub stance: HedgeStance,
    pub target_beta: f64,
    pub target_delta: f64,
    pub hedge_legs: Vec<String>,
    pub urgency: f64,
}

pub struct HedgingAgent;

impl HedgingAgent {
    pub fn new() -> Self {
        Self
    }

    fn score(&self, state: &MarketState) -> f64 {
        let mut score = 0.0;
        score += (state.shock_score / 3.0).clamp(0.0, 1.0) * 0.35;
        score += match state.vol_regime {
            Some(VolRegime::Extreme) => 0.25,
            Some(VolRegime::High) => 0.15,
            _ => 0.0,
        };
        let total_margin: f64 = state.positions.iter().map(|p| p.margin).sum();
        let total_notional: f64 = state.positions.iter().map(|p| p.notional(p.entry_price)).sum::<f64>().max(1.0);
        score += (total_margin / total_notional).clamp(0.0, 1.0) * 0.2;
        if let Some(depeg_bps) = state.extra.get("stablecoin_depeg_bps").and_then(|v| v.as_f64()) {
            score += (depeg_bps.abs() / 100.0).clamp(0.0, 1.0) * 0.1;
        }
        if matches!(state.funding_regime, Some(FundingRegime::Backwardation)) {
            score += 0.1;
        }
        score.clamp(0.0, 1.0)
    }

    pub fn propose(&self, state: &MarketState) -> HedgeProposal {
        let score = self.score(state);
        let stance = if score > 0.5 { HedgeStance::Bearish } else { HedgeStance::Neutral };

        let net_exposure: f64 = state.positions.iter().map(|p| p.signed_size * p.entry_price).sum();
        let (target_beta, target_delta) = match stance {
            HedgeStance::Bearish => (-0.5, -net_exposure * score),
            HedgeStance::Neutral => (0.0, 0.0),
        };

        let hedge_legs = if matches!(stance, HedgeStance::Bearish) {
            vec!["hl_perps_short".to_string(), "drift_perps_short".to_string()]
        } else {
            Vec::new()
        };

        HedgeProposal { stance, target_beta, target_delta, hedge_legs, urgency: score }
    }

    pub fn evaluate(&self, state: &MarketState, data_ts_used: chrono::DateTime<chrono::Utc>) -> Vec<AgentSignal> {
        let proposal = self.propose(state);
        if matches!(proposal.stance, HedgeStance::Neutral) {
            return Vec::new();
        }
        vec![AgentSignal::new(
            "HedgingAgent",
            format!("bearish hedge proposal, target_beta={:.2}", proposal.target_beta),
            if proposal.urgency > 0.75 { Severity::High } else { Severity::Medium },
            proposal.urgency,
            data_ts_used,
        )
        .with_action("hedge")]
    }
}

impl Default for HedgingAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calm_state_is_neutral() {
        let agent = HedgingAgent::new();
        let state = MarketState::default();
        let proposal = agent.propose(&state);
        assert_eq!(proposal.stance, HedgeStance::Neutral);
        assert!(proposal.hedge_legs.is_empty());
    }

    #[test]
    fn stressed_state_proposes_bearish_hedge() {
        let agent = HedgingAgent::new();
        let mut state = MarketState::default();
        state.shock_score = 3.0;
        state.vol_regime = Some(VolRegime::Extreme);
        state.funding_regime = Some(FundingRegime::Backwardation);
        state.extra.insert("stablecoin_depeg_bps".to_string(), serde_json::json!(60.0));
        let proposal = agent.propose(&state);
        assert_eq!(proposal.stance, HedgeStance::Bearish);
        assert!(!proposal.hedge_legs.is_empty());
    }
}
