//! Stable flow momentum: synthesizes a risk-on/risk-off read from average
//! stablecoin peg deviation, stablecoin dominance of total market cap,
//! USDC's share of stablecoin volume, and the acceleration of the
//! composite score versus its prior value.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

const RISK_OFF_THRESHOLD: f64 = 0.6;
const RISK_ON_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowRegime {
    RiskOn,
    RiskOff,
    Neutral,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StableFlowResult {
    pub composite_score: f64,
    pub dominance: f64,
    pub usdc_share: f64,
    pub momentum: f64,
    pub regime: Option<FlowRegime>,
    pub error: Option<String>,
}

#[derive(Default)]
pub struct StableFlowEngine {
    prior_composite: Mutex<Option<f64>>,
}

impl StableFlowEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compute(
        &self,
        avg_peg_deviation_bps: f64,
        stable_volume: f64,
        total_market_cap: f64,
        usdc_volume: f64,
    ) -> StableFlowResult {
        if total_market_cap <= 0.0 || stable_volume < 0.0 {
            return StableFlowResult {
                error: Some("total_market_cap must be positive".to_string()),
                ..Default::default()
            };
        }

        let dominance = (stable_volume / total_market_cap).clamp(0.0, 1.0);
        let usdc_share = if stable_volume > 0.0 {
            (usdc_volume / stable_volume).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let peg_stress_norm = (avg_peg_deviation_bps / 50.0).clamp(0.0, 1.0);

        // Stablecoin dominance rising and peg under stress both read as
        // capital rotating defensively; a high USDC share dampens the
        // read since USDC is the deepest, most liquid stable.
        let raw_composite =
            0.5 * dominance + 0.3 * peg_stress_norm + 0.2 * (1.0 - usdc_share);

        let mut prior = self.prior_composite.lock();
        let momentum = raw_composite - prior.unwrap_or(raw_composite);
        *prior = Some(raw_composite);
        drop(prior);

        let composite_score = (raw_composite + momentum.clamp(-0.2, 0.2)).clamp(0.0, 1.0);
        let regime = if composite_score > RISK_OFF_THRESHOLD {
            FlowRegime::RiskOff
        } else if composite_score < RISK_ON_THRESHOLD {
            FlowRegime::RiskOn
        } else {
            FlowRegime::Neutral
        };

        StableFlowResult {
            composite_score,
            dominance,
            usdc_share,
            momentum,
            regime: Some(regime),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_dominance_low_stress_reads_risk_on() {
        let engine = StableFlowEngine::new();
        let result = engine.compute(2.0, 1_000_000.0, 100_000_000.0, 800_000.0);
        assert_eq!(result.regime, Some(FlowRegime::RiskOn));
    }

    #[test]
    fn high_dominance_high_stress_reads_risk_off() {
        let engine = StableFlowEngine::new();
        let result = engine.compute(60.0, 60_000_000.0, 100_000_000.0, 10_000_000.0);
        assert_eq!(result.regime, Some(FlowRegime::RiskOff));
    }

    #[test]
    fn zero_total_market_cap_is_a_well_formed_error() {
        let engine = StableFlowEngine::new();
        let result = engine.compute(1.0, 1.0, 0.0, 1.0);
        assert!(result.error.is_some());
    }

    #[test]
    fn momentum_is_zero_on_first_observation() {
        let engine = StableFlowEngine::new();
        let result = engine.compute(5.0, 5_000_000.0, 100_000_000.0, 3_000_000.0);
        assert_eq!(result.momentum, 0.0);
    }

    #[test]
    fn momentum_tracks_change_between_calls() {
        let engine = StableFlowEngine::new();
        engine.compute(5.0, 5_000_000.0, 100_000_000.0, 3_000_000.0);
        let second = engine.compute(40.0, 50_000_000.0, 100_000_000.0, 5_000_000.0);
        assert!(second.momentum > 0.0);
    }
}
