//! Macro predictor: a logistic regression over seven weighted market
//! features producing a short-horizon up/down probability with
//! per-feature contributions for explainability.

use crate::models::{FundingRegime, VolRegime};
use crate::numeric::sigmoid;
use serde::{Deserialize, Serialize};

/// Seven input features, already on the scales documented per field.
#[derive(Debug, Clone, Default)]
pub struct MacroFeatures {
    /// Tariff rate-of-change, percent (same units as `IndexTick::rate_of_change`).
    pub tariff_momentum: f64,
    /// Shock score (z-scored or raw per the shock module).
    pub shock: f64,
    pub funding_regime: Option<FundingRegime>,
    pub vol_regime: Option<VolRegime>,
    pub cross_venue_spread_bps: f64,
    /// 0-100 stablecoin health score (100 = perfectly healthy).
    pub stablecoin_health_score: f64,
    /// Orderbook imbalance in `[-1, 1]`.
    pub ob_imbalance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FeatureContribution {
    pub feature: String,
    pub weight: f64,
    pub normalized_value: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MacroPrediction {
    pub prob_up_next_4h: f64,
    pub prob_down: f64,
    pub confidence: f64,
    pub contributions: Vec<FeatureContribution>,
    pub error: Option<String>,
}

/// Feature weights. Sum to 1.0, mirroring the spec's "weights sum to 1".
const W_TARIFF: f64 = 0.20;
const W_SHOCK: f64 = 0.20;
const W_FUNDING: f64 = 0.15;
const W_VOL: f64 = 0.15;
const W_SPREAD: f64 = 0.10;
const W_STABLE: f64 = 0.10;
const W_IMBALANCE: f64 = 0.10;

fn funding_signal(regime: Option<FundingRegime>) -> f64 {
    match regime {
        Some(FundingRegime::Backwardation) => 1.0,
        Some(FundingRegime::Neutral) => 0.0,
        Some(FundingRegime::Contango) => -1.0,
        None => 0.0,
    }
}

fn vol_signal(regime: Option<VolRegime>) -> f64 {
    match regime {
        Some(VolRegime::Low) => 0.5,
        Some(VolRegime::Normal) => 0.0,
        Some(VolRegime::High) => -0.5,
        Some(VolRegime::Extreme) => -1.0,
        None => 0.0,
    }
}

pub fn predict(features: &MacroFeatures) -> MacroPrediction {
    // Tariff momentum and shock are mean-reverting risk-off signals when
    // large: a hot tariff escalation or news shock tilts the logit down.
    let tariff_norm = (-features.tariff_momentum / 10.0).clamp(-1.0, 1.0);
    let shock_norm = (-features.shock / 2.0).clamp(-1.0, 1.0);
    let funding_norm = funding_signal(features.funding_regime);
    let vol_norm = vol_signal(features.vol_regime);
    let spread_norm = (-features.cross_venue_spread_bps / 50.0).clamp(-1.0, 1.0);
    let stable_norm = ((features.stablecoin_health_score - 50.0) / 50.0).clamp(-1.0, 1.0);
    let imbalance_norm = features.ob_imbalance.clamp(-1.0, 1.0);

    let terms = [
        ("tariff_momentum", W_TARIFF, tariff_norm),
        ("shock", W_SHOCK, shock_norm),
        ("funding_regime", W_FUNDING, funding_norm),
        ("vol_regime", W_VOL, vol_norm),
        ("cross_venue_spread", W_SPREAD, spread_norm),
        ("stablecoin_health", W_STABLE, stable_norm),
        ("ob_imbalance", W_IMBALANCE, imbalance_norm),
    ];

    let mut contributions = Vec::with_capacity(terms.len());
    let mut logit = 0.0;
    for (name, weight, value) in terms {
        let contribution = weight * value;
        logit += contribution;
        contributions.push(FeatureContribution {
            feature: name.to_string(),
            weight,
            normalized_value: value,
            contribution,
        });
    }

    let prob_up = sigmoid(logit * 4.0);
    let prob_down = 1.0 - prob_up;
    let confidence = 2.0 * (prob_up - 0.5).abs();

    MacroPrediction {
        prob_up_next_4h: prob_up,
        prob_down,
        confidence,
        contributions,
        error: None,
    }
}
