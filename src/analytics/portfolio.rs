//! Portfolio optimizer: risk parity, mean-variance, and scaled-Kelly
//! allocation methods across four asset classes, post-processed with a
//! macro-regime tilt and stable-rotation bias, then clamped to per-class
//! floors/caps and renormalized to sum to one.

use crate::analytics::stable_flow::FlowRegime;
use serde::{Deserialize, Serialize};

/// Fixed asset-class order used by every weight array in this module.
pub const CLASSES: [&str; 4] = ["hl_perps", "drift_perps", "spot_jupiter", "stablecoins"];
const FLOORS: [f64; 4] = [0.0, 0.0, 0.0, 0.05];
const CAPS: [f64; 4] = [0.5, 0.5, 0.5, 0.8];
/// Quarter-Kelly, matching the host project's fractional-Kelly pattern.
const KELLY_FRACTION: f64 = 0.25;
/// Mean-variance risk-aversion coefficient.
const MV_LAMBDA: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizerMethod {
    RiskParity,
    MeanVariance,
    ScaledKelly,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AssetStat {
    pub expected_return: f64,
    pub volatility: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PortfolioResult {
    pub weights: Vec<(String, f64)>,
    pub method: Option<String>,
    pub error: Option<String>,
}

pub fn optimize(
    method: OptimizerMethod,
    assets: &[AssetStat; 4],
    macro_prob_up: f64,
    stable_regime: Option<FlowRegime>,
    risk_scale: f64,
) -> PortfolioResult {
    if assets.iter().any(|a| a.volatility < 0.0) {
        return PortfolioResult {
            error: Some("volatility must be non-negative".to_string()),
            ..Default::default()
        };
    }

    let raw = match method {
        OptimizerMethod::RiskParity => risk_parity(assets),
        OptimizerMethod::MeanVariance => mean_variance(assets),
        OptimizerMethod::ScaledKelly => scaled_kelly(assets),
    };

    let tilted = apply_macro_tilt(raw, macro_prob_up);
    let rotated = apply_stable_rotation(tilted, stable_regime);
    let scaled = apply_risk_limit(rotated, risk_scale.clamp(0.0, 1.0));
    let bounded = normalize_with_bounds(scaled, FLOORS, CAPS);

    let method_name = match method {
        OptimizerMethod::RiskParity => "risk_parity",
        OptimizerMethod::MeanVariance => "mean_variance",
        OptimizerMethod::ScaledKelly => "scaled_kelly",
    };

    PortfolioResult {
        weights: CLASSES
            .iter()
            .zip(bounded.iter())
            .map(|(name, w)| (name.to_string(), *w))
            .collect(),
        method: Some(method_name.to_string()),
        error: None,
    }
}

fn normalize_sum(weights: [f64; 4]) -> [f64; 4] {
    let sum: f64 = weights.iter().sum();
    if sum <= 1e-12 {
        return [0.0, 0.0, 0.0, 1.0];
    }
    weights.map(|w| w / sum)
}

fn risk_parity(assets: &[AssetStat; 4]) -> [f64; 4] {
    let inv_vol = assets.map(|a| 1.0 / a.volatility.max(1e-6));
    normalize_sum(inv_vol)
}

fn mean_variance(assets: &[AssetStat; 4]) -> [f64; 4] {
    let scores =
        assets.map(|a| (a.expected_return - 0.5 * MV_LAMBDA * a.volatility * a.volatility).max(0.0));
    if scores.iter().sum::<f64>() <= 1e-12 {
        return [0.25; 4];
    }
    normalize_sum(scores)
}

fn scaled_kelly(assets: &[AssetStat; 4]) -> [f64; 4] {
    let kelly = assets.map(|a| {
        let var = (a.volatility * a.volatility).max(1e-6);
        (a.expected_return / var).max(0.0) * KELLY_FRACTION
    });
    if kelly.iter().sum::<f64>() <= 1e-12 {
        return [0.25; 4];
    }
    normalize_sum(kelly)
}

/// Bullish macro tilts weight toward the perp legs; bearish tilts toward
/// stablecoins. `prob_up` in `[0, 1]`, `0.5` is a no-op.
fn apply_macro_tilt(mut weights: [f64; 4], prob_up: f64) -> [f64; 4] {
    let tilt = (prob_up.clamp(0.0, 1.0) - 0.5) * 0.4;
    weights[0] *= 1.0 + tilt;
    weights[1] *= 1.0 + tilt;
    weights[3] *= 1.0 - tilt;
    weights
}

fn apply_stable_rotation(mut weights: [f64; 4], regime: Option<FlowRegime>) -> [f64; 4] {
    match regime {
        Some(FlowRegime::RiskOff) => {
            weights[3] *= 1.5;
        }
        Some(FlowRegime::RiskOn) => {
            weights[3] *= 0.75;
        }
        _ => {}
    }
    weights
}

fn apply_risk_limit(mut weights: [f64; 4], risk_scale: f64) -> [f64; 4] {
    for w in weights.iter_mut().take(3) {
        *w *= risk_scale;
    }
    weights
}

/// Clamps to per-class floors/caps and redistributes the residual across
/// classes with headroom until the allocation sums to one (or bound
/// saturation makes further redistribution impossible).
fn normalize_with_bounds(mut weights: [f64; 4], floors: [f64; 4], caps: [f64; 4]) -> [f64; 4] {
    for i in 0..4 {
        weights[i] = weights[i].max(0.0);
    }
    let sum: f64 = weights.iter().sum();
    if sum > 1e-12 {
        for w in weights.iter_mut() {
            *w /= sum;
        }
    } else {
        weights = [0.25; 4];
    }
    for i in 0..4 {
        weights[i] = weights[i].clamp(floors[i], caps[i]);
    }

    for _ in 0..50 {
        let sum: f64 = weights.iter().sum();
        let diff = 1.0 - sum;
        if diff.abs() < 1e-9 {
            break;
        }
        if diff > 0.0 {
            let headroom: Vec<f64> = weights.iter().zip(caps.iter()).map(|(w, c)| (c - w).max(0.0)).collect();
            let total: f64 = headroom.iter().sum();
            if total <= 1e-12 {
                break;
            }
            for i in 0..4 {
                weights[i] += diff * headroom[i] / total;
            }
        } else {
            let room: Vec<f64> = weights.iter().zip(floors.iter()).map(|(w, f)| (w - f).max(0.0)).collect();
            let total: f64 = room.iter().sum();
            if total <= 1e-12 {
                break;
            }
            for i in 0..4 {
                weights[i] += diff * room[i] / total;
            }
        }
        for i in 0..4 {
            weights[i] = weights[i].clamp(floors[i], caps[i]);
        }
    }
    weights
}
