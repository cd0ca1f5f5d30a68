//! Adaptive weights: the blend of `{macro, carry, microstructure,
//! momentum}` signal families starts at 0.25 each and is nudged by the
//! current shock band, funding skew, vol regime, and tariff index, then
//! renormalized back to sum to one.

use crate::models::VolRegime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdaptiveWeights {
    pub macro_weight: f64,
    pub carry_weight: f64,
    pub microstructure_weight: f64,
    pub momentum_weight: f64,
}

impl AdaptiveWeights {
    fn as_array(&self) -> [f64; 4] {
        [self.macro_weight, self.carry_weight, self.microstructure_weight, self.momentum_weight]
    }

    fn from_array(values: [f64; 4]) -> Self {
        Self {
            macro_weight: values[0],
            carry_weight: values[1],
            microstructure_weight: values[2],
            momentum_weight: values[3],
        }
    }
}

pub fn compute(shock_score: f64, funding_skew_bps: f64, vol_regime: Option<VolRegime>, tariff_index: f64) -> AdaptiveWeights {
    let mut weights = [0.25_f64; 4];

    // index 0 = macro, 1 = carry, 2 = microstructure, 3 = momentum.
    if shock_score > 2.0 {
        weights[0] += 0.10;
    } else if shock_score > 1.0 {
        weights[0] += 0.05;
    }

    let funding_skew = funding_skew_bps.abs();
    if funding_skew > 20.0 {
        weights[1] += 0.10;
    } else if funding_skew > 10.0 {
        weights[1] += 0.05;
    }

    match vol_regime {
        Some(VolRegime::Extreme) => weights[2] += 0.10,
        Some(VolRegime::High) => weights[2] += 0.05,
        _ => {}
    }

    if tariff_index > 70.0 {
        weights[0] += 0.05;
    }

    for w in weights.iter_mut() {
        *w = w.max(0.01);
    }
    let sum: f64 = weights.iter().sum();
    for w in weights.iter_mut() {
        *w /= sum;
    }

    AdaptiveWeights::from_array(weights)
}
