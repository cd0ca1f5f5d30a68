//! Stablecoin health: peg deviation, a bucketed status, a stress score
//! combining depeg/volume/spread, and a peg-break probability driven by
//! a z-scored depeg history (or a simple ramp when history is thin).

use crate::numeric;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

const RING_CAPACITY: usize = 200;
const OK_THRESHOLD_BPS: f64 = 20.0;
const WARNING_THRESHOLD_BPS: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PegStatus {
    Ok,
    Warning,
    Alert,
}

impl PegStatus {
    fn from_depeg_bps(depeg_bps: f64) -> Self {
        if depeg_bps <= OK_THRESHOLD_BPS {
            PegStatus::Ok
        } else if depeg_bps <= WARNING_THRESHOLD_BPS {
            PegStatus::Warning
        } else {
            PegStatus::Alert
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StablecoinHealthResult {
    pub depeg_bps: f64,
    pub status: Option<PegStatus>,
    pub stress_score: f64,
    pub peg_break_probability: f64,
    pub error: Option<String>,
}

pub struct StablecoinHealthEngine {
    depeg_history: Mutex<VecDeque<f64>>,
    volume_history: Mutex<VecDeque<f64>>,
}

impl Default for StablecoinHealthEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StablecoinHealthEngine {
    pub fn new() -> Self {
        Self {
            depeg_history: Mutex::new(VecDeque::with_capacity(RING_CAPACITY)),
            volume_history: Mutex::new(VecDeque::with_capacity(RING_CAPACITY)),
        }
    }

    pub fn compute(&self, price: f64, peg: f64, volume: f64, spread_bps: f64) -> StablecoinHealthResult {
        if peg <= 0.0 {
            return StablecoinHealthResult {
                error: Some("peg must be positive".to_string()),
                ..Default::default()
            };
        }

        let depeg_bps = (price - peg).abs() / peg * 10_000.0;
        let status = PegStatus::from_depeg_bps(depeg_bps);

        let mut depeg_ring = self.depeg_history.lock();
        let depeg_history_snapshot: Vec<f64> = depeg_ring.iter().copied().collect();
        if depeg_ring.len() >= RING_CAPACITY {
            depeg_ring.pop_front();
        }
        depeg_ring.push_back(depeg_bps);
        drop(depeg_ring);

        let mut volume_ring = self.volume_history.lock();
        let volume_history_snapshot: Vec<f64> = volume_ring.iter().copied().collect();
        if volume_ring.len() >= RING_CAPACITY {
            volume_ring.pop_front();
        }
        volume_ring.push_back(volume);
        drop(volume_ring);

        let depeg_norm = (depeg_bps / 100.0).clamp(0.0, 1.0);
        let volume_z = numeric::z_score(volume, &volume_history_snapshot).unwrap_or(0.0);
        let volume_component = (volume_z / 3.0).clamp(0.0, 1.0);
        let spread_norm = (spread_bps / 50.0).clamp(0.0, 1.0);
        let stress_score = (0.5 * depeg_norm + 0.3 * volume_component + 0.2 * spread_norm).clamp(0.0, 1.0);

        let peg_break_probability = match numeric::z_score(depeg_bps, &depeg_history_snapshot) {
            Some(z) => numeric::sigmoid(z),
            None => (depeg_bps / WARNING_THRESHOLD_BPS).clamp(0.0, 1.0),
        };

        StablecoinHealthResult {
            depeg_bps,
            status: Some(status),
            stress_score,
            peg_break_probability,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn depeg_boundary_exactly_twenty_bps_is_ok() {
        let engine = StablecoinHealthEngine::new();
        // 0.002 * 10_000 = 20.0 bps exactly.
        let result = engine.compute(1.0 - 0.0002, 1.0, 1_000_000.0, 1.0);
        assert_relative_eq!(result.depeg_bps, 20.0, epsilon = 1e-6);
        assert_eq!(result.status, Some(PegStatus::Ok));
    }

    #[test]
    fn depeg_just_above_twenty_bps_is_warning() {
        let engine = StablecoinHealthEngine::new();
        let result = engine.compute(1.0 - 0.00021, 1.0, 1_000_000.0, 1.0);
        assert_eq!(result.status, Some(PegStatus::Warning));
    }

    #[test]
    fn depeg_just_above_fifty_bps_is_alert() {
        let engine = StablecoinHealthEngine::new();
        let result = engine.compute(1.0 - 0.00051, 1.0, 1_000_000.0, 1.0);
        assert_eq!(result.status, Some(PegStatus::Alert));
    }

    #[test]
    fn nonpositive_peg_is_a_well_formed_error() {
        let engine = StablecoinHealthEngine::new();
        let result = engine.compute(1.0, 0.0, 1.0, 1.0);
        assert!(result.error.is_some());
    }

    #[test]
    fn thin_history_falls_back_to_ramp() {
        let engine = StablecoinHealthEngine::new();
        let result = engine.compute(0.99, 1.0, 1_000_000.0, 2.0);
        assert!(result.peg_break_probability > 0.0);
        assert!(result.peg_break_probability <= 1.0);
    }
}
