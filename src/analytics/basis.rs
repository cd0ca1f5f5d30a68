//! Basis engine: HL-spot and Drift-spot basis in bps, annualized basis,
//! and net carry. Maintains a 200-entry ring of past observations so a
//! caller can track the carry regime across calls; the ring is guarded
//! by a `parking_lot::Mutex` per §5's "each ring must serialize
//! concurrent updates internally".

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

const RING_CAPACITY: usize = 200;
const ANNUALIZATION_FACTOR: f64 = 3.0 * 365.0;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BasisResult {
    pub hl_spot_basis_bps: f64,
    pub drift_spot_basis_bps: f64,
    pub annualized_basis_bps: f64,
    pub net_carry_bps: f64,
    pub error: Option<String>,
}

pub struct BasisEngine {
    ring: Mutex<VecDeque<f64>>,
}

impl Default for BasisEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl BasisEngine {
    pub fn new() -> Self {
        Self {
            ring: Mutex::new(VecDeque::with_capacity(RING_CAPACITY)),
        }
    }

    pub fn history(&self) -> Vec<f64> {
        self.ring.lock().iter().copied().collect()
    }

    pub fn compute(
        &self,
        hl_price: f64,
        drift_price: f64,
        spot_price: f64,
        hl_funding: f64,
        drift_funding: f64,
    ) -> BasisResult {
        if spot_price <= 0.0 {
            return BasisResult {
                error: Some("spot_price must be positive".to_string()),
                ..Default::default()
            };
        }

        let hl_spot_basis_bps = (hl_price - spot_price) / spot_price * 10_000.0;
        let drift_spot_basis_bps = (drift_price - spot_price) / spot_price * 10_000.0;
        let mean_basis_bps = (hl_spot_basis_bps + drift_spot_basis_bps) / 2.0;
        let annualized_basis_bps = mean_basis_bps * ANNUALIZATION_FACTOR;
        let net_carry_bps = annualized_basis_bps + (hl_funding - drift_funding) * 10_000.0;

        let mut ring = self.ring.lock();
        if ring.len() >= RING_CAPACITY {
            ring.pop_front();
        }
        ring.push_back(mean_basis_bps);

        BasisResult {
            hl_spot_basis_bps,
            drift_spot_basis_bps,
            annualized_basis_bps,
            net_carry_bps,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn spec_scenario_4() {
        let engine = BasisEngine::new();
        let result = engine.compute(100.5, 100.3, 100.0, 0.0001, -0.0001);
        assert_relative_eq!(result.hl_spot_basis_bps, 50.0, epsilon = 1e-9);
        assert_relative_eq!(result.drift_spot_basis_bps, 30.0, epsilon = 1e-9);
        assert_relative_eq!(result.annualized_basis_bps, 43_800.0, epsilon = 1e-6);
        assert_relative_eq!(result.net_carry_bps, 43_802.0, epsilon = 1e-6);
    }

    #[test]
    fn nonpositive_spot_is_a_well_formed_error() {
        let engine = BasisEngine::new();
        let result = engine.compute(100.0, 100.0, 0.0, 0.0, 0.0);
        assert!(result.error.is_some());
        assert_eq!(result.hl_spot_basis_bps, 0.0);
    }

    #[test]
    fn ring_accumulates_across_calls_and_evicts_past_capacity() {
        let engine = BasisEngine::new();
        for _ in 0..(RING_CAPACITY + 10) {
            engine.compute(101.0, 100.5, 100.0, 0.0, 0.0);
        }
        assert_eq!(engine.history().len(), RING_CAPACITY);
    }
}
