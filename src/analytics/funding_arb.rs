//! Funding-rate arbitrage detector between Hyperliquid and Drift perps.
//! Tracks a ring of past spread observations to estimate how long the
//! current direction has persisted, feeding a confidence score.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

const RING_CAPACITY: usize = 500;
const NEUTRAL_THRESHOLD_BPS: f64 = 5.0;
const ANNUALIZATION_FACTOR: f64 = 3.0 * 365.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArbDirection {
    ShortHlLongDrift,
    LongHlShortDrift,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingArbResult {
    pub spread_bps: f64,
    pub direction: ArbDirection,
    pub persistence_minutes: f64,
    pub confidence: f64,
    pub annualized_carry_bps: f64,
    pub error: Option<String>,
}

impl Default for FundingArbResult {
    fn default() -> Self {
        Self {
            spread_bps: 0.0,
            direction: ArbDirection::None,
            persistence_minutes: 0.0,
            confidence: 0.0,
            annualized_carry_bps: 0.0,
            error: None,
        }
    }
}

pub struct FundingArbEngine {
    ring: Mutex<VecDeque<(DateTime<Utc>, f64)>>,
}

impl Default for FundingArbEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FundingArbEngine {
    pub fn new() -> Self {
        Self {
            ring: Mutex::new(VecDeque::with_capacity(RING_CAPACITY)),
        }
    }

    pub fn compute(&self, hl_funding: f64, drift_funding: f64) -> FundingArbResult {
        let now = crate::time::now();
        let spread_bps = (hl_funding - drift_funding) * 10_000.0;
        let direction = if spread_bps.abs() < NEUTRAL_THRESHOLD_BPS {
            ArbDirection::None
        } else if spread_bps > 0.0 {
            ArbDirection::ShortHlLongDrift
        } else {
            ArbDirection::LongHlShortDrift
        };

        let mut ring = self.ring.lock();
        if ring.len() >= RING_CAPACITY {
            ring.pop_front();
        }
        ring.push_back((now, spread_bps));

        let persistence_minutes = persistence_of(&ring, spread_bps, now);
        let confidence = (0.5 + (persistence_minutes / 60.0) * 0.3 + (spread_bps.abs() / 50.0) * 0.2)
            .clamp(0.0, 0.95);
        let annualized_carry_bps = spread_bps.abs() * ANNUALIZATION_FACTOR / 10_000.0;

        FundingArbResult {
            spread_bps,
            direction,
            persistence_minutes,
            confidence,
            annualized_carry_bps,
            error: None,
        }
    }
}

/// Minutes since the earliest ring entry whose sign matches `current`,
/// counting back from the newest entry until a sign break.
fn persistence_of(ring: &VecDeque<(DateTime<Utc>, f64)>, current: f64, now: DateTime<Utc>) -> f64 {
    if current == 0.0 {
        return 0.0;
    }
    let sign = current.signum();
    let mut earliest = now;
    for (ts, spread) in ring.iter().rev() {
        if spread.signum() != sign {
            break;
        }
        earliest = *ts;
    }
    (now - earliest).num_seconds() as f64 / 60.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn spec_scenario_3() {
        let engine = FundingArbEngine::new();
        let result = engine.compute(0.001, -0.001);
        assert_eq!(result.direction, ArbDirection::ShortHlLongDrift);
        assert_relative_eq!(result.spread_bps, 20.0, epsilon = 1e-9);
        assert!(result.confidence >= 0.5);
    }

    #[test]
    fn small_spread_has_no_signal() {
        let engine = FundingArbEngine::new();
        let result = engine.compute(0.0001, 0.0001);
        assert_eq!(result.direction, ArbDirection::None);
    }

    #[test]
    fn persistence_grows_with_repeated_same_direction_observations() {
        let engine = FundingArbEngine::new();
        let first = engine.compute(0.001, -0.001);
        // Same direction observed again "later" in the same process:
        // persistence should never go negative and should track the
        // earliest same-sign entry in the ring.
        let second = engine.compute(0.0015, -0.001);
        assert!(second.persistence_minutes >= first.persistence_minutes);
    }

    #[test]
    fn opposite_direction_resets_persistence() {
        let engine = FundingArbEngine::new();
        engine.compute(0.001, -0.001);
        let flipped = engine.compute(-0.001, 0.001);
        assert_eq!(flipped.direction, ArbDirection::LongHlShortDrift);
        assert_eq!(flipped.persistence_minutes, 0.0);
    }
}
