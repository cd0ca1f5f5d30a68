//! Regime memory: an append-only ring of past regime observations (shock
//! bucket, funding regime, vol regime, tariff index, price, forward
//! returns) used to find historical analogues of the current regime and
//! report their outcome distribution.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::models::{FundingRegime, VolRegime};

const RING_CAPACITY: usize = 500;
const SHOCK_WEIGHT: u32 = 3;
const FUNDING_WEIGHT: u32 = 2;
const VOL_WEIGHT: u32 = 1;
const ANALOGUE_MIN_SCORE: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShockState {
    Calm,
    Elevated,
    Spike,
}

impl ShockState {
    pub fn from_score(score: f64) -> Self {
        if score > 2.0 {
            ShockState::Spike
        } else if score > 1.0 {
            ShockState::Elevated
        } else {
            ShockState::Calm
        }
    }
}

/// The regime descriptor used both to record a ring entry and to query
/// for analogues.
#[derive(Debug, Clone, Copy)]
pub struct RegimeState {
    pub shock_state: ShockState,
    pub funding_regime: Option<FundingRegime>,
    pub vol_regime: Option<VolRegime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeEntry {
    pub shock_state: ShockState,
    pub funding_regime: Option<FundingRegime>,
    pub vol_regime: Option<VolRegime>,
    pub tariff_index: f64,
    pub price: f64,
    pub forward_return_4h: Option<f64>,
    pub forward_return_24h: Option<f64>,
    pub forward_return_3d: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analogue {
    pub entry: RegimeEntry,
    pub score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutcomeDistribution {
    pub sample_size: usize,
    pub avg_return_4h: f64,
    pub avg_return_24h: f64,
    pub avg_return_3d: f64,
    pub win_rate_4h: f64,
    pub win_rate_24h: f64,
    pub win_rate_3d: f64,
    pub best_analogue: Option<RegimeEntry>,
}

#[derive(Default)]
pub struct RegimeMemory {
    ring: Mutex<VecDeque<RegimeEntry>>,
}

impl RegimeMemory {
    pub fn new() -> Self {
        Self {
            ring: Mutex::new(VecDeque::with_capacity(RING_CAPACITY)),
        }
    }

    pub fn record(&self, entry: RegimeEntry) {
        let mut ring = self.ring.lock();
        if ring.len() >= RING_CAPACITY {
            ring.pop_front();
        }
        ring.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.ring.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.lock().is_empty()
    }

    fn score(query: &RegimeState, entry: &RegimeEntry) -> u32 {
        let mut score = 0;
        if entry.shock_state == query.shock_state {
            score += SHOCK_WEIGHT;
        }
        if entry.funding_regime == query.funding_regime {
            score += FUNDING_WEIGHT;
        }
        if entry.vol_regime == query.vol_regime {
            score += VOL_WEIGHT;
        }
        score
    }

    pub fn find_analogues(&self, query: &RegimeState) -> Vec<Analogue> {
        self.ring
            .lock()
            .iter()
            .map(|entry| Analogue {
                entry: entry.clone(),
                score: Self::score(query, entry),
            })
            .filter(|a| a.score >= ANALOGUE_MIN_SCORE)
            .collect()
    }

    pub fn outcome_distribution(&self, query: &RegimeState) -> OutcomeDistribution {
        let analogues = self.find_analogues(query);
        if analogues.is_empty() {
            return OutcomeDistribution::default();
        }

        let returns_4h: Vec<f64> = analogues.iter().filter_map(|a| a.entry.forward_return_4h).collect();
        let returns_24h: Vec<f64> = analogues.iter().filter_map(|a| a.entry.forward_return_24h).collect();
        let returns_3d: Vec<f64> = analogues.iter().filter_map(|a| a.entry.forward_return_3d).collect();

        let avg = |xs: &[f64]| if xs.is_empty() { 0.0 } else { xs.iter().sum::<f64>() / xs.len() as f64 };
        let win_rate = |xs: &[f64]| {
            if xs.is_empty() {
                0.0
            } else {
                xs.iter().filter(|r| **r > 0.0).count() as f64 / xs.len() as f64
            }
        };

        let best = analogues
            .iter()
            .max_by_key(|a| a.score)
            .map(|a| a.entry.clone());

        OutcomeDistribution {
            sample_size: analogues.len(),
            avg_return_4h: avg(&returns_4h),
            avg_return_24h: avg(&returns_24h),
            avg_return_3d: avg(&returns_3d),
            win_rate_4h: win_rate(&returns_4h),
            win_rate_24h: win_rate(&returns_24h),
            win_rate_3d: win_rate(&returns_3d),
            best_analogue: best,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(shock: ShockState, funding: FundingRegime, vol: VolRegime, ret_4h: f64) -> RegimeEntry {
        RegimeEntry {
            shock_state: shock,
            funding_regime: Some(funding),
            vol_regime: Some(vol),
            tariff_index: 50.0,
            price: 100.0,
            forward_return_4h: Some(ret_4h),
            forward_return_24h: Some(ret_4h * 2.0),
            forward_return_3d: Some(ret_4h * 3.0),
            timestamp: crate::time::now(),
        }
    }

    #[test]
    fn exact_match_scores_above_threshold() {
        let memory = RegimeMemory::new();
        memory.record(entry(ShockState::Spike, FundingRegime::Backwardation, VolRegime::High, 0.02));
        let query = RegimeState {
            shock_state: ShockState::Spike,
            funding_regime: Some(FundingRegime::Backwardation),
            vol_regime: Some(VolRegime::High),
        };
        let analogues = memory.find_analogues(&query);
        assert_eq!(analogues.len(), 1);
        assert_eq!(analogues[0].score, 6);
    }

    #[test]
    fn shock_only_match_meets_minimum_score() {
        let memory = RegimeMemory::new();
        memory.record(entry(ShockState::Spike, FundingRegime::Contango, VolRegime::Low, -0.01));
        let query = RegimeState {
            shock_state: ShockState::Spike,
            funding_regime: Some(FundingRegime::Backwardation),
            vol_regime: Some(VolRegime::Extreme),
        };
        let analogues = memory.find_analogues(&query);
        assert_eq!(analogues.len(), 1);
        assert_eq!(analogues[0].score, SHOCK_WEIGHT);
    }

    #[test]
    fn unrelated_regime_is_excluded() {
        let memory = RegimeMemory::new();
        memory.record(entry(ShockState::Calm, FundingRegime::Neutral, VolRegime::Low, 0.0));
        let query = RegimeState {
            shock_state: ShockState::Spike,
            funding_regime: Some(FundingRegime::Backwardation),
            vol_regime: Some(VolRegime::Extreme),
        };
        assert!(memory.find_analogues(&query).is_empty());
    }

    #[test]
    fn outcome_distribution_reports_win_rate_and_best_analogue() {
        let memory = RegimeMemory::new();
        memory.record(entry(ShockState::Spike, FundingRegime::Backwardation, VolRegime::High, 0.03));
        memory.record(entry(ShockState::Spike, FundingRegime::Backwardation, VolRegime::High, -0.01));
        let query = RegimeState {
            shock_state: ShockState::Spike,
            funding_regime: Some(FundingRegime::Backwardation),
            vol_regime: Some(VolRegime::High),
        };
        let dist = memory.outcome_distribution(&query);
        assert_eq!(dist.sample_size, 2);
        assert!((dist.win_rate_4h - 0.5).abs() < 1e-9);
        assert!(dist.best_analogue.is_some());
    }

    #[test]
    fn ring_evicts_past_capacity() {
        let memory = RegimeMemory::new();
        for _ in 0..(RING_CAPACITY + 5) {
            memory.record(entry(ShockState::Calm, FundingRegime::Neutral, VolRegime::Normal, 0.0));
        }
        assert_eq!(memory.len(), RING_CAPACITY);
    }
}
