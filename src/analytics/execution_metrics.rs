//! Execution metrics: a per-venue ring of recent fills feeding an
//! Execution Quality Index (EQI, latency/slippage composite) and a
//! slippage anomaly detector that falls back to an absolute threshold
//! until a venue has enough history for a z-score.

use crate::numeric;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

const WINDOW: usize = 100;
const ANOMALY_ABSOLUTE_THRESHOLD_BPS: f64 = 50.0;
const ANOMALY_MIN_SAMPLES: usize = 5;
const ANOMALY_Z_THRESHOLD: f64 = 2.5;

#[derive(Debug, Clone, Copy)]
pub struct Fill {
    pub latency_ms: f64,
    pub slippage_bps: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EqiResult {
    pub eqi: f64,
    pub p95_latency_ms: f64,
    pub p95_slippage_bps: f64,
    pub sample_size: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SlippageAnomaly {
    pub is_anomaly: bool,
    pub method: String,
    pub score: f64,
}

#[derive(Default)]
pub struct ExecutionMetricsEngine {
    rings: DashMap<String, Mutex<VecDeque<Fill>>>,
}

impl ExecutionMetricsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_fill(&self, venue: &str, latency_ms: f64, slippage_bps: f64) {
        let entry = self.rings.entry(venue.to_string()).or_insert_with(|| Mutex::new(VecDeque::with_capacity(WINDOW)));
        let mut ring = entry.lock();
        if ring.len() >= WINDOW {
            ring.pop_front();
        }
        ring.push_back(Fill { latency_ms, slippage_bps });
    }

    pub fn eqi(&self, venue: &str) -> EqiResult {
        let Some(entry) = self.rings.get(venue) else {
            return EqiResult {
                error: Some("no fills recorded for venue".to_string()),
                ..Default::default()
            };
        };
        let ring = entry.lock();
        if ring.is_empty() {
            return EqiResult {
                error: Some("no fills recorded for venue".to_string()),
                ..Default::default()
            };
        }
        let latencies: Vec<f64> = ring.iter().map(|f| f.latency_ms).collect();
        let slippages: Vec<f64> = ring.iter().map(|f| f.slippage_bps).collect();
        let p95_latency_ms = numeric::percentile(&latencies, 0.95);
        let p95_slippage_bps = numeric::percentile(&slippages, 0.95);
        let eqi = 0.4 * (100.0 - p95_latency_ms / 10.0).max(0.0) + 0.6 * (100.0 - p95_slippage_bps / 5.0).max(0.0);

        EqiResult {
            eqi,
            p95_latency_ms,
            p95_slippage_bps,
            sample_size: ring.len(),
            error: None,
        }
    }

    /// Call this BEFORE `record_fill` for the observation under test so
    /// the anomaly check compares against prior history, not itself.
    pub fn check_slippage_anomaly(&self, venue: &str, slippage_bps: f64) -> SlippageAnomaly {
        let history: Vec<f64> = self
            .rings
            .get(venue)
            .map(|entry| entry.lock().iter().map(|f| f.slippage_bps).collect())
            .unwrap_or_default();

        if history.len() < ANOMALY_MIN_SAMPLES {
            return SlippageAnomaly {
                is_anomaly: slippage_bps.abs() > ANOMALY_ABSOLUTE_THRESHOLD_BPS,
                method: "absolute".to_string(),
                score: slippage_bps.abs(),
            };
        }

        let z = numeric::z_score(slippage_bps, &history).unwrap_or(0.0);
        SlippageAnomaly {
            is_anomaly: z.abs() > ANOMALY_Z_THRESHOLD,
            method: "z_score".to_string(),
            score: z,
        }
    }
}
