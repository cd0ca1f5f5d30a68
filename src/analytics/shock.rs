//! Shock score: a normalized product of news attention and negative-tone
//! intensity derived from GDELT-style article counts and average tone.

use crate::numeric;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ShockResult {
    pub score: f64,
    pub spike: bool,
    pub attention: f64,
    pub tone: f64,
    pub error: Option<String>,
}

/// `history` is the ring of prior raw (pre-zscore) shock values, oldest
/// first; callers own maintaining it (the spec names no fixed capacity
/// for this particular ring).
pub fn compute_shock(article_count: u64, mean_tone: f64, history: &[f64]) -> ShockResult {
    let attention = (1.0 + article_count as f64).ln();
    let tone = (-mean_tone).max(0.0);
    let raw = attention * (1.0 + tone);

    let score = numeric::z_score(raw, history).unwrap_or(raw);

    ShockResult {
        score,
        spike: score > 2.0,
        attention,
        tone,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_value_used_without_enough_history() {
        let result = compute_shock(10, -1.0, &[]);
        let expected_attention = 11f64.ln();
        assert!((result.attention - expected_attention).abs() < 1e-9);
        assert!((result.tone - 1.0).abs() < 1e-9);
        assert!((result.score - expected_attention * 2.0).abs() < 1e-9);
    }

    #[test]
    fn zero_or_positive_tone_clips_to_zero() {
        let result = compute_shock(10, 1.0, &[]);
        assert_eq!(result.tone, 0.0);
    }

    #[test]
    fn zscore_used_with_enough_varying_history() {
        let history = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = compute_shock(50, -5.0, &history);
        // raw is large relative to history, so z-score should differ
        // from the raw magnitude.
        let attention = 51f64.ln();
        let tone = 5.0;
        let raw = attention * (1.0 + tone);
        assert_ne!(result.score, raw);
    }

    #[test]
    fn spike_flag_set_above_threshold() {
        let result = compute_shock(1000, -10.0, &[]);
        assert!(result.spike);
    }
}
