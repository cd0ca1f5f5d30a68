//! Microstructure analyzer: orderbook imbalance/bias/thinness, pairwise
//! cross-venue dislocation alerts, perp/spot basis opportunity flags,
//! and convergence-speed estimation via OLS half-life.

use crate::models::OrderbookSnap;
use crate::numeric;
use serde::{Deserialize, Serialize};

const TOP_N: usize = 10;
const THIN_VOLUME_THRESHOLD: f64 = 100.0;
const IMBALANCE_BULLISH: f64 = 0.2;
const IMBALANCE_BEARISH: f64 = -0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ImbalanceResult {
    pub imbalance: f64,
    pub bias: Option<Bias>,
    pub thin: bool,
    pub error: Option<String>,
}

pub fn compute_imbalance(book: &OrderbookSnap) -> ImbalanceResult {
    let bid_vol = book.top_n_volume(TOP_N, true);
    let ask_vol = book.top_n_volume(TOP_N, false);
    let total = bid_vol + ask_vol;
    if total <= 0.0 {
        return ImbalanceResult {
            error: Some("empty orderbook".to_string()),
            ..Default::default()
        };
    }
    let imbalance = (bid_vol - ask_vol) / total;
    let bias = if imbalance > IMBALANCE_BULLISH {
        Bias::Bullish
    } else if imbalance < IMBALANCE_BEARISH {
        Bias::Bearish
    } else {
        Bias::Neutral
    };
    ImbalanceResult {
        imbalance,
        bias: Some(bias),
        thin: total < THIN_VOLUME_THRESHOLD,
        error: None,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DislocationAlert {
    pub venue_a: String,
    pub venue_b: String,
    pub spread_bps: f64,
}

/// Pairwise mid-price spread in bps across every venue pair in `mids`
/// (venue name -> mid price), alerting where the spread exceeds
/// `threshold_bps`.
pub fn detect_dislocations(mids: &[(String, f64)], threshold_bps: f64) -> Vec<DislocationAlert> {
    let mut alerts = Vec::new();
    for i in 0..mids.len() {
        for j in (i + 1)..mids.len() {
            let (venue_a, price_a) = &mids[i];
            let (venue_b, price_b) = &mids[j];
            if *price_a <= 0.0 || *price_b <= 0.0 {
                continue;
            }
            let mid = (price_a + price_b) / 2.0;
            let spread_bps = ((price_a - price_b).abs() / mid) * 10_000.0;
            if spread_bps > threshold_bps {
                alerts.push(DislocationAlert {
                    venue_a: venue_a.clone(),
                    venue_b: venue_b.clone(),
                    spread_bps,
                });
            }
        }
    }
    alerts
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BasisOpportunity {
    pub basis_bps: f64,
    pub opportunity: bool,
}

pub fn basis_opportunity(perp_price: f64, spot_price: f64, threshold_bps: f64) -> BasisOpportunity {
    if spot_price <= 0.0 {
        return BasisOpportunity::default();
    }
    let basis_bps = ((perp_price - spot_price).abs() / spot_price) * 10_000.0;
    BasisOpportunity {
        basis_bps,
        opportunity: basis_bps > threshold_bps,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConvergenceResult {
    pub beta: f64,
    pub half_life_levels: Option<f64>,
}

/// Convergence speed: OLS of delta-spread on level (index position),
/// half-life (in levels, i.e. observation steps) = -ln(2)/beta when
/// beta is negative (mean-reverting). `spreads` is chronologically
/// ordered.
pub fn convergence_speed(spreads: &[f64]) -> ConvergenceResult {
    if spreads.len() < 3 {
        return ConvergenceResult::default();
    }
    let levels: Vec<f64> = (0..spreads.len() - 1).map(|i| i as f64).collect();
    let deltas: Vec<f64> = spreads.windows(2).map(|w| w[1] - w[0]).collect();
    let fit = numeric::ols(&levels, &deltas);
    let half_life_levels = if fit.beta < 0.0 {
        Some(-(2f64.ln()) / fit.beta)
    } else {
        None
    };
    ConvergenceResult {
        beta: fit.beta,
        half_life_levels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn book(bids: Vec<(f64, f64)>, asks: Vec<(f64, f64)>) -> OrderbookSnap {
        OrderbookSnap {
            venue: "hyperliquid".into(),
            market: "BTC-PERP".into(),
            bids,
            asks,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn bullish_bias_when_bids_dominate() {
        let b = book(vec![(100.0, 80.0)], vec![(101.0, 20.0)]);
        let result = compute_imbalance(&b);
        assert_eq!(result.bias, Some(Bias::Bullish));
    }

    #[test]
    fn thin_flag_when_combined_volume_under_100() {
        let b = book(vec![(100.0, 10.0)], vec![(101.0, 10.0)]);
        let result = compute_imbalance(&b);
        assert!(result.thin);
    }

    #[test]
    fn empty_book_is_a_well_formed_error() {
        let b = book(vec![], vec![]);
        let result = compute_imbalance(&b);
        assert!(result.error.is_some());
    }

    #[test]
    fn dislocation_detected_across_venue_pair() {
        let mids = vec![("pyth".to_string(), 100.0), ("kraken".to_string(), 101.0)];
        let alerts = detect_dislocations(&mids, 50.0);
        assert_eq!(alerts.len(), 1);
    }

    #[test]
    fn basis_opportunity_flagged_above_threshold() {
        let result = basis_opportunity(101.0, 100.0, 50.0);
        assert!(result.opportunity);
    }

    #[test]
    fn convergence_half_life_positive_when_mean_reverting() {
        let spreads = vec![10.0, 8.0, 6.4, 5.12, 4.1];
        let result = convergence_speed(&spreads);
        assert!(result.beta < 0.0);
        assert!(result.half_life_levels.unwrap() > 0.0);
    }
}
