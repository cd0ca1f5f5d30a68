//! Hedge ratio analysis: Pearson correlation and OLS hedge beta between a
//! position leg and one or more candidate hedge legs, plus optional
//! macro-shock correlations computed the same way.

use crate::numeric;
use serde::{Deserialize, Serialize};

const DEFAULT_WINDOW: usize = 30;
const MIN_WINDOW: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegCorrelation {
    pub leg: String,
    pub correlation: f64,
    pub beta: f64,
    pub hedge_effectiveness: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HedgeRatioResult {
    pub legs: Vec<LegCorrelation>,
    pub recommended_leg: Option<String>,
    pub recommended_beta: f64,
    pub macro_correlations: Vec<LegCorrelation>,
    pub window_used: usize,
    pub error: Option<String>,
}

/// One candidate hedge leg: a name plus its return series, time-aligned
/// with the primary position's return series.
#[derive(Debug, Clone)]
pub struct HedgeLeg {
    pub name: String,
    pub returns: Vec<f64>,
}

/// Pearson correlation, OLS beta (`position ~ leg`) and R^2 over the last
/// `window` observations (default 30, floor 5). `window` below the floor
/// is raised to the floor; fewer observations than the floor yields a
/// well-formed zero result with `error` set.
pub fn analyze(
    position_returns: &[f64],
    legs: &[HedgeLeg],
    macro_shock: Option<&[f64]>,
    window: Option<usize>,
) -> HedgeRatioResult {
    let window = window.unwrap_or(DEFAULT_WINDOW).max(MIN_WINDOW);

    if position_returns.len() < MIN_WINDOW {
        return HedgeRatioResult {
            error: Some("insufficient position return history".to_string()),
            window_used: window,
            ..Default::default()
        };
    }

    let tail = |xs: &[f64]| -> Vec<f64> {
        let n = xs.len().min(window);
        xs[xs.len() - n..].to_vec()
    };
    let pos_tail = tail(position_returns);

    let mut results = Vec::with_capacity(legs.len());
    for leg in legs {
        if leg.returns.len() < MIN_WINDOW {
            continue;
        }
        let leg_tail = tail(&leg.returns);
        let n = pos_tail.len().min(leg_tail.len());
        if n < MIN_WINDOW {
            continue;
        }
        let p = &pos_tail[pos_tail.len() - n..];
        let l = &leg_tail[leg_tail.len() - n..];
        let correlation = numeric::pearson(p, l);
        let beta = numeric::beta(l, p);
        results.push(LegCorrelation {
            leg: leg.name.clone(),
            correlation,
            beta,
            hedge_effectiveness: correlation * correlation,
        });
    }

    let recommended = results
        .iter()
        .max_by(|a, b| a.beta.abs().partial_cmp(&b.beta.abs()).unwrap_or(std::cmp::Ordering::Equal));
    let recommended_leg = recommended.map(|r| r.leg.clone());
    let recommended_beta = recommended.map(|r| r.beta).unwrap_or(0.0);

    let macro_correlations = match macro_shock {
        Some(shock) if shock.len() >= MIN_WINDOW => {
            let shock_tail = tail(shock);
            let n = pos_tail.len().min(shock_tail.len());
            if n >= MIN_WINDOW {
                let p = &pos_tail[pos_tail.len() - n..];
                let s = &shock_tail[shock_tail.len() - n..];
                let correlation = numeric::pearson(p, s);
                let beta = numeric::beta(s, p);
                vec![LegCorrelation {
                    leg: "macro_shock".to_string(),
                    correlation,
                    beta,
                    hedge_effectiveness: correlation * correlation,
                }]
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    };

    HedgeRatioResult {
        legs: results,
        recommended_leg,
        recommended_beta,
        macro_correlations,
        window_used: window,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn linear_series(n: usize, scale: f64) -> Vec<f64> {
        (0..n).map(|i| i as f64 * scale).collect()
    }

    #[test]
    fn perfectly_correlated_leg_has_beta_and_r_squared_near_one() {
        let position = linear_series(40, 1.0);
        let legs = vec![HedgeLeg {
            name: "hl_perp".to_string(),
            returns: linear_series(40, 0.5),
        }];
        let result = analyze(&position, &legs, None, None);
        assert_eq!(result.legs.len(), 1);
        assert_relative_eq!(result.legs[0].beta, 2.0, epsilon = 1e-6);
        assert_relative_eq!(result.legs[0].hedge_effectiveness, 1.0, epsilon = 1e-6);
        assert_eq!(result.recommended_leg, Some("hl_perp".to_string()));
    }

    #[test]
    fn insufficient_history_is_a_well_formed_error() {
        let result = analyze(&[1.0, 2.0], &[], None, None);
        assert!(result.error.is_some());
        assert!(result.legs.is_empty());
    }

    #[test]
    fn picks_leg_with_largest_beta_magnitude() {
        let position = linear_series(40, 1.0);
        let legs = vec![
            HedgeLeg {
                name: "weak".to_string(),
                returns: linear_series(40, 2.0),
            },
            HedgeLeg {
                name: "strong".to_string(),
                returns: linear_series(40, 0.2),
            },
        ];
        let result = analyze(&position, &legs, None, None);
        assert_eq!(result.recommended_leg, Some("strong".to_string()));
    }

    #[test]
    fn macro_shock_correlation_is_optional() {
        let position = linear_series(40, 1.0);
        let result = analyze(&position, &[], None, None);
        assert!(result.macro_correlations.is_empty());

        let shock = linear_series(40, 3.0);
        let result = analyze(&position, &[], Some(&shock), None);
        assert_eq!(result.macro_correlations.len(), 1);
    }
}
