//! Tariff index: a country×product weighted tariff average normalized to
//! [0, 100], plus rate-of-change against the previous snapshot. Weight
//! derivation is explicitly out of scope (§1 Non-goals) — weights are a
//! caller-supplied input, defaulting to equal weighting.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One country×product tariff rate observation, as written by the WITS
/// ingestor under `tariff:raw`.
#[derive(Debug, Clone)]
pub struct TariffObservation {
    pub country: String,
    pub product: String,
    pub rate_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TariffIndexResult {
    pub tariff_index: f64,
    pub rate_of_change: f64,
    pub components: HashMap<String, f64>,
    pub error: Option<String>,
}

/// Weight a tariff rate observation by its key. Missing keys fall back
/// to equal weighting across all observations.
pub fn compute_tariff_index(
    observations: &[TariffObservation],
    weights: Option<&HashMap<String, f64>>,
    prev_index: Option<f64>,
) -> TariffIndexResult {
    if observations.is_empty() {
        return TariffIndexResult {
            error: Some("no tariff observations".to_string()),
            ..Default::default()
        };
    }

    let mut components = HashMap::new();
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    let equal_weight = 1.0 / observations.len() as f64;

    for obs in observations {
        let key = format!("{}:{}", obs.country, obs.product);
        let w = weights
            .and_then(|m| m.get(&key).copied())
            .unwrap_or(equal_weight);
        weighted_sum += obs.rate_pct * w;
        weight_total += w;
        components.insert(key, obs.rate_pct);
    }

    if weight_total <= 0.0 {
        return TariffIndexResult {
            error: Some("zero total weight".to_string()),
            components,
            ..Default::default()
        };
    }

    // Tariff rates observed here are percentages roughly in [0, 50];
    // normalize onto [0, 100] by scaling the weighted average, clamping
    // at the bounds so a pathological weight set can't escape the range.
    let raw_avg = weighted_sum / weight_total;
    let tariff_index = (raw_avg * 2.0).clamp(0.0, 100.0);

    let rate_of_change = match prev_index {
        Some(prev) if prev > 0.0 => ((tariff_index - prev) / prev) * 100.0,
        Some(_) if tariff_index > 0.0 => 100.0,
        _ => 0.0,
    };

    TariffIndexResult {
        tariff_index,
        rate_of_change,
        components,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(country: &str, product: &str, rate: f64) -> TariffObservation {
        TariffObservation {
            country: country.to_string(),
            product: product.to_string(),
            rate_pct: rate,
        }
    }

    #[test]
    fn empty_observations_is_a_well_formed_error() {
        let result = compute_tariff_index(&[], None, None);
        assert!(result.error.is_some());
        assert_eq!(result.tariff_index, 0.0);
    }

    #[test]
    fn equal_weighting_averages_rates() {
        let observations = vec![obs("US", "steel", 10.0), obs("CN", "steel", 20.0)];
        let result = compute_tariff_index(&observations, None, None);
        assert!(result.error.is_none());
        assert!((result.tariff_index - 30.0).abs() < 1e-9); // avg 15 * 2
    }

    #[test]
    fn rate_of_change_is_zero_when_no_prior_and_current_is_zero() {
        let observations = vec![obs("US", "steel", 0.0)];
        let result = compute_tariff_index(&observations, None, None);
        assert_eq!(result.rate_of_change, 0.0);
    }

    #[test]
    fn rate_of_change_is_hundred_when_no_prior_but_current_positive() {
        let observations = vec![obs("US", "steel", 10.0)];
        let result = compute_tariff_index(&observations, None, None);
        assert_eq!(result.rate_of_change, 100.0);
    }

    #[test]
    fn rate_of_change_from_prior() {
        let observations = vec![obs("US", "steel", 11.0)];
        let result = compute_tariff_index(&observations, None, Some(20.0));
        assert!((result.rate_of_change - ((22.0 - 20.0) / 20.0 * 100.0)).abs() < 1e-9);
    }

    #[test]
    fn index_is_clamped_to_0_100() {
        let observations = vec![obs("US", "steel", 90.0)];
        let result = compute_tariff_index(&observations, None, None);
        assert!(result.tariff_index <= 100.0);
    }
}
