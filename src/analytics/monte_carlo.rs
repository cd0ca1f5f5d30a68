//! Monte Carlo risk engine: one-step GBM price simulation feeding a PnL
//! distribution, VaR/CVaR, loss probabilities, liquidation probability,
//! and a 50-bin PnL histogram.

use crate::numeric;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

const MIN_PATHS: u32 = 100;
const MAX_PATHS: u32 = 10_000;
const HISTOGRAM_BINS: usize = 50;

#[derive(Debug, Clone)]
pub struct MonteCarloInput {
    pub current_price: f64,
    pub horizon_hours: f64,
    pub volatility: f64,
    pub drift: f64,
    pub n_paths: u32,
    pub shock_adjustment: f64,
    /// Signed position size (positive = long). Zero is a valid "no
    /// position" scenario used for risk-free scans like the heatmap.
    pub position: f64,
    pub funding_rate: f64,
    pub liq_price: Option<f64>,
    /// Deterministic seed so repeated calls with the same input
    /// reproduce the same distribution; omit for a fresh draw.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MonteCarloResult {
    pub var_95: f64,
    pub var_99: f64,
    pub cvar_95: f64,
    pub cvar_99: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub prob_loss_5pct: f64,
    pub prob_loss_10pct: f64,
    pub prob_liquidation: f64,
    pub histogram: Vec<f64>,
    pub histogram_bin_edges: Vec<f64>,
    pub n_paths_used: u32,
    pub error: Option<String>,
}

pub fn run_monte_carlo(input: &MonteCarloInput) -> MonteCarloResult {
    if input.current_price <= 0.0 || input.horizon_hours <= 0.0 {
        return MonteCarloResult {
            error: Some("current_price and horizon_hours must be positive".to_string()),
            ..Default::default()
        };
    }

    let n_paths = input.n_paths.clamp(MIN_PATHS, MAX_PATHS);
    let dt = input.horizon_hours / (365.25 * 24.0);
    let vol = input.volatility * (1.0 + input.shock_adjustment);
    let funding_cost = input.position.abs() * input.current_price * input.funding_rate * (input.horizon_hours / 8.0);

    let mut rng = match input.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let mut pnls = Vec::with_capacity(n_paths as usize);
    for _ in 0..n_paths {
        let z: f64 = StandardNormal.sample(&mut rng);
        let log_return = (input.drift - 0.5 * vol * vol) * dt + vol * dt.sqrt() * z;
        let end_price = input.current_price * log_return.exp();
        let pnl = input.position * (end_price - input.current_price) - funding_cost;
        pnls.push(pnl);
    }

    let mut sorted = pnls.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let var_95 = -numeric::percentile(&sorted, 0.05);
    let var_99 = -numeric::percentile(&sorted, 0.01);
    let cvar_95 = -tail_mean(&sorted, 0.05);
    let cvar_99 = -tail_mean(&sorted, 0.01);

    let notional = (input.position.abs() * input.current_price).max(1e-9);
    let loss_fractions: Vec<f64> = pnls.iter().map(|pnl| (-pnl / notional).max(0.0)).collect();
    let prob_loss_5pct = fraction_at_least(&loss_fractions, 0.05);
    let prob_loss_10pct = fraction_at_least(&loss_fractions, 0.10);

    let prob_liquidation = match input.liq_price {
        Some(liq) if input.position > 0.0 => fraction_end_prices_meeting(&pnls, input, |end| end <= liq),
        Some(liq) if input.position < 0.0 => fraction_end_prices_meeting(&pnls, input, |end| end >= liq),
        _ => 0.0,
    };

    let (histogram, histogram_bin_edges) = histogram_of(&sorted);

    MonteCarloResult {
        var_95,
        var_99,
        cvar_95,
        cvar_99,
        mean: numeric::mean(&pnls),
        median: numeric::percentile(&sorted, 0.5),
        std_dev: numeric::stddev(&pnls),
        prob_loss_5pct,
        prob_loss_10pct,
        prob_liquidation,
        histogram,
        histogram_bin_edges,
        n_paths_used: n_paths,
        error: None,
    }
}

fn tail_mean(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let cutoff = ((q * sorted.len() as f64).ceil() as usize).max(1).min(sorted.len());
    let tail = &sorted[..cutoff];
    tail.iter().sum::<f64>() / tail.len() as f64
}

fn fraction_at_least(values: &[f64], threshold: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|v| **v >= threshold).count() as f64 / values.len() as f64
}

/// Re-derives end prices from recorded PnLs to evaluate a liquidation
/// predicate without re-running the simulation. Works because
/// `pnl = position * (end - current) - funding_cost` is invertible in
/// `end` for nonzero `position`.
fn fraction_end_prices_meeting(pnls: &[f64], input: &MonteCarloInput, pred: impl Fn(f64) -> bool) -> f64 {
    if input.position == 0.0 || pnls.is_empty() {
        return 0.0;
    }
    let funding_cost = input.position.abs() * input.current_price * input.funding_rate * (input.horizon_hours / 8.0);
    let hits = pnls
        .iter()
        .filter(|pnl| {
            let end = input.current_price + (*pnl + funding_cost) / input.position;
            pred(end)
        })
        .count();
    hits as f64 / pnls.len() as f64
}

fn histogram_of(sorted: &[f64]) -> (Vec<f64>, Vec<f64>) {
    if sorted.is_empty() {
        return (vec![0.0; HISTOGRAM_BINS], vec![0.0; HISTOGRAM_BINS + 1]);
    }
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    let span = (max - min).max(1e-9);
    let bin_width = span / HISTOGRAM_BINS as f64;
    let mut bins = vec![0.0; HISTOGRAM_BINS];
    for v in sorted {
        let idx = (((v - min) / bin_width) as usize).min(HISTOGRAM_BINS - 1);
        bins[idx] += 1.0;
    }
    let edges: Vec<f64> = (0..=HISTOGRAM_BINS).map(|i| min + i as f64 * bin_width).collect();
    (bins, edges)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input() -> MonteCarloInput {
        MonteCarloInput {
            current_price: 100.0,
            horizon_hours: 24.0,
            volatility: 0.5,
            drift: 0.0,
            n_paths: 5000,
            shock_adjustment: 0.0,
            position: 1.0,
            funding_rate: 0.0,
            liq_price: None,
            seed: Some(42),
        }
    }

    #[test]
    fn n_paths_is_clipped_silently() {
        let mut input = base_input();
        input.n_paths = 50;
        let result = run_monte_carlo(&input);
        assert_eq!(result.n_paths_used, MIN_PATHS);

        input.n_paths = 50_000;
        let result = run_monte_carlo(&input);
        assert_eq!(result.n_paths_used, MAX_PATHS);
    }

    #[test]
    fn nonpositive_price_is_a_well_formed_error() {
        let mut input = base_input();
        input.current_price = 0.0;
        let result = run_monte_carlo(&input);
        assert!(result.error.is_some());
    }

    #[test]
    fn histogram_has_fifty_bins_and_sums_to_path_count() {
        let input = base_input();
        let result = run_monte_carlo(&input);
        assert_eq!(result.histogram.len(), HISTOGRAM_BINS);
        let total: f64 = result.histogram.iter().sum();
        assert!((total - result.n_paths_used as f64).abs() < 1e-6);
    }

    #[test]
    fn var_is_nondecreasing_from_95_to_99() {
        let input = base_input();
        let result = run_monte_carlo(&input);
        assert!(result.var_99 >= result.var_95 - 1e-6);
        assert!(result.cvar_99 >= result.cvar_95 - 1e-6);
    }

    #[test]
    fn liquidation_probability_is_zero_without_position() {
        let mut input = base_input();
        input.position = 0.0;
        input.liq_price = Some(90.0);
        let result = run_monte_carlo(&input);
        assert_eq!(result.prob_liquidation, 0.0);
    }

    #[test]
    fn same_seed_is_reproducible() {
        let input = base_input();
        let a = run_monte_carlo(&input);
        let b = run_monte_carlo(&input);
        assert_eq!(a.mean, b.mean);
        assert_eq!(a.var_95, b.var_95);
    }
}
