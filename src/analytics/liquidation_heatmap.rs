//! Liquidation heatmap: for every (leverage, price-drop%) cell on fixed
//! grids, estimates the probability of liquidation by combining a base
//! loss-vs-maintenance-margin probability, a margin-usage factor, and a
//! Gaussian-kernel volatility factor, then enforces monotonicity along
//! both axes with two running-max passes.

use crate::models::Position;
use serde::{Deserialize, Serialize};

/// Leverage multiples scanned by every heatmap column.
pub const LEVERAGE_GRID: [f64; 6] = [2.0, 3.0, 5.0, 10.0, 20.0, 50.0];
/// Price-drop percentages scanned by every heatmap row.
pub const DROP_GRID: [f64; 8] = [1.0, 2.0, 3.0, 5.0, 7.0, 10.0, 15.0, 25.0];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HeatmapResult {
    /// `grid[leverage_idx][drop_idx]`, probability in `[0, 1]`.
    pub grid: Vec<Vec<f64>>,
    pub leverage_grid: Vec<f64>,
    pub drop_grid: Vec<f64>,
    pub error: Option<String>,
}

/// `vol` is annualized volatility as a decimal (e.g. `0.5` = 50%).
/// `margin_usage` is the fraction of equity already committed as margin,
/// in `[0, 1]`; `positions` is accepted for parity with the live caller
/// (a future margin-usage derivation) but an explicit `margin_usage` is
/// authoritative when given.
pub fn compute_heatmap(
    current_price: f64,
    _positions: &[Position],
    vol: f64,
    margin_usage: f64,
) -> HeatmapResult {
    if current_price <= 0.0 {
        return HeatmapResult {
            error: Some("current_price must be positive".to_string()),
            ..Default::default()
        };
    }

    let vol_daily = (vol.max(0.0) / 365.0_f64.sqrt()).max(1e-6);
    let margin_factor = 0.5 + 0.5 * margin_usage.clamp(0.0, 1.0);

    let mut grid: Vec<Vec<f64>> = LEVERAGE_GRID
        .iter()
        .map(|&leverage| {
            let maintenance = (1.0 / leverage).min(0.999);
            DROP_GRID
                .iter()
                .map(|&drop_pct| {
                    let effective_loss = drop_pct / 100.0;
                    let base = (effective_loss / (1.0 - maintenance)).min(1.0);
                    let vol_component =
                        (-((effective_loss - vol_daily).powi(2)) / (2.0 * vol_daily.powi(2))).exp();
                    (base * margin_factor * vol_component).clamp(0.0, 1.0)
                })
                .collect()
        })
        .collect();

    // Row pass: non-decreasing across drop% at fixed leverage.
    for row in grid.iter_mut() {
        let mut running_max = 0.0_f64;
        for cell in row.iter_mut() {
            running_max = running_max.max(*cell);
            *cell = running_max;
        }
    }

    // Column pass: non-decreasing across leverage at fixed drop%.
    let n_drops = DROP_GRID.len();
    for col in 0..n_drops {
        let mut running_max = 0.0_f64;
        for row in grid.iter_mut() {
            running_max = running_max.max(row[col]);
            row[col] = running_max;
        }
    }

    HeatmapResult {
        grid,
        leverage_grid: LEVERAGE_GRID.to_vec(),
        drop_grid: DROP_GRID.to_vec(),
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_scenario_5_monotonic_both_axes_and_bounded() {
        let result = compute_heatmap(100.0, &[], 0.5, 0.3);
        assert!(result.error.is_none());
        for row in &result.grid {
            for i in 1..row.len() {
                assert!(row[i] >= row[i - 1] - 1e-12);
            }
        }
        let n_drops = DROP_GRID.len();
        for col in 0..n_drops {
            for i in 1..result.grid.len() {
                assert!(result.grid[i][col] >= result.grid[i - 1][col] - 1e-12);
            }
        }
        for row in &result.grid {
            for &cell in row {
                assert!((0.0..=1.0).contains(&cell));
            }
        }
    }

    #[test]
    fn nonpositive_price_is_a_well_formed_error() {
        let result = compute_heatmap(0.0, &[], 0.5, 0.3);
        assert!(result.error.is_some());
        assert!(result.grid.is_empty());
    }

    #[test]
    fn grid_dimensions_match_constants() {
        let result = compute_heatmap(100.0, &[], 0.3, 0.1);
        assert_eq!(result.grid.len(), LEVERAGE_GRID.len());
        assert_eq!(result.grid[0].len(), DROP_GRID.len());
    }
}
