//! A/B sandbox: evaluates two strategy configs against the same market
//! state and a set of simulated price-change scenarios, and picks a
//! winner by total simulated PnL.

use crate::analytics::monte_carlo::{run_monte_carlo, MonteCarloInput, MonteCarloResult};
use crate::models::MarketState;
use crate::rules::{RuleAction, RulesEngine, StrategyConfig};
use serde::{Deserialize, Serialize};

/// One simulated price path used to score a strategy's rule output.
/// `size` and `price_change_pct` are fixtures supplied by the caller, not
/// observed market data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PnlScenario {
    pub size: f64,
    pub price_change_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantReport {
    pub label: String,
    pub actions: Vec<RuleAction>,
    pub total_pnl: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxReport {
    pub variant_a: VariantReport,
    pub variant_b: VariantReport,
    pub monte_carlo: MonteCarloResult,
    pub winner: String,
    pub highlights: Vec<String>,
}

pub struct Sandbox {
    rules: RulesEngine,
}

impl Sandbox {
    pub fn new() -> Self {
        Self { rules: RulesEngine::new() }
    }

    /// Runs `config_a` ("variant_a") and `config_b` ("variant_b") through
    /// the rules engine against the same `state`, sums `size *
    /// price_change_pct / 100` over `scenarios` for each, attaches a
    /// Monte Carlo subreport for the state's implied position, and picks
    /// the higher-PnL variant as the winner.
    pub fn compare(
        &self,
        state: &MarketState,
        config_a: &StrategyConfig,
        config_b: &StrategyConfig,
        scenarios: &[PnlScenario],
        mc_input: &MonteCarloInput,
    ) -> SandboxReport {
        let actions_a = self.rules.evaluate_with_config(state, config_a);
        let actions_b = self.rules.evaluate_with_config(state, config_b);

        let pnl_a = simulate_pnl(&actions_a, scenarios);
        let pnl_b = simulate_pnl(&actions_b, scenarios);

        let monte_carlo = run_monte_carlo(mc_input);

        let winner = if pnl_a >= pnl_b { "variant_a" } else { "variant_b" }.to_string();

        let mut highlights = Vec::new();
        highlights.push(format!("variant_a fired {} rule(s), variant_b fired {}", actions_a.len(), actions_b.len()));
        highlights.push(format!("variant_a pnl={pnl_a:.4}, variant_b pnl={pnl_b:.4}"));
        if let Some(reason) = &monte_carlo.error {
            highlights.push(format!("monte carlo subreport unavailable: {reason}"));
        } else {
            highlights.push(format!("monte carlo var_95={:.4}, prob_liquidation={:.4}", monte_carlo.var_95, monte_carlo.prob_liquidation));
        }

        SandboxReport {
            variant_a: VariantReport { label: "variant_a".to_string(), actions: actions_a, total_pnl: pnl_a },
            variant_b: VariantReport { label: "variant_b".to_string(), actions: actions_b, total_pnl: pnl_b },
            monte_carlo,
            winner,
            highlights,
        }
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

/// A variant earns `size * price_change_pct / 100` on each scenario for
/// every reducing action it fired (`reduce_exposure`, `reduce_long_perp`,
/// `rotate_to_stables`), and nothing on scenarios it left untouched — a
/// deliberately trivial PnL model, not a priced backtest.
fn simulate_pnl(actions: &[RuleAction], scenarios: &[PnlScenario]) -> f64 {
    let reduces = actions.iter().any(|a| {
        matches!(a.action_type.as_str(), "reduce_exposure" | "reduce_long_perp" | "rotate_to_stables")
    });
    if !reduces {
        return 0.0;
    }
    scenarios.iter().map(|s| s.size * s.price_change_pct / 100.0).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VolRegime;

    fn calm_mc_input() -> MonteCarloInput {
        MonteCarloInput {
            current_price: 65_000.0,
            horizon_hours: 24.0,
            volatility: 0.6,
            drift: 0.0,
            n_paths: 1_000,
            shock_adjustment: 1.0,
            position: 0.0,
            funding_rate: 0.0,
            liq_price: None,
            seed: Some(7),
        }
    }

    #[test]
    fn tighter_variant_reduces_and_wins_on_a_drawdown_scenario() {
        let sandbox = Sandbox::new();
        let mut state = MarketState::default();
        state.shock_score = 1.8;
        state.tariff_rate_of_change = 2.0;
        state.vol_regime = Some(VolRegime::High);

        let strict = StrategyConfig { shock_throttle_threshold: 1.0, ..StrategyConfig::default() };
        let loose = StrategyConfig::default();
        let scenarios = [PnlScenario { size: 1.0, price_change_pct: 20.0 }];

        let report = sandbox.compare(&state, &strict, &loose, &scenarios, &calm_mc_input());
        assert!(!report.variant_a.actions.is_empty());
        assert!(report.variant_b.actions.is_empty());
        assert_eq!(report.winner, "variant_a");
    }

    #[test]
    fn identical_configs_tie_toward_variant_a() {
        let sandbox = Sandbox::new();
        let state = MarketState::default();
        let config = StrategyConfig::default();
        let scenarios = [PnlScenario { size: 1.0, price_change_pct: 5.0 }];

        let report = sandbox.compare(&state, &config, &config, &scenarios, &calm_mc_input());
        assert_eq!(report.variant_a.total_pnl, report.variant_b.total_pnl);
        assert_eq!(report.winner, "variant_a");
    }

    #[test]
    fn highlights_report_rule_counts_and_pnl() {
        let sandbox = Sandbox::new();
        let state = MarketState::default();
        let config = StrategyConfig::default();
        let report = sandbox.compare(&state, &config, &config, &[], &calm_mc_input());
        assert_eq!(report.highlights.len(), 3);
    }
}
