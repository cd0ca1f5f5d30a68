//! Rules engine: a fixed, declared list of named predicate/action pairs,
//! evaluated in order against a market-state context.

use crate::models::{MarketState, Side, VolRegime};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleAction {
    pub rule_name: String,
    pub action_type: String,
    pub venue: Option<String>,
    pub market: Option<String>,
    pub side: Option<Side>,
    pub size: Option<f64>,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

type RulePredicate = fn(&MarketState) -> bool;

struct Rule {
    name: &'static str,
    action_type: &'static str,
    predicate: RulePredicate,
    reason: fn(&MarketState) -> String,
}

fn tariff_vol_reduce(state: &MarketState) -> bool {
    state.tariff_rate_of_change > 5.0
        && matches!(state.vol_regime, Some(VolRegime::High) | Some(VolRegime::Extreme))
}

fn shock_throttle(state: &MarketState) -> bool {
    state.shock_score > 2.0
}

fn divergence_hedge(state: &MarketState) -> bool {
    state.divergence_alert_active && state.funding_regime_flipped
}

fn negative_carry_reduce(state: &MarketState) -> bool {
    state.carry_score < -0.10
}

fn stable_rotation(state: &MarketState) -> bool {
    state.shock_score > 1.5 || state.tariff_rate_of_change > 8.0
}

/// Declaration order IS evaluation order and IS the order actions are
/// returned in — callers may rely on rules firing in this sequence.
const RULES: &[Rule] = &[
    Rule {
        name: "tariff_vol_reduce",
        action_type: "reduce_exposure",
        predicate: tariff_vol_reduce,
        reason: |s| format!("tariff rate_of_change {:.2} with vol_regime {:?}", s.tariff_rate_of_change, s.vol_regime),
    },
    Rule {
        name: "shock_throttle",
        action_type: "enable_risk_throttle",
        predicate: shock_throttle,
        reason: |s| format!("shock_score {:.2} exceeds 2.0", s.shock_score),
    },
    Rule {
        name: "divergence_hedge",
        action_type: "hedge",
        predicate: divergence_hedge,
        reason: |_| "divergence alert active with funding regime flip".to_string(),
    },
    Rule {
        name: "negative_carry_reduce",
        action_type: "reduce_long_perp",
        predicate: negative_carry_reduce,
        reason: |s| format!("carry_score {:.4} below -0.10", s.carry_score),
    },
    Rule {
        name: "stable_rotation",
        action_type: "rotate_to_stables",
        predicate: stable_rotation,
        reason: |s| format!("shock_score {:.2} or tariff rate_of_change {:.2} breached rotation trigger", s.shock_score, s.tariff_rate_of_change),
    },
];

/// Tunable thresholds for the five declared rules. Defaults match the
/// fixed constants `evaluate` itself uses; the replay and sandbox engines
/// vary these to compare strategy variants without touching the
/// declaration-order guarantee `evaluate` makes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub shock_throttle_threshold: f64,
    pub tariff_vol_rate_threshold: f64,
    pub negative_carry_threshold: f64,
    pub rotation_shock_threshold: f64,
    pub rotation_tariff_threshold: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            shock_throttle_threshold: 2.0,
            tariff_vol_rate_threshold: 5.0,
            negative_carry_threshold: -0.10,
            rotation_shock_threshold: 1.5,
            rotation_tariff_threshold: 8.0,
        }
    }
}

/// The fixed rules engine: evaluates every declared rule against `state`
/// and returns the triggered actions in declaration order.
pub struct RulesEngine;

impl RulesEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, state: &MarketState) -> Vec<RuleAction> {
        let now = crate::time::now();
        RULES
            .iter()
            .filter(|rule| (rule.predicate)(state))
            .map(|rule| RuleAction {
                rule_name: rule.name.to_string(),
                action_type: rule.action_type.to_string(),
                venue: None,
                market: None,
                side: None,
                size: None,
                reason: (rule.reason)(state),
                timestamp: now,
            })
            .collect()
    }

    /// Same five rules, same declaration order, with thresholds taken
    /// from `config` instead of the fixed constants. Used by the replay
    /// and sandbox engines to evaluate strategy variants.
    pub fn evaluate_with_config(&self, state: &MarketState, config: &StrategyConfig) -> Vec<RuleAction> {
        let now = crate::time::now();
        let mut actions = Vec::new();

        if state.tariff_rate_of_change > config.tariff_vol_rate_threshold
            && matches!(state.vol_regime, Some(VolRegime::High) | Some(VolRegime::Extreme))
        {
            actions.push(RuleAction {
                rule_name: "tariff_vol_reduce".to_string(),
                action_type: "reduce_exposure".to_string(),
                venue: None,
                market: None,
                side: None,
                size: None,
                reason: format!("tariff rate_of_change {:.2} with vol_regime {:?}", state.tariff_rate_of_change, state.vol_regime),
                timestamp: now,
            });
        }

        if state.shock_score > config.shock_throttle_threshold {
            actions.push(RuleAction {
                rule_name: "shock_throttle".to_string(),
                action_type: "enable_risk_throttle".to_string(),
                venue: None,
                market: None,
                side: None,
                size: None,
                reason: format!("shock_score {:.2} exceeds {:.2}", state.shock_score, config.shock_throttle_threshold),
                timestamp: now,
            });
        }

        if state.divergence_alert_active && state.funding_regime_flipped {
            actions.push(RuleAction {
                rule_name: "divergence_hedge".to_string(),
                action_type: "hedge".to_string(),
                venue: None,
                market: None,
                side: None,
                size: None,
                reason: "divergence alert active with funding regime flip".to_string(),
                timestamp: now,
            });
        }

        if state.carry_score < config.negative_carry_threshold {
            actions.push(RuleAction {
                rule_name: "negative_carry_reduce".to_string(),
                action_type: "reduce_long_perp".to_string(),
                venue: None,
                market: None,
                side: None,
                size: None,
                reason: format!("carry_score {:.4} below {:.2}", state.carry_score, config.negative_carry_threshold),
                timestamp: now,
            });
        }

        if state.shock_score > config.rotation_shock_threshold || state.tariff_rate_of_change > config.rotation_tariff_threshold {
            actions.push(RuleAction {
                rule_name: "stable_rotation".to_string(),
                action_type: "rotate_to_stables".to_string(),
                venue: None,
                market: None,
                side: None,
                size: None,
                reason: format!("shock_score {:.2} or tariff rate_of_change {:.2} breached rotation trigger", state.shock_score, state.tariff_rate_of_change),
                timestamp: now,
            });
        }

        actions
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FundingRegime;

    fn base_state() -> MarketState {
        MarketState::default()
    }

    #[test]
    fn no_rules_fire_on_calm_state() {
        let engine = RulesEngine::new();
        let actions = engine.evaluate(&base_state());
        assert!(actions.is_empty());
    }

    #[test]
    fn tariff_vol_reduce_requires_both_conditions() {
        let engine = RulesEngine::new();
        let mut state = base_state();
        state.tariff_rate_of_change = 6.0;
        assert!(engine.evaluate(&state).is_empty(), "vol_regime still unset");
        state.vol_regime = Some(VolRegime::High);
        let actions = engine.evaluate(&state);
        assert!(actions.iter().any(|a| a.rule_name == "tariff_vol_reduce"));
    }

    #[test]
    fn multiple_rules_fire_in_declaration_order() {
        let engine = RulesEngine::new();
        let mut state = base_state();
        state.shock_score = 3.0;
        state.divergence_alert_active = true;
        state.funding_regime_flipped = true;
        state.funding_regime = Some(FundingRegime::Backwardation);
        let actions = engine.evaluate(&state);
        let names: Vec<&str> = actions.iter().map(|a| a.rule_name.as_str()).collect();
        assert_eq!(names, vec!["shock_throttle", "divergence_hedge", "stable_rotation"]);
    }

    #[test]
    fn evaluate_with_config_matches_fixed_defaults() {
        let engine = RulesEngine::new();
        let mut state = base_state();
        state.shock_score = 3.0;
        let fixed = engine.evaluate(&state);
        let configured = engine.evaluate_with_config(&state, &StrategyConfig::default());
        let fixed_names: Vec<&str> = fixed.iter().map(|a| a.rule_name.as_str()).collect();
        let configured_names: Vec<&str> = configured.iter().map(|a| a.rule_name.as_str()).collect();
        assert_eq!(fixed_names, configured_names);
    }

    #[test]
    fn looser_config_fires_where_default_would_not() {
        let engine = RulesEngine::new();
        let mut state = base_state();
        state.shock_score = 1.8;
        assert!(engine.evaluate(&state).is_empty());
        let loose = StrategyConfig { shock_throttle_threshold: 1.0, ..StrategyConfig::default() };
        let actions = engine.evaluate_with_config(&state, &loose);
        assert!(actions.iter().any(|a| a.rule_name == "shock_throttle"));
    }

    #[test]
    fn negative_carry_reduce_fires_below_threshold() {
        let engine = RulesEngine::new();
        let mut state = base_state();
        state.carry_score = -0.15;
        let actions = engine.evaluate(&state);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].action_type, "reduce_long_perp");
    }
}
