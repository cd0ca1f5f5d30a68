//! Replay and sandbox engines (§4.9): re-running a historical event
//! sequence or a shared market state through the rules engine to audit
//! fidelity or compare strategy variants, grounded in the host project's
//! A/B backtest harness for comparing strategy configs over the same
//! inputs.

mod sandbox;

pub use sandbox::{Sandbox, SandboxReport};

use crate::models::{Event, MarketState};
use crate::rules::{RulesEngine, StrategyConfig};
use serde::{Deserialize, Serialize};

/// One step of a replay run: the rule decisions the engine would have
/// made under `config` for this event's `data_context`, versus what
/// actually happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayStep {
    pub event_id: String,
    pub event_type: String,
    pub replayed_actions: Vec<String>,
    pub original_action: Option<String>,
    pub matched: bool,
    pub replayable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayReport {
    pub steps: Vec<ReplayStep>,
    pub decisions: usize,
    pub mismatches: usize,
    pub non_replayable: usize,
    pub fidelity_score: f64,
}

/// Re-evaluates a historical event sequence through the rules engine
/// under a `StrategyConfig` overlay. Each event's payload is expected to
/// carry a `data_context` object convertible into a `MarketState`; events
/// missing one are flagged non-replayable and excluded from the fidelity
/// score, which otherwise is `1 - mismatches / decisions`.
pub struct Replay {
    rules: RulesEngine,
}

impl Replay {
    pub fn new() -> Self {
        Self { rules: RulesEngine::new() }
    }

    pub fn run(&self, events: &[Event], config: &StrategyConfig) -> ReplayReport {
        let mut steps = Vec::with_capacity(events.len());
        let mut decisions = 0usize;
        let mut mismatches = 0usize;
        let mut non_replayable = 0usize;

        for event in events {
            let Some(data_context) = event.payload.get("data_context") else {
                steps.push(ReplayStep {
                    event_id: event.id.clone(),
                    event_type: event.event_type.as_str().to_string(),
                    replayed_actions: Vec::new(),
                    original_action: None,
                    matched: false,
                    replayable: false,
                });
                non_replayable += 1;
                continue;
            };

            let state: MarketState = match serde_json::from_value(data_context.clone()) {
                Ok(state) => state,
                Err(_) => {
                    steps.push(ReplayStep {
                        event_id: event.id.clone(),
                        event_type: event.event_type.as_str().to_string(),
                        replayed_actions: Vec::new(),
                        original_action: None,
                        matched: false,
                        replayable: false,
                    });
                    non_replayable += 1;
                    continue;
                }
            };

            let replayed_actions: Vec<String> = self
                .rules
                .evaluate_with_config(&state, config)
                .into_iter()
                .map(|a| a.action_type)
                .collect();

            let original_action = event
                .payload
                .get("action_type")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());

            let matched = match &original_action {
                Some(original) => replayed_actions.iter().any(|a| a == original),
                None => replayed_actions.is_empty(),
            };

            decisions += 1;
            if !matched {
                mismatches += 1;
            }

            steps.push(ReplayStep {
                event_id: event.id.clone(),
                event_type: event.event_type.as_str().to_string(),
                replayed_actions,
                original_action,
                matched,
                replayable: true,
            });
        }

        let fidelity_score = if decisions == 0 { 1.0 } else { 1.0 - (mismatches as f64 / decisions as f64) };

        ReplayReport { steps, decisions, mismatches, non_replayable, fidelity_score }
    }
}

impl Default for Replay {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventType;

    fn event_with_context(action_type: Option<&str>, state: &MarketState) -> Event {
        let mut payload = serde_json::json!({
            "data_context": serde_json::to_value(state).unwrap(),
        });
        if let Some(action) = action_type {
            payload["action_type"] = serde_json::json!(action);
        }
        Event {
            id: uuid::Uuid::new_v4().to_string(),
            event_type: EventType::RuleActionProposed,
            source: "rules_engine".to_string(),
            payload,
            timestamp: crate::time::now(),
        }
    }

    #[test]
    fn perfect_replay_scores_full_fidelity() {
        let mut state = MarketState::default();
        state.shock_score = 3.0;
        let event = event_with_context(Some("enable_risk_throttle"), &state);

        let replay = Replay::new();
        let report = replay.run(&[event], &StrategyConfig::default());
        assert_eq!(report.decisions, 1);
        assert_eq!(report.mismatches, 0);
        assert_eq!(report.fidelity_score, 1.0);
    }

    #[test]
    fn mismatched_original_action_lowers_fidelity() {
        let mut state = MarketState::default();
        state.shock_score = 3.0;
        let event = event_with_context(Some("rotate_to_stables_only"), &state);

        let replay = Replay::new();
        let report = replay.run(&[event], &StrategyConfig::default());
        assert_eq!(report.mismatches, 1);
        assert_eq!(report.fidelity_score, 0.0);
    }

    #[test]
    fn missing_data_context_is_flagged_non_replayable() {
        let event = Event {
            id: uuid::Uuid::new_v4().to_string(),
            event_type: EventType::OrderSent,
            source: "router".to_string(),
            payload: serde_json::json!({}),
            timestamp: crate::time::now(),
        };

        let replay = Replay::new();
        let report = replay.run(&[event], &StrategyConfig::default());
        assert_eq!(report.non_replayable, 1);
        assert_eq!(report.decisions, 0);
        assert_eq!(report.fidelity_score, 1.0);
    }
}
