//! Risk & guardrail engine (§4.6): the hard pre-trade gate
//! (`checkConstraints`) plus a secondary, position-sizing-oriented
//! guardrail layer (`kelly_var`) that feeds sizing inputs upstream of
//! the hard gate, grounded in the host project's `risk.rs`
//! `KellyCalculator`/`VaRCalculator`/drawdown-throttle machinery.

pub mod kelly_var;

use crate::models::{Config, ExecutionMode, Position, RiskState, Side};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct ProposedAction {
    pub venue: String,
    pub market: String,
    pub side: Side,
    pub size: f64,
    pub margin: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConstraintCheck {
    pub allowed: bool,
    pub reasons: Vec<String>,
    pub is_reducing: bool,
    pub projected_leverage: f64,
}

/// Guardrail limits, environment-derived per §6.
#[derive(Debug, Clone)]
pub struct RiskLimits {
    pub max_leverage: f64,
    pub max_margin_usage: f64,
    pub max_daily_loss: f64,
    pub cooldown_seconds: i64,
}

impl From<&Config> for RiskLimits {
    fn from(config: &Config) -> Self {
        Self {
            max_leverage: config.max_leverage,
            max_margin_usage: config.max_margin_usage,
            max_daily_loss: config.max_daily_loss,
            cooldown_seconds: config.cooldown_seconds,
        }
    }
}

/// The guardrail engine. Owns `RiskState` (throttle, daily PnL,
/// last-action cooldown clock) behind a mutex so `checkConstraints` can
/// be called from any task without external synchronization.
pub struct RiskEngine {
    limits: RiskLimits,
    state: Mutex<RiskState>,
}

impl RiskEngine {
    pub fn new(limits: RiskLimits) -> Self {
        Self {
            limits,
            state: Mutex::new(RiskState::default()),
        }
    }

    pub fn state(&self) -> RiskState {
        self.roll_daily_pnl_if_needed();
        self.state.lock().clone()
    }

    pub fn set_throttle(&self, active: bool, reason: &str) {
        let mut state = self.state.lock();
        state.throttle_active = active;
        state.throttle_reason = if active { reason.to_string() } else { String::new() };
    }

    pub fn record_pnl(&self, delta: f64) {
        self.roll_daily_pnl_if_needed();
        self.state.lock().daily_pnl += delta;
    }

    /// Lazily resets `daily_pnl` on UTC date rollover, observed on the
    /// first read or write of the new day (§3 invariant).
    fn roll_daily_pnl_if_needed(&self) {
        let now = crate::time::now();
        let mut state = self.state.lock();
        if crate::time::is_new_utc_day(&state.daily_pnl_reset_date, now) {
            state.daily_pnl = 0.0;
            state.daily_pnl_reset_date = crate::time::date_string_of(now);
        }
    }

    fn is_reducing(positions: &[Position], proposed: &ProposedAction) -> bool {
        positions.iter().any(|p| {
            p.venue == proposed.venue
                && p.market == proposed.market
                && p.signed_size != 0.0
                && p.signed_size.signum() != proposed.side.signed(1.0).signum()
        })
    }

    pub fn check_constraints(
        &self,
        positions: &[Position],
        proposed: &ProposedAction,
        execution_mode: ExecutionMode,
    ) -> ConstraintCheck {
        self.roll_daily_pnl_if_needed();

        let is_reducing = Self::is_reducing(positions, proposed);
        let proposed_notional = proposed.size.abs() * 1.0; // sized in notional units by caller
        let current_notional: f64 = positions.iter().map(|p| p.signed_size.abs()).sum();
        let projected_notional = if is_reducing {
            (current_notional - proposed_notional).max(0.0)
        } else {
            current_notional + proposed_notional
        };

        let total_margin: f64 = positions.iter().map(|p| p.margin).sum();
        let equity = total_margin.max(1.0);
        let projected_leverage = projected_notional / equity;

        let mut reasons = Vec::new();
        let state = self.state.lock().clone();

        if state.throttle_active && !is_reducing {
            reasons.push(format!("risk throttle active: {}", state.throttle_reason));
        }
        if !is_reducing && projected_leverage > self.limits.max_leverage {
            reasons.push(format!(
                "projected leverage {:.2} exceeds max {:.2}",
                projected_leverage, self.limits.max_leverage
            ));
        }
        if !is_reducing && (total_margin + proposed.margin) / equity > self.limits.max_margin_usage {
            reasons.push(format!(
                "projected margin usage exceeds max {:.2}",
                self.limits.max_margin_usage
            ));
        }
        if state.daily_pnl < -self.limits.max_daily_loss && !is_reducing {
            reasons.push(format!(
                "daily loss {:.2} breaches max {:.2}",
                state.daily_pnl, self.limits.max_daily_loss
            ));
        }
        if execution_mode == ExecutionMode::Live && !is_reducing {
            let elapsed = crate::time::age_seconds(state.last_action_ts, crate::time::now());
            if elapsed < self.limits.cooldown_seconds {
                reasons.push(format!(
                    "cooldown active: {}s elapsed of {}s",
                    elapsed, self.limits.cooldown_seconds
                ));
            }
        }

        let allowed = reasons.is_empty();
        if allowed {
            self.state.lock().last_action_ts = crate::time::now();
        }

        ConstraintCheck {
            allowed,
            reasons,
            is_reducing,
            projected_leverage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_limits() -> RiskLimits {
        RiskLimits {
            max_leverage: 3.0,
            max_margin_usage: 0.6,
            max_daily_loss: 500.0,
            cooldown_seconds: 300,
        }
    }

    fn position(venue: &str, market: &str, signed_size: f64, margin: f64) -> Position {
        Position {
            venue: venue.to_string(),
            market: market.to_string(),
            signed_size,
            entry_price: 150.0,
            pnl: 0.0,
            margin,
            liq_price: None,
        }
    }

    #[test]
    fn spec_scenario_6_reducing_allowed_new_short_blocked() {
        let engine = RiskEngine::new(default_limits());
        engine.set_throttle(true, "shock spike");
        engine.record_pnl(-600.0);

        let positions = vec![position("hyperliquid", "BTC", 2.0, 100.0)];
        let reduce = ProposedAction {
            venue: "hyperliquid".to_string(),
            market: "BTC".to_string(),
            side: Side::Sell,
            size: 1.0,
            margin: 0.0,
        };
        let check = engine.check_constraints(&positions, &reduce, ExecutionMode::Paper);
        assert!(check.allowed, "reducing should bypass throttle/daily-loss: {:?}", check.reasons);

        let new_short = ProposedAction {
            venue: "hyperliquid".to_string(),
            market: "ETH".to_string(),
            side: Side::Sell,
            size: 10.0,
            margin: 50.0,
        };
        let check = engine.check_constraints(&[], &new_short, ExecutionMode::Paper);
        assert!(!check.allowed);
        assert!(check.reasons.iter().any(|r| r.contains("leverage")));
    }

    #[test]
    fn paper_mode_never_applies_cooldown() {
        let engine = RiskEngine::new(default_limits());
        let action = ProposedAction {
            venue: "hyperliquid".to_string(),
            market: "BTC".to_string(),
            side: Side::Buy,
            size: 0.1,
            margin: 1.0,
        };
        assert!(engine.check_constraints(&[], &action, ExecutionMode::Paper).allowed);
        // Immediately repeat: live mode would be blocked by cooldown, paper never is.
        assert!(engine.check_constraints(&[], &action, ExecutionMode::Paper).allowed);
    }

    #[test]
    fn live_mode_enforces_cooldown_on_nonreducing_actions() {
        let engine = RiskEngine::new(default_limits());
        let action = ProposedAction {
            venue: "hyperliquid".to_string(),
            market: "BTC".to_string(),
            side: Side::Buy,
            size: 0.1,
            margin: 1.0,
        };
        assert!(engine.check_constraints(&[], &action, ExecutionMode::Live).allowed);
        let second = engine.check_constraints(&[], &action, ExecutionMode::Live);
        assert!(!second.allowed);
        assert!(second.reasons.iter().any(|r| r.contains("cooldown")));
    }

    #[test]
    fn daily_pnl_resets_on_utc_rollover() {
        let engine = RiskEngine::new(default_limits());
        engine.record_pnl(-1000.0);
        {
            let mut state = engine.state.lock();
            state.daily_pnl_reset_date = "2000-01-01".to_string();
        }
        let state = engine.state();
        assert_eq!(state.daily_pnl, 0.0);
    }
}
