//! Paper executor: fills immediately at the router-resolved price and
//! maintains position arithmetic per the documented VWAP/flip/partial-close
//! rules (§4.7).

use super::{Executor, ExecutionError, OrderAck};
use crate::models::{Position, Side};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

pub struct PaperExecutor {
    positions: Mutex<HashMap<(String, String), Position>>,
}

impl PaperExecutor {
    pub fn new() -> Self {
        Self { positions: Mutex::new(HashMap::new()) }
    }

    /// Applies a fill at `price` to the position at `(venue, market)`,
    /// following the documented VWAP-on-add / reset-on-flip / preserve-on-
    /// partial-close rules, and returns a synthetic fill ack.
    pub fn fill(&self, venue: &str, market: &str, side: Side, size: f64, price: f64) -> OrderAck {
        let signed = side.signed(size);
        let key = (venue.to_string(), market.to_string());
        let mut positions = self.positions.lock();

        let (old_size, old_entry) = positions
            .get(&key)
            .map(|p| (p.signed_size, p.entry_price))
            .unwrap_or((0.0, 0.0));

        let new_size = old_size + signed;

        if new_size.abs() < 1e-12 {
            positions.remove(&key);
        } else {
            let same_sign = old_size == 0.0 || old_size.signum() == signed.signum();
            let new_entry = if same_sign {
                (old_size.abs() * old_entry + signed.abs() * price) / new_size.abs()
            } else if new_size.abs() >= old_size.abs() {
                price
            } else {
                old_entry
            };
            positions.insert(
                key.clone(),
                Position {
                    venue: venue.to_string(),
                    market: market.to_string(),
                    signed_size: new_size,
                    entry_price: new_entry,
                    pnl: 0.0,
                    margin: positions.get(&key).map(|p| p.margin).unwrap_or(0.0),
                    liq_price: positions.get(&key).and_then(|p| p.liq_price),
                },
            );
        }

        OrderAck {
            order_id: format!("paper:{}", Uuid::new_v4()),
            filled_price: price,
            filled_size: size,
        }
    }
}

impl Default for PaperExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Executor for PaperExecutor {
    fn name(&self) -> &str {
        "paper"
    }

    async fn place_order(&self, market: &str, side: Side, size: f64, price: Option<f64>) -> Result<OrderAck, ExecutionError> {
        let price = price.ok_or_else(|| ExecutionError::Venue("paper executor requires a resolved price".to_string()))?;
        Ok(self.fill("paper", market, side, size, price))
    }

    async fn cancel_order(&self, _id: &str) -> Result<(), ExecutionError> {
        // Paper fills are immediate and synchronous; there is nothing in
        // flight to cancel once place_order has returned.
        Ok(())
    }

    fn get_positions(&self) -> Vec<Position> {
        self.positions.lock().values().cloned().collect()
    }
}
