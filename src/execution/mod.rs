//! Execution gateway: the `Executor` contract, the risk-enforcing
//! `ExecutionRouter` decision procedure (§4.7), the paper executor, and
//! the live venue adapters.

mod live;
mod paper;

pub use live::{DriftExecutor, HyperliquidExecutor};
pub use paper::PaperExecutor;

use crate::agents::ExecutionAgent;
use crate::bus::EventBus;
use crate::models::{Config, DataQuality, ExecutionMode, Position, Side};
use crate::risk::{ProposedAction, RiskEngine};
use crate::store::{Store, StoreExt};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Priority order for resolving a price authority reading (§4.7 step 1).
const PRICE_AUTHORITY_VENUES: &[&str] = &["pyth", "kraken", "coingecko"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: String,
    pub filled_price: f64,
    pub filled_size: f64,
}

#[derive(thiserror::Error, Debug)]
pub enum ExecutionError {
    #[error("venue error: {0}")]
    Venue(String),
    #[error("unknown market {0}")]
    UnknownMarket(String),
}

/// Every executor — paper or live — satisfies this contract.
#[async_trait]
pub trait Executor: Send + Sync {
    fn name(&self) -> &str;
    async fn place_order(&self, market: &str, side: Side, size: f64, price: Option<f64>) -> Result<OrderAck, ExecutionError>;
    async fn cancel_order(&self, id: &str) -> Result<(), ExecutionError>;
    fn get_positions(&self) -> Vec<Position>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    PaperFilled,
    Blocked,
    AgentBlocked,
    Error,
    PaperFallback,
    LiveOk,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResult {
    pub status: OrderStatus,
    pub reasons: Vec<String>,
    pub order_id: Option<String>,
    pub filled_price: Option<f64>,
    pub data_quality: DataQuality,
}

#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub venue: String,
    pub market: String,
    pub side: Side,
    pub size: f64,
    pub margin: f64,
}

/// Reads the best available authoritative price for `market` across
/// `PRICE_AUTHORITY_VENUES`, in priority order, rejecting stale snapshots.
fn resolve_price_authority(
    store: &dyn Store,
    market: &str,
    freshness_threshold_s: i64,
) -> Option<(f64, bool)> {
    for venue in PRICE_AUTHORITY_VENUES {
        let key = format!("price:{venue}:{market}");
        if let Some(tick) = store.get_typed::<crate::models::PriceTick>(&key) {
            if tick.price <= 0.0 {
                continue;
            }
            let age = crate::time::age_seconds(tick.timestamp, crate::time::now());
            let stale = age > freshness_threshold_s;
            return Some((tick.price, stale));
        }
    }
    None
}

/// Resolves whether `price:integrity` reads WARNING, defaulting to OK
/// when the key is absent (no ingestor has raised a concern).
fn integrity_is_warning(store: &dyn Store) -> bool {
    store
        .get("price:integrity")
        .and_then(|v| v.get("status").and_then(|s| s.as_str().map(|s| s.to_string())))
        .map(|s| s == "WARNING")
        .unwrap_or(false)
}

/// The risk-enforcing router: resolves a price authority, checks
/// freshness/integrity, runs the guardrail engine, and on live mode the
/// pre-trade agent gate, before dispatching to paper or a live executor.
pub struct ExecutionRouter {
    config: Config,
    risk: Arc<RiskEngine>,
    execution_agent: ExecutionAgent,
    paper: PaperExecutor,
    live: HashMap<String, Arc<dyn Executor>>,
}

impl ExecutionRouter {
    pub fn new(config: Config, risk: Arc<RiskEngine>) -> Self {
        Self {
            config,
            risk,
            execution_agent: ExecutionAgent::new(),
            paper: PaperExecutor::new(),
            live: HashMap::new(),
        }
    }

    pub fn register_live_executor(&mut self, venue: &str, executor: Arc<dyn Executor>) {
        self.live.insert(venue.to_string(), executor);
    }

    pub async fn route_order(
        &self,
        store: &dyn Store,
        bus: &EventBus,
        positions: &[Position],
        request: OrderRequest,
    ) -> OrderResult {
        let data_context = serde_json::json!({
            "venue": request.venue,
            "market": request.market,
            "side": request.side,
            "size": request.size,
        });

        let Some((price, stale)) = resolve_price_authority(store, &request.market, self.config.price_freshness_threshold_s) else {
            bus.emit(crate::models::EventType::TradeBlockedStaleData, "router", data_context.clone());
            return OrderResult {
                status: OrderStatus::Blocked,
                reasons: vec!["No price data".to_string()],
                order_id: None,
                filled_price: None,
                data_quality: DataQuality::Degraded,
            };
        };

        let mut data_quality = DataQuality::Ok;
        if stale {
            if self.config.execution_mode == ExecutionMode::Live {
                bus.emit(crate::models::EventType::TradeBlockedStaleData, "router", data_context.clone());
                return OrderResult {
                    status: OrderStatus::Blocked,
                    reasons: vec!["stale price data".to_string()],
                    order_id: None,
                    filled_price: None,
                    data_quality: DataQuality::Degraded,
                };
            }
            data_quality = DataQuality::Degraded;
            bus.emit(crate::models::EventType::TradeDegradedData, "router", data_context.clone());
        }

        if integrity_is_warning(store) {
            if self.config.execution_mode == ExecutionMode::Live && self.config.price_integrity_block_live {
                bus.emit(crate::models::EventType::TradeBlockedStaleData, "router", data_context.clone());
                return OrderResult {
                    status: OrderStatus::Blocked,
                    reasons: vec!["price integrity warning".to_string()],
                    order_id: None,
                    filled_price: None,
                    data_quality: DataQuality::Degraded,
                };
            }
            data_quality = DataQuality::Degraded;
        }

        let proposed = ProposedAction {
            venue: request.venue.clone(),
            market: request.market.clone(),
            side: request.side,
            size: request.size,
            margin: request.margin,
        };
        let check = self.risk.check_constraints(positions, &proposed, self.config.execution_mode);
        if !check.allowed {
            bus.emit(crate::models::EventType::RiskThrottleOn, "router", serde_json::json!({
                "reasons": check.reasons,
            }));
            return OrderResult {
                status: OrderStatus::Blocked,
                reasons: check.reasons,
                order_id: None,
                filled_price: None,
                data_quality,
            };
        }

        if self.config.execution_mode == ExecutionMode::Live {
            let pre_trade = self.execution_agent.pre_trade_check(&request.market, request.side, request.size, price, store);
            if !pre_trade.allowed {
                bus.emit(crate::models::EventType::AgentBlocked, "router", serde_json::json!({
                    "reasons": pre_trade.reasons,
                }));
                return OrderResult {
                    status: OrderStatus::AgentBlocked,
                    reasons: pre_trade.reasons,
                    order_id: None,
                    filled_price: None,
                    data_quality,
                };
            }
        }

        if self.config.execution_mode == ExecutionMode::Paper {
            return self.dispatch_paper(bus, &request, price, data_quality, &data_context, OrderStatus::PaperFilled).await;
        }

        match self.live.get(&request.venue) {
            Some(executor) => match executor.place_order(&request.market, request.side, request.size, Some(price)).await {
                Ok(ack) => {
                    bus.emit(crate::models::EventType::OrderSent, "router", data_context.clone());
                    bus.emit(crate::models::EventType::OrderFilled, "router", serde_json::json!({
                        "order_id": ack.order_id,
                        "price": ack.filled_price,
                    }));
                    OrderResult {
                        status: OrderStatus::LiveOk,
                        reasons: Vec::new(),
                        order_id: Some(ack.order_id),
                        filled_price: Some(ack.filled_price),
                        data_quality,
                    }
                }
                Err(e) => {
                    tracing::warn!(venue = %request.venue, error = %e, "live executor failed, falling back to paper");
                    self.dispatch_paper(bus, &request, price, data_quality, &data_context, OrderStatus::PaperFallback).await
                }
            },
            None => {
                tracing::warn!(venue = %request.venue, "no live executor registered, falling back to paper");
                self.dispatch_paper(bus, &request, price, data_quality, &data_context, OrderStatus::PaperFallback).await
            }
        }
    }

    /// Fills via the paper executor. `status` distinguishes a genuine
    /// paper-mode fill (`PaperFilled`) from a live-mode request that fell
    /// back to paper because no live executor was registered or the live
    /// executor raised (`PaperFallback`) — §4.7 step 8 / §7's status set.
    async fn dispatch_paper(
        &self,
        bus: &EventBus,
        request: &OrderRequest,
        price: f64,
        data_quality: DataQuality,
        data_context: &serde_json::Value,
        status: OrderStatus,
    ) -> OrderResult {
        bus.emit(crate::models::EventType::OrderSent, "router", data_context.clone());
        let fill = self.paper.fill(&request.venue, &request.market, request.side, request.size, price);
        bus.emit(crate::models::EventType::OrderFilled, "router", serde_json::json!({
            "order_id": fill.order_id,
            "price": fill.filled_price,
            "data_context": data_context,
        }));
        OrderResult {
            status,
            reasons: Vec::new(),
            order_id: Some(fill.order_id),
            filled_price: Some(fill.filled_price),
            data_quality,
        }
    }

    pub fn paper_positions(&self) -> Vec<Position> {
        self.paper.get_positions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventBus;
    use crate::models::PriceTick;
    use crate::risk::RiskLimits;
    use crate::store::InMemoryStore;

    fn test_config() -> Config {
        Config {
            database_url: None,
            redis_url: None,
            execution_mode: ExecutionMode::Paper,
            max_leverage: 3.0,
            max_margin_usage: 0.6,
            max_daily_loss: 500.0,
            cooldown_seconds: 300,
            wits_countries: vec![],
            wits_products: vec![],
            gdelt_keywords: vec![],
            price_freshness_threshold_s: 30,
            price_integrity_block_live: true,
            adaptive_weights: false,
            log_level: "info".to_string(),
        }
    }

    fn write_price(store: &InMemoryStore, venue: &str, market: &str, price: f64) {
        let tick = PriceTick {
            symbol: market.to_string(),
            venue: venue.to_string(),
            price,
            confidence: 0.9,
            timestamp: crate::time::now(),
        };
        store.set_typed(&format!("price:{venue}:{market}"), &tick, Some(60));
    }

    #[tokio::test]
    async fn paper_mode_fills_with_available_price() {
        let store = InMemoryStore::new();
        write_price(&store, "pyth", "BTC-PERP", 65_000.0);
        let bus = EventBus::in_memory(100);
        let config = test_config();
        let risk = Arc::new(RiskEngine::new(RiskLimits::from(&config)));
        let router = ExecutionRouter::new(config, risk);

        let request = OrderRequest {
            venue: "hyperliquid".to_string(),
            market: "BTC-PERP".to_string(),
            side: Side::Buy,
            size: 0.1,
            margin: 100.0,
        };
        let result = router.route_order(&store, &bus, &[], request).await;
        assert_eq!(result.status, OrderStatus::PaperFilled);
        assert!(result.order_id.is_some());
    }

    #[tokio::test]
    async fn missing_price_blocks_with_stale_data_reason() {
        let store = InMemoryStore::new();
        let bus = EventBus::in_memory(100);
        let config = test_config();
        let risk = Arc::new(RiskEngine::new(RiskLimits::from(&config)));
        let router = ExecutionRouter::new(config, risk);

        let request = OrderRequest {
            venue: "hyperliquid".to_string(),
            market: "ETH-PERP".to_string(),
            side: Side::Buy,
            size: 0.1,
            margin: 100.0,
        };
        let result = router.route_order(&store, &bus, &[], request).await;
        assert_eq!(result.status, OrderStatus::Blocked);
        assert!(result.reasons.iter().any(|r| r.contains("No price data")));
    }

    #[tokio::test]
    async fn live_mode_without_registered_executor_falls_back_to_paper() {
        let store = InMemoryStore::new();
        write_price(&store, "pyth", "BTC-PERP", 65_000.0);
        let bus = EventBus::in_memory(100);
        let mut config = test_config();
        config.execution_mode = ExecutionMode::Live;
        let risk = Arc::new(RiskEngine::new(RiskLimits::from(&config)));
        let router = ExecutionRouter::new(config, risk);

        let request = OrderRequest {
            venue: "hyperliquid".to_string(),
            market: "BTC-PERP".to_string(),
            side: Side::Buy,
            size: 0.1,
            margin: 100.0,
        };
        let result = router.route_order(&store, &bus, &[], request).await;
        assert_eq!(result.status, OrderStatus::PaperFallback);
        assert!(result.order_id.is_some());
    }
}
