//! Hyperliquid perp ingestor. The only continuous (WebSocket-shaped) job:
//! `run_once` itself drives a reconnect loop with exponential backoff
//! (1s initial, capped at 60s), mirroring the host project's
//! `scrapers::dome_websocket` reconnect shape. Writes perp price,
//! funding, and a top-of-book snapshot on every simulated "tick".

use super::{Backoff, Cadence, IngestJob};
use crate::bus::EventBus;
use crate::models::{FundingTick, OrderbookSnap, PriceTick};
use crate::store::{Store, StoreExt};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;

pub const MARKETS: &[&str] = &["BTC-PERP", "ETH-PERP"];
/// How long a connection stays up before the synthetic stream "drops"
/// and the reconnect loop kicks in. Real deployments would drive this
/// off socket-close events instead of a timer.
const SIMULATED_SESSION_S: u64 = 5 * 60;
const TICK_PERIOD_S: u64 = 5;

#[async_trait]
pub trait HyperliquidFetcher: Send + Sync {
    /// One logical "tick" of the connected feed: price, funding rate,
    /// and a synthetic top-of-book for `market`.
    async fn tick(&self, market: &str) -> anyhow::Result<(f64, f64, OrderbookSnap)>;
}

pub struct SyntheticFetcher;

#[async_trait]
impl HyperliquidFetcher for SyntheticFetcher {
    async fn tick(&self, market: &str) -> anyhow::Result<(f64, f64, OrderbookSnap)> {
        let base = if market.starts_with("BTC") {
            65_005.0
        } else {
            3_200.5
        };
        let t = crate::time::now().timestamp() as f64;
        let price = base * (1.0 + (t / 520.0).sin() * 0.0032);
        let funding_rate = (t / 3700.0).cos() * 0.00025;
        let spread = price * 0.0002;
        let book = OrderbookSnap {
            venue: "hyperliquid".to_string(),
            market: market.to_string(),
            bids: vec![(price - spread, 5.0), (price - spread * 2.0, 8.0)],
            asks: vec![(price + spread, 5.0), (price + spread * 2.0, 8.0)],
            timestamp: crate::time::now(),
        };
        Ok((price, funding_rate, book))
    }
}

pub struct HyperliquidJob {
    fetcher: Box<dyn HyperliquidFetcher>,
    markets: Vec<String>,
}

impl HyperliquidJob {
    pub fn new() -> Self {
        Self {
            fetcher: Box::new(SyntheticFetcher),
            markets: MARKETS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_fetcher(mut self, fetcher: Box<dyn HyperliquidFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    async fn write_tick(&self, store: &dyn Store, market: &str) -> anyhow::Result<()> {
        let (price, funding_rate, book) = self.fetcher.tick(market).await?;
        let price_tick = PriceTick {
            symbol: market.to_string(),
            venue: "hyperliquid".to_string(),
            price,
            confidence: 0.95,
            timestamp: crate::time::now(),
        };
        store.set_typed(
            &format!("price:hyperliquid:{market}"),
            &price_tick,
            Some((TICK_PERIOD_S * 6) as i64),
        );
        let funding = FundingTick {
            venue: "hyperliquid".to_string(),
            market: market.to_string(),
            funding_rate,
            timestamp: crate::time::now(),
        };
        store.set_typed("funding:hyperliquid", &funding, Some((TICK_PERIOD_S * 10) as i64));
        store.set_typed(
            &format!("orderbook:hyperliquid:{market}"),
            &book,
            Some((TICK_PERIOD_S * 4) as i64),
        );
        Ok(())
    }

    /// One simulated connection: ticks every `TICK_PERIOD_S` until the
    /// simulated session lifetime elapses or shutdown fires, then returns
    /// an error so the outer reconnect loop backs off and retries.
    async fn run_session(
        &self,
        store: &dyn Store,
        shutdown: &mut watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let mut ticker = tokio::time::interval(Duration::from_secs(TICK_PERIOD_S));
        let deadline = tokio::time::Instant::now() + Duration::from_secs(SIMULATED_SESSION_S);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if tokio::time::Instant::now() >= deadline {
                        anyhow::bail!("simulated hyperliquid session expired, reconnecting");
                    }
                    for market in &self.markets {
                        if let Err(e) = self.write_tick(store, market).await {
                            tracing::warn!(market, error = %e, "hyperliquid tick write failed");
                        }
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return Ok(());
                    }
                }
            }
        }
    }
}

impl Default for HyperliquidJob {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IngestJob for HyperliquidJob {
    fn name(&self) -> &'static str {
        "hyperliquid"
    }

    fn cadence(&self) -> Cadence {
        Cadence::Continuous
    }

    async fn run_once(
        &self,
        store: &dyn Store,
        _bus: &EventBus,
        shutdown: &mut watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let mut backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(60));
        loop {
            match self.run_session(store, shutdown).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(error = %e, "hyperliquid session ended; reconnecting with backoff");
                    let delay = backoff.next_delay();
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = shutdown.changed() => {
                            if *shutdown.borrow() {
                                return Ok(());
                            }
                        }
                    }
                }
            }
            if *shutdown.borrow() {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn a_single_tick_writes_price_funding_and_book() {
        let job = HyperliquidJob::new();
        let store = InMemoryStore::new();
        job.write_tick(&store, "BTC-PERP").await.unwrap();
        let price: Option<PriceTick> = store.get_typed("price:hyperliquid:BTC-PERP");
        assert!(price.is_some());
        let book: Option<OrderbookSnap> = store.get_typed("orderbook:hyperliquid:BTC-PERP");
        assert!(book.is_some());
    }
}
