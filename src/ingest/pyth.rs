//! Pyth price ingestor. Fetch cadence: 30s. Writes `PriceTick`s under
//! `price:pyth:<symbol>`. Pyth is the first venue consulted by the
//! router's price-authority resolution (§4.7), so its freshness directly
//! gates live trading.

use super::{Cadence, IngestJob};
use crate::bus::EventBus;
use crate::models::PriceTick;
use crate::store::{Store, StoreExt};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;

pub const SYMBOLS: &[&str] = &["BTC", "ETH", "SOL"];
const FETCH_PERIOD_S: i64 = 30;

#[async_trait]
pub trait PriceFetcher: Send + Sync {
    async fn fetch(&self, symbol: &str) -> anyhow::Result<(f64, f64)>;
}

/// Deterministic synthetic price generator: a slow sinusoid plus a small
/// amount of jitter keyed off wall-clock seconds, so successive polls
/// move but stay bounded.
pub struct SyntheticFetcher {
    pub base_prices: std::collections::HashMap<&'static str, f64>,
}

impl Default for SyntheticFetcher {
    fn default() -> Self {
        let mut base_prices = std::collections::HashMap::new();
        base_prices.insert("BTC", 65_000.0);
        base_prices.insert("ETH", 3_200.0);
        base_prices.insert("SOL", 140.0);
        Self { base_prices }
    }
}

#[async_trait]
impl PriceFetcher for SyntheticFetcher {
    async fn fetch(&self, symbol: &str) -> anyhow::Result<(f64, f64)> {
        let base = *self.base_prices.get(symbol).unwrap_or(&100.0);
        let t = crate::time::now().timestamp() as f64;
        let wobble = (t / 600.0).sin() * 0.004;
        Ok((base * (1.0 + wobble), 0.98))
    }
}

pub struct PythJob {
    fetcher: Box<dyn PriceFetcher>,
    symbols: Vec<String>,
}

impl PythJob {
    pub fn new() -> Self {
        Self {
            fetcher: Box::new(SyntheticFetcher::default()),
            symbols: SYMBOLS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_fetcher(mut self, fetcher: Box<dyn PriceFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }
}

impl Default for PythJob {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IngestJob for PythJob {
    fn name(&self) -> &'static str {
        "pyth"
    }

    fn cadence(&self) -> Cadence {
        Cadence::Interval(Duration::from_secs(FETCH_PERIOD_S as u64))
    }

    async fn run_once(
        &self,
        store: &dyn Store,
        _bus: &EventBus,
        _shutdown: &mut watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        for symbol in &self.symbols {
            let (price, confidence) = self.fetcher.fetch(symbol).await?;
            let tick = PriceTick {
                symbol: symbol.clone(),
                venue: "pyth".to_string(),
                price,
                confidence,
                timestamp: crate::time::now(),
            };
            store.set_typed(
                &format!("price:pyth:{symbol}"),
                &tick,
                Some(FETCH_PERIOD_S * 4),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn writes_a_tick_per_symbol() {
        let job = PythJob::new();
        let store = InMemoryStore::new();
        let bus = EventBus::in_memory(16);
        let (_tx, mut rx) = watch::channel(false);
        job.run_once(&store, &bus, &mut rx).await.unwrap();
        let tick: Option<PriceTick> = store.get_typed("price:pyth:BTC");
        assert!(tick.is_some());
        assert!(tick.unwrap().price > 0.0);
    }
}
