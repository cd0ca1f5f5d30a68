//! WITS tariff ingestor. Fetch cadence: 6h. Writes a normalized `IndexTick`
//! components map under `tariff:raw` (consumed by the tariff-index
//! analytics module, which owns the actual weighting/normalization).
//!
//! The real WITS API is a tariff-schedule REST service keyed by
//! country/product pair; it is the out-of-scope HTTP collaborator per
//! §1. `SyntheticFetcher` stands in for it so the scheduler, store and
//! analytics layers have something deterministic to drive in tests.

use super::{Cadence, IngestJob};
use crate::bus::EventBus;
use crate::store::{Store, StoreExt};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::watch;

/// A single country×product tariff rate observation.
#[derive(Debug, Clone)]
pub struct TariffRate {
    pub country: String,
    pub product: String,
    pub rate_pct: f64,
}

/// Abstraction over the WITS HTTP client so tests can inject canned
/// responses instead of reaching the network.
#[async_trait]
pub trait WitsFetcher: Send + Sync {
    async fn fetch(&self, countries: &[String], products: &[String]) -> anyhow::Result<Vec<TariffRate>>;
}

/// Deterministic stand-in: derives a stable rate per (country, product)
/// pair from a hash of their names, so repeated runs are reproducible
/// without a live API.
pub struct SyntheticFetcher;

#[async_trait]
impl WitsFetcher for SyntheticFetcher {
    async fn fetch(&self, countries: &[String], products: &[String]) -> anyhow::Result<Vec<TariffRate>> {
        let mut out = Vec::with_capacity(countries.len() * products.len());
        for country in countries {
            for product in products {
                let h = seed_hash(&format!("{country}:{product}"));
                let rate_pct = 2.0 + (h % 4000) as f64 / 100.0; // 2.0 .. 42.0
                out.push(TariffRate {
                    country: country.clone(),
                    product: product.clone(),
                    rate_pct,
                });
            }
        }
        Ok(out)
    }
}

fn seed_hash(s: &str) -> u64 {
    // FNV-1a; stable across runs, no external dependency needed.
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in s.bytes() {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

pub struct WitsJob {
    fetcher: Box<dyn WitsFetcher>,
    countries: Vec<String>,
    products: Vec<String>,
}

impl WitsJob {
    pub fn new(countries: Vec<String>, products: Vec<String>) -> Self {
        Self {
            fetcher: Box::new(SyntheticFetcher),
            countries,
            products,
        }
    }

    pub fn with_fetcher(mut self, fetcher: Box<dyn WitsFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }
}

#[async_trait]
impl IngestJob for WitsJob {
    fn name(&self) -> &'static str {
        "wits"
    }

    fn cadence(&self) -> Cadence {
        Cadence::Interval(Duration::from_secs(6 * 3600))
    }

    async fn run_once(
        &self,
        store: &dyn Store,
        _bus: &EventBus,
        _shutdown: &mut watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let rates = self.fetcher.fetch(&self.countries, &self.products).await?;
        let mut by_pair: HashMap<String, f64> = HashMap::new();
        for r in &rates {
            by_pair.insert(format!("{}:{}", r.country, r.product), r.rate_pct);
        }
        // TTL is 10x the 6h fetch period: tariff schedules barely move.
        store.set_typed("tariff:raw", &by_pair, Some(6 * 3600 * 10));
        Ok(())
    }
}
