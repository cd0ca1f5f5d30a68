//! GDELT news ingestor. Fetch cadence: 5 min. Writes raw article counts
//! and tone observations under `news:raw` for the shock-score analytics
//! module to consume.
//!
//! GDELT's real API returns a CSV export whose `tone` column layout is
//! inferred, not normative (§9 open question). The shipped fetcher
//! generates synthetic but shape-correct observations and documents the
//! assumed column order below rather than depending on network
//! reachability in tests.

use super::{Cadence, IngestJob};
use crate::bus::EventBus;
use crate::store::{Store, StoreExt};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;

/// Assumed GDELT CSV column order: `GlobalEventId,SqlDate,...,AvgTone`.
/// `article_count` is the number of matching rows for the configured
/// keyword set in the lookback window; `mean_tone` is the average of the
/// `AvgTone` column across those rows (negative tone is coverage hostile
/// to the keyword set).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsObservation {
    pub article_count: u64,
    pub mean_tone: f64,
}

#[async_trait]
pub trait GdeltFetcher: Send + Sync {
    async fn fetch(&self, keywords: &[String]) -> anyhow::Result<NewsObservation>;
}

pub struct SyntheticFetcher;

#[async_trait]
impl GdeltFetcher for SyntheticFetcher {
    async fn fetch(&self, keywords: &[String]) -> anyhow::Result<NewsObservation> {
        let seed: u64 = keywords.iter().map(|k| k.len() as u64).sum();
        Ok(NewsObservation {
            article_count: 5 + (seed * 7) % 200,
            mean_tone: -2.0 + ((seed % 40) as f64 / 10.0),
        })
    }
}

pub struct GdeltJob {
    fetcher: Box<dyn GdeltFetcher>,
    keywords: Vec<String>,
}

impl GdeltJob {
    pub fn new(keywords: Vec<String>) -> Self {
        Self {
            fetcher: Box::new(SyntheticFetcher),
            keywords,
        }
    }

    pub fn with_fetcher(mut self, fetcher: Box<dyn GdeltFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }
}

#[async_trait]
impl IngestJob for GdeltJob {
    fn name(&self) -> &'static str {
        "gdelt"
    }

    fn cadence(&self) -> Cadence {
        Cadence::Interval(Duration::from_secs(5 * 60))
    }

    async fn run_once(
        &self,
        store: &dyn Store,
        _bus: &EventBus,
        _shutdown: &mut watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let obs = self.fetcher.fetch(&self.keywords).await?;
        store.set_typed("news:raw", &obs, Some(5 * 60 * 6));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn writes_news_raw_snapshot() {
        let job = GdeltJob::new(vec!["tariff".into()]);
        let store = InMemoryStore::new();
        let bus = EventBus::in_memory(16);
        let (_tx, mut rx) = watch::channel(false);
        job.run_once(&store, &bus, &mut rx).await.unwrap();
        let v: Option<NewsObservation> = store.get_typed("news:raw");
        assert!(v.is_some());
    }
}
