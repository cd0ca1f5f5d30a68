//! Ingest scheduler: one independent periodic task per named job. A
//! failing job is caught and logged at its own call site and never stops
//! the others — mirrors the host project's per-source resilience
//! (`scrapers::dome_websocket`'s reconnect loop, `DataSourceKillSwitch`
//! in `main.rs`) generalized into a scheduler instead of one-off tasks.

pub mod coingecko;
pub mod drift;
pub mod gdelt;
pub mod hyperliquid;
pub mod kraken;
pub mod pyth;
pub mod wits;

use crate::bus::EventBus;
use crate::store::Store;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// How a job is driven by the scheduler.
#[derive(Debug, Clone, Copy)]
pub enum Cadence {
    /// Run `run_once` on a fixed interval.
    Interval(Duration),
    /// `run_once` itself owns a reconnect loop; the scheduler just spawns
    /// it once and leaves it running until shutdown.
    Continuous,
}

#[async_trait]
pub trait IngestJob: Send + Sync {
    fn name(&self) -> &'static str;
    fn cadence(&self) -> Cadence;

    /// Perform one fetch-and-write cycle (or, for `Cadence::Continuous`
    /// jobs, run until `shutdown` fires). Errors are caught by the
    /// scheduler and logged — this never stops sibling jobs.
    async fn run_once(
        &self,
        store: &dyn Store,
        bus: &EventBus,
        shutdown: &mut watch::Receiver<bool>,
    ) -> anyhow::Result<()>;
}

/// Exponential backoff capped at `max`, doubling from `initial` on every
/// failure and resetting to `initial` on success. Grounded in the host
/// project's WebSocket reconnect loops (1s initial, capped at 30-60s).
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: initial,
        }
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }
}

/// Drives a fixed set of `IngestJob`s, one `tokio::spawn` task each.
pub struct Scheduler {
    jobs: Vec<Arc<dyn IngestJob>>,
    shutdown_tx: watch::Sender<bool>,
}

impl Scheduler {
    pub fn new(jobs: Vec<Arc<dyn IngestJob>>) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self { jobs, shutdown_tx }
    }

    /// Spawn every job on its own task. Returns the join handles so a
    /// caller who wants to wait on them can.
    pub fn spawn_all(
        &self,
        store: Arc<dyn Store>,
        bus: Arc<EventBus>,
    ) -> Vec<tokio::task::JoinHandle<()>> {
        self.jobs
            .iter()
            .cloned()
            .map(|job| {
                let store = store.clone();
                let bus = bus.clone();
                let mut shutdown_rx = self.shutdown_tx.subscribe();
                tokio::spawn(async move {
                    match job.cadence() {
                        Cadence::Interval(period) => {
                            let mut ticker = tokio::time::interval(period);
                            loop {
                                tokio::select! {
                                    _ = ticker.tick() => {
                                        if let Err(e) = job.run_once(store.as_ref(), bus.as_ref(), &mut shutdown_rx).await {
                                            tracing::warn!(job = job.name(), error = %e, "ingest job failed; will retry next tick");
                                        }
                                    }
                                    _ = shutdown_rx.changed() => {
                                        if *shutdown_rx.borrow() {
                                            break;
                                        }
                                    }
                                }
                            }
                        }
                        Cadence::Continuous => {
                            if let Err(e) = job.run_once(store.as_ref(), bus.as_ref(), &mut shutdown_rx).await {
                                tracing::warn!(job = job.name(), error = %e, "continuous ingest job exited with error");
                            }
                        }
                    }
                })
            })
            .collect()
    }

    /// Signal every job to stop. Jobs honor this at their next select
    /// point; callers that need a hard bound should race this against a
    /// timeout on the join handles.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let mut b = Backoff::new(Duration::from_secs(1), Duration::from_secs(60));
        assert_eq!(b.next_delay(), Duration::from_secs(1));
        assert_eq!(b.next_delay(), Duration::from_secs(2));
        assert_eq!(b.next_delay(), Duration::from_secs(4));
        for _ in 0..10 {
            b.next_delay();
        }
        assert_eq!(b.next_delay(), Duration::from_secs(60));
    }

    #[test]
    fn backoff_resets_to_initial() {
        let mut b = Backoff::new(Duration::from_secs(1), Duration::from_secs(60));
        b.next_delay();
        b.next_delay();
        b.reset();
        assert_eq!(b.next_delay(), Duration::from_secs(1));
    }
}
