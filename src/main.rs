//! Process entrypoint: wires the explicit dependency graph (§9 design
//! notes forbid process-wide singletons) and drives the ingest
//! scheduler until shutdown. HTTP/WebSocket route adapters are out of
//! scope for this binary (§1) — it owns only the signal & decision core
//! and the execution gateway, and exists so the core can run standalone
//! (e.g. under an external HTTP layer attached via the library crate).

use riskdesk_backend::bus::{EventBus, InMemoryEventLog, SqliteEventLog};
use riskdesk_backend::execution::{DriftExecutor, ExecutionRouter, HyperliquidExecutor};
use riskdesk_backend::ingest::{
    coingecko::CoingeckoJob, drift::DriftJob, gdelt::GdeltJob, hyperliquid::HyperliquidJob,
    kraken::KrakenJob, pyth::PythJob, wits::WitsJob, Scheduler,
};
use riskdesk_backend::models::Config;
use riskdesk_backend::risk::{RiskEngine, RiskLimits};
use riskdesk_backend::store::InMemoryStore;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(&config.log_level);

    tracing::info!(
        execution_mode = config.execution_mode.as_str(),
        max_leverage = config.max_leverage,
        "starting risk desk core"
    );

    let store: Arc<InMemoryStore> = Arc::new(InMemoryStore::new());

    let bus = Arc::new(match &config.database_url {
        Some(path) => match SqliteEventLog::open(path) {
            Ok(log) => {
                tracing::info!(path, "event log backed by sqlite");
                EventBus::new(Box::new(log))
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to open sqlite event log, falling back to in-memory");
                EventBus::new(Box::new(InMemoryEventLog::new(100_000)))
            }
        },
        None => EventBus::new(Box::new(InMemoryEventLog::new(100_000))),
    });

    let risk = Arc::new(RiskEngine::new(RiskLimits::from(&config)));

    let mut router = ExecutionRouter::new(config.clone(), risk.clone());
    if let Ok(api_key) = std::env::var("HYPERLIQUID_API_KEY") {
        router.register_live_executor("hyperliquid", Arc::new(HyperliquidExecutor::new(api_key)));
    }
    if let Ok(rpc_url) = std::env::var("DRIFT_RPC_URL") {
        router.register_live_executor("drift", Arc::new(DriftExecutor::new(rpc_url)));
    }
    let _router = Arc::new(router);

    let jobs: Vec<Arc<dyn riskdesk_backend::ingest::IngestJob>> = vec![
        Arc::new(WitsJob::new(config.wits_countries.clone(), config.wits_products.clone())),
        Arc::new(GdeltJob::new(config.gdelt_keywords.clone())),
        Arc::new(PythJob::new()),
        Arc::new(KrakenJob::new()),
        Arc::new(CoingeckoJob::new()),
        Arc::new(DriftJob::new()),
        Arc::new(HyperliquidJob::new()),
    ];
    let scheduler = Scheduler::new(jobs);
    let handles = scheduler.spawn_all(store.clone(), bus.clone());

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received, stopping ingest jobs");
    scheduler.shutdown();
    for handle in handles {
        let _ = handle.await;
    }

    Ok(())
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("riskdesk_backend={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
