//! orderstream: order ingestion service
//!
//! Consumes orders from Kafka, stores them in PostgreSQL and serves lookups
//! over HTTP from an in-memory cache warmed at startup.
//!
//! ```text
//! [Kafka topic] -> [OrderConsumer] -> [OrderService] -> [PostgreSQL]
//!                                          ^
//!                                          |
//!                  [HTTP GET /orders/:uid] + [cache]
//! ```
//!
//! ## Configuration
//! - `config.yaml`, `ORDERSTREAM_CONFIG`, or a path as the first argument
//! - `ORDERSTREAM__SECTION__KEY` environment overrides
//! - `ORDERSTREAM_LOG`: tracing filter (default: info)

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use orderstream::bus::{KafkaOrderSource, KafkaSourceConfig, OrderConsumer};
use orderstream::cache::{InMemoryOrderCache, OrderCache};
use orderstream::config::Config;
use orderstream::handlers;
use orderstream::services::OrderService;
use orderstream::storage::postgres::run_migrations;
use orderstream::storage::{OrderStore, PostgresOrderStore};
use orderstream::utils::bootstrap::{connect_postgres, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config_path = std::env::args().nth(1);
    let config = Config::load(config_path.as_deref()).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Starting orderstream");

    let pool = connect_postgres(&config.postgres).await?;
    if config.postgres.run_migrations {
        run_migrations(&pool).await?;
        info!("Database migrations applied");
    }

    let store: Arc<dyn OrderStore> = Arc::new(PostgresOrderStore::new(pool.clone()));
    let cache: Arc<dyn OrderCache> = Arc::new(InMemoryOrderCache::new());
    let service = Arc::new(OrderService::new(store, cache));

    match service.warm_cache().await {
        Ok(count) => info!(count, "Cache recovered from storage"),
        Err(e) => warn!(error = %e, "Started with empty cache"),
    }

    let source = KafkaOrderSource::new(&KafkaSourceConfig::from(&config.kafka))?;
    let consumer = OrderConsumer::new(Arc::new(source), service.clone());

    let shutdown = CancellationToken::new();
    let consumer_task = tokio::spawn({
        let cancel = shutdown.child_token();
        async move { consumer.run(cancel).await }
    });

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            wait_for_signal().await;
            info!("Shutdown signal received");
            shutdown.cancel();
        }
    });

    let served = handlers::serve(
        service,
        &config.server.bind_addr(),
        config.server.assets_dir(),
        shutdown.clone(),
    )
    .await;
    if let Err(e) = &served {
        error!(error = %e, "HTTP server failed");
    }
    shutdown.cancel();

    match tokio::time::timeout(config.server.shutdown_timeout(), consumer_task).await {
        Ok(Ok(stats)) => info!(
            persisted = stats.persisted,
            skipped = stats.skipped,
            commit_failures = stats.commit_failures,
            "Consumer drained"
        ),
        Ok(Err(e)) => error!(error = %e, "Consumer task failed"),
        Err(_) => warn!(
            timeout_secs = config.server.shutdown_timeout_secs,
            "Consumer did not stop before shutdown timeout"
        ),
    }

    pool.close().await;
    info!("orderstream stopped");
    served?;
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM.
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
