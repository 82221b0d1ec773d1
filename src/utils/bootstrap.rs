//! Shared bootstrap utilities for the binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LOG_ENV_VAR;

/// Initialize tracing with the ORDERSTREAM_LOG environment variable.
///
/// Defaults to "info" level if ORDERSTREAM_LOG is not set.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Connect to PostgreSQL with exponential backoff retry.
#[cfg(feature = "postgres")]
pub async fn connect_postgres(
    config: &crate::config::PostgresConfig,
) -> Result<sqlx::PgPool, crate::storage::StorageError> {
    use std::time::Duration;

    use backon::Retryable;
    use sqlx::postgres::PgPoolOptions;
    use tracing::{info, warn};

    use crate::utils::retry::connection_backoff;

    let pool = (|| async {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.uri)
            .await
    })
    .retry(connection_backoff())
    .notify(|err: &sqlx::Error, dur: Duration| {
        warn!(error = %err, delay = ?dur, "PostgreSQL connection failed, retrying");
    })
    .await?;

    info!(max_connections = config.max_connections, "Connected to PostgreSQL");
    Ok(pool)
}
