//! PostgreSQL pool construction
//!
//! The URL is parsed up front so a malformed `DATABASE_URL` fails before any
//! connection attempt, and so the target can be logged without the password.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

/// Pool size when the config does not set `max_connections`.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// How long a request may wait for a free connection
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Idle connections above the minimum are closed after this long
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

fn pool_options(max_connections: u32) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .idle_timeout(IDLE_TIMEOUT)
}

/// Connect with at most `max_connections` (clamped to at least one).
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let options = PgConnectOptions::from_str(database_url)?;
    tracing::debug!(
        host = options.get_host(),
        port = options.get_port(),
        database = ?options.get_database(),
        max_connections,
        "connecting to postgres"
    );

    pool_options(max_connections).connect_with(options).await
}

/// Connect with [`DEFAULT_MAX_CONNECTIONS`].
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    connect(database_url, DEFAULT_MAX_CONNECTIONS).await
}
