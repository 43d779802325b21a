//! Command implementations for the kanban CLI

pub mod migrate;
pub mod serve;
pub mod session;
pub mod user;

pub use migrate::run_migrate;
pub use serve::run_serve;
pub use session::run_session;
pub use user::run_user;

use anyhow::{Context, Result};

use kanban_server::db::{self, migrations};
use kanban_server::{PgStore, ServerConfig};

/// Connect to PostgreSQL and bring the schema up to date.
pub(crate) async fn connect(config: &ServerConfig) -> Result<PgStore> {
    let database_url = config.database_url.as_deref().context(
        "DATABASE_URL not set. Set via --database-url, DATABASE_URL env, .env or the config file",
    )?;

    let pool = db::connect(database_url, config.max_connections)
        .await
        .context("Failed to create database pool")?;
    migrations::run(&pool)
        .await
        .context("Failed to run migrations")?;

    Ok(PgStore::new(pool))
}
