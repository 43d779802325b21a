//! Schema migration command

use anyhow::Result;

use kanban_server::ServerConfig;

/// Create any missing tables and indexes, then exit.
pub async fn run_migrate(config: &ServerConfig) -> Result<()> {
    super::connect(config).await?;
    println!("Database schema is up to date");
    Ok(())
}
