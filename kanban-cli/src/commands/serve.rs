//! HTTP server command
//!
//! Runs the kanban API against PostgreSQL, or an in-memory store with `--memory`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use kanban_server::store::KanbanStore;
use kanban_server::{run_server, AppState, MemoryStore, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default: 127.0.0.1:3030)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Keep everything in memory; data is lost on exit. Ignores the database URL
    #[arg(long)]
    pub memory: bool,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,
}

impl ServeArgs {
    /// Overlay command-line flags on the loaded configuration.
    pub fn apply(&self, config: &mut ServerConfig) {
        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(url) = &self.database_url {
            config.database_url = Some(url.clone());
        }
        if self.cors_permissive {
            config.cors_permissive = true;
        }
    }
}

/// Run the HTTP server until Ctrl+C/SIGTERM.
pub async fn run_serve(args: ServeArgs, mut config: ServerConfig) -> Result<()> {
    args.apply(&mut config);

    let store: Arc<dyn KanbanStore> = if args.memory {
        tracing::warn!("serving from memory; nothing is persisted");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(super::connect(&config).await?)
    };

    tracing::info!(bind = %config.bind_addr, memory = args.memory, "starting kanban server");
    run_server(Arc::new(AppState::new(store)), &config)
        .await
        .context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = ServeArgs::try_parse_from([
            "serve",
            "--bind",
            "0.0.0.0:8080",
            "--cors-permissive",
        ])
        .unwrap();
        let mut config = ServerConfig::default();

        args.apply(&mut config);
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert!(config.cors_permissive);
        assert_eq!(config.max_connections, ServerConfig::default().max_connections);
    }

    #[test]
    fn memory_flag_parses() {
        let args = ServeArgs::try_parse_from(["serve", "--memory"]).unwrap();
        assert!(args.memory);
        assert!(args.bind.is_none());
    }
}
