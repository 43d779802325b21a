//! kanban CLI - runs and administers the kanban board server
//!
//! - `serve`: HTTP API over PostgreSQL (or `--memory`)
//! - `migrate`: create the database schema
//! - `user add`: create a user profile
//! - `session issue`: mint a bearer token for a user

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use kanban_server::ServerConfig;

mod commands;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "kanban",
    author,
    version,
    about = "Kanban board server: boards, columns, cards, members, comments and activity"
)]
struct Cli {
    /// Enable debug logging (RUST_LOG still wins)
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces over OTLP (requires the `telemetry` feature)
    #[arg(long, global = true)]
    otel: bool,

    /// Config file (default: ~/.config/kanban/config.toml)
    #[arg(long, global = true, value_name = "PATH", env = "KANBAN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Create or update the database schema
    Migrate,
    /// Manage user profiles
    User(commands::user::UserArgs),
    /// Issue bearer tokens
    Session(commands::session::SessionArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real environment variables take precedence
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let _tracing = tracing_setup::init(cli.debug, cli.otel)?;

    let config = ServerConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args, config).await,
        Commands::Migrate => commands::run_migrate(&config).await,
        Commands::User(args) => commands::run_user(args, &config).await,
        Commands::Session(args) => commands::run_session(args, &config).await,
    }
}
