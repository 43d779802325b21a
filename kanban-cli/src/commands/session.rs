//! Bearer token issuing

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use kanban_core::Email;
use kanban_server::{sessions, ServerConfig};

#[derive(Parser, Debug)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommands,
}

#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// Issue a bearer token for an existing user and print it
    Issue {
        #[arg(long)]
        email: String,

        /// Days until the token expires; omit for a token that never expires
        #[arg(long)]
        ttl_days: Option<u32>,
    },
}

pub async fn run_session(args: SessionArgs, config: &ServerConfig) -> Result<()> {
    match args.command {
        SessionCommands::Issue { email, ttl_days } => {
            let email = Email::new(&email).context("Invalid email")?;
            let store = super::connect(config).await?;

            let session = sessions::issue(&store, &email, ttl_days)
                .await
                .with_context(|| format!("Failed to issue a session for {}", email.as_str()))?;

            println!("{}", session.token);
            Ok(())
        }
    }
}
