//! User profile administration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use kanban_core::Email;
use kanban_server::store::KanbanStore;
use kanban_server::ServerConfig;

#[derive(Parser, Debug)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommands,
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Create a user profile
    Add {
        /// Email address, used to invite the user to boards
        #[arg(long)]
        email: String,

        /// Display name
        #[arg(long)]
        name: Option<String>,
    },
}

pub async fn run_user(args: UserArgs, config: &ServerConfig) -> Result<()> {
    match args.command {
        UserCommands::Add { email, name } => {
            let email = Email::new(&email).context("Invalid email")?;
            let store = super::connect(config).await?;

            let profile = store
                .create_profile(&email, name.as_deref())
                .await
                .with_context(|| format!("Failed to create user {}", email.as_str()))?;

            println!("{}\t{}", profile.id, profile.email);
            Ok(())
        }
    }
}
