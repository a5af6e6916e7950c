//! CLI command definitions and dispatch.

pub mod exec;
pub mod migrate;
pub mod password;
pub mod purge;
pub mod serve;

use clap::{Parser, Subcommand};

use galaxy_core::config::AppConfig;
use galaxy_core::error::AppError;

/// Galaxy authentication and command execution service
#[derive(Debug, Parser)]
#[command(name = "galaxy-server", version, about, long_about = None)]
pub struct Cli {
    /// Path to the base configuration file
    #[arg(short, long, env = "GALAXY_CONFIG", default_value = "config/default.toml")]
    pub config: String,

    /// Environment overlay loaded from `config/{env}.toml`
    #[arg(short, long, env = "GALAXY_ENV", default_value = "development")]
    pub env: String,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve(serve::ServeArgs),
    /// Run one whitelisted command through the secure executor
    Exec(exec::ExecArgs),
    /// Delete refresh tokens that are both expired and revoked
    PurgeTokens,
    /// Apply pending database migrations
    Migrate,
    /// Generate a password accepted by the configured policy
    GeneratePassword(password::GeneratePasswordArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Serve(args) => serve::execute(args, config).await,
            Commands::Exec(args) => exec::execute(args, &config).await,
            Commands::PurgeTokens => purge::execute(&config).await,
            Commands::Migrate => migrate::execute(&config).await,
            Commands::GeneratePassword(args) => password::execute(args, &config).await,
        }
    }
}
