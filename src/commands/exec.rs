//! Run a whitelisted command through the secure executor.

use std::time::Duration;

use clap::Args;

use galaxy_core::config::AppConfig;
use galaxy_core::error::AppError;
use galaxy_executor::{CommandPolicy, SecureExecutor};

/// Arguments for the exec command
#[derive(Debug, Args)]
pub struct ExecArgs {
    /// Requested timeout in milliseconds, clamped to the command's ceiling
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// List the whitelisted commands and exit
    #[arg(long)]
    pub list: bool,

    /// Command name followed by its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Execute the exec command, printing the captured output as JSON
pub async fn execute(args: &ExecArgs, config: &AppConfig) -> Result<(), AppError> {
    let policy = CommandPolicy::default_whitelist(config.executor.max_argument_length);

    if args.list {
        for name in policy.commands() {
            println!("{name}");
        }
        return Ok(());
    }

    let executor = SecureExecutor::new(policy, &config.executor)?;
    let (name, rest) = args
        .command
        .split_first()
        .ok_or_else(|| AppError::validation("Empty command"))?;

    let output = executor
        .execute_with_timeout(name, rest, args.timeout_ms.map(Duration::from_millis))
        .await?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
