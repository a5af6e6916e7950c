//! Generate a password that satisfies the configured policy.

use clap::Args;

use galaxy_auth::{PasswordValidator, generate_valid_password};
use galaxy_core::config::AppConfig;
use galaxy_core::error::AppError;

/// Arguments for the generate-password command
#[derive(Debug, Args)]
pub struct GeneratePasswordArgs {
    /// Number of characters
    #[arg(short, long, default_value_t = 20)]
    pub length: usize,
}

/// Print a generated password and its strength report as JSON.
pub async fn execute(args: &GeneratePasswordArgs, config: &AppConfig) -> Result<(), AppError> {
    let validator = PasswordValidator::from_config(&config.auth);
    let password = generate_valid_password(&validator, args.length)?;
    let report = validator.assess(&password);

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "password": password,
            "strength": report,
        }))?
    );
    Ok(())
}
