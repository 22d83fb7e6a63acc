//! Information display handlers

use crate::cli::output::print_config;
use crate::AppConfig;
use crate::Result;

pub async fn handle_config_command(config: &AppConfig) -> Result<()> {
    print_config(&config.redacted());
    Ok(())
}
