use anyhow::Result;
use colored::*;
use log::info;

use super::connect;
use crate::config::Config;

pub async fn install_command(config: &Config) -> Result<()> {
    let api = connect(config)?;
    info!("Installing database '{}' on {}", api.database(), config.server_url);

    match api.install().await {
        Ok(()) => {
            println!(
                "{} Database '{}' is ready on {}",
                "✓".bright_green().bold(),
                api.database().bright_yellow().bold(),
                config.server_url.dimmed()
            );
            Ok(())
        }
        Err(err) => {
            println!("{} Installation failed: {}", "✗".bright_red().bold(), err);
            Err(err.into())
        }
    }
}
