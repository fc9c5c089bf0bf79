use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;

use crate::config::{Config, DATABASE_ENV, KEYS, SERVER_URL_ENV};

#[derive(Args)]
pub struct ConfigCommands {
    #[command(subcommand)]
    pub command: ConfigSubcommands,
}

#[derive(Subcommand)]
pub enum ConfigSubcommands {
    /// Show the effective configuration
    Show,
    /// Print the path of the configuration file
    Path,
    /// Change a setting and save the configuration file
    Set {
        /// Setting name
        key: String,
        /// New value
        value: String,
    },
}

pub async fn config_command(args: ConfigCommands, config: &Config) -> Result<()> {
    match args.command {
        ConfigSubcommands::Show => show(config),
        ConfigSubcommands::Path => {
            println!("{}", Config::get_config_path()?.display());
            Ok(())
        }
        ConfigSubcommands::Set { key, value } => set(&key, &value),
    }
}

fn show(config: &Config) -> Result<()> {
    println!();
    println!("  {}", "Configuration:".bright_white().bold());
    for key in KEYS {
        let value = config.get(key).unwrap_or_default();
        println!("    {:<28} {}", key.bright_cyan(), value);
    }
    println!();
    println!(
        "  {}",
        format!("{} and {} override the file.", SERVER_URL_ENV, DATABASE_ENV).dimmed()
    );
    Ok(())
}

fn set(key: &str, value: &str) -> Result<()> {
    // Edit the file contents, not the environment-overridden view.
    let path = Config::get_config_path()?;
    let mut config = Config::load_from(&path)?;

    if let Err(err) = config.set(key, value) {
        println!("{} {}", "✗".bright_red().bold(), err);
        return Err(err);
    }
    config.save_to(&path)?;

    println!(
        "{} {} = {}",
        "✓".bright_green().bold(),
        key.bright_cyan(),
        config.get(key).unwrap_or_default().bright_yellow().bold()
    );
    Ok(())
}
