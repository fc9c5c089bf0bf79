use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;

use super::{connect, required};
use crate::config::Config;

#[derive(Args)]
pub struct LectureCommands {
    #[command(subcommand)]
    pub command: LectureSubcommands,
}

#[derive(Subcommand)]
pub enum LectureSubcommands {
    /// Create a new lecture
    Create {
        /// Lecture name
        name: String,
    },
}

pub async fn lecture_command(args: LectureCommands, config: &Config) -> Result<()> {
    match args.command {
        LectureSubcommands::Create { name } => create_lecture(&name, config).await,
    }
}

async fn create_lecture(name: &str, config: &Config) -> Result<()> {
    let name = required("Lecture name", name)?;
    let api = connect(config)?;

    let id = api.create_lecture(&name).await?;
    println!(
        "{} Lecture '{}' created {}",
        "✓".bright_green().bold(),
        name.bright_yellow().bold(),
        format!("({})", id).dimmed()
    );
    Ok(())
}
