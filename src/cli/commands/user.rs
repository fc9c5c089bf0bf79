use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;
use dialoguer::{Input, Password};

use super::{connect, required};
use crate::config::Config;

#[derive(Args)]
pub struct UserCommands {
    #[command(subcommand)]
    pub command: UserSubcommands,
}

#[derive(Subcommand)]
pub enum UserSubcommands {
    /// Create a new user; the password is always prompted
    Create {
        /// Login name (prompted if omitted)
        #[arg(long)]
        username: Option<String>,
        /// Name shown next to questions and answers (prompted if omitted)
        #[arg(long)]
        display_name: Option<String>,
    },
}

pub async fn user_command(args: UserCommands, config: &Config) -> Result<()> {
    match args.command {
        UserSubcommands::Create {
            username,
            display_name,
        } => create_user(username, display_name, config).await,
    }
}

async fn create_user(
    username: Option<String>,
    display_name: Option<String>,
    config: &Config,
) -> Result<()> {
    let username = match username {
        Some(username) => username,
        None => Input::<String>::new().with_prompt("Username").interact_text()?,
    };
    let username = required("Username", &username)?;

    let display_name = match display_name {
        Some(display_name) => display_name,
        None => Input::<String>::new()
            .with_prompt("Display name")
            .with_initial_text(username.clone())
            .interact_text()?,
    };
    let display_name = required("Display name", &display_name)?;

    let password = Password::new()
        .with_prompt("Password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()?;
    anyhow::ensure!(!password.is_empty(), "Password must not be empty");

    let api = connect(config)?;
    if api.get_user_by_username(&username).await?.is_some() {
        println!(
            "{} User '{}' already exists",
            "✗".bright_red().bold(),
            username.bright_yellow().bold()
        );
        anyhow::bail!("User '{}' already exists", username);
    }

    let id = api.create_user(&username, &display_name, &password).await?;
    println!(
        "{} User '{}' created as {} {}",
        "✓".bright_green().bold(),
        username.bright_yellow().bold(),
        display_name.bright_white(),
        format!("({})", id).dimmed()
    );
    Ok(())
}
