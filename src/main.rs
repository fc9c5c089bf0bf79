use anyhow::Result;
use clap::Parser;
use log::info;

use lecture_qanda::cli::commands::{
    config_command, install_command, lecture_command, tui_command, user_command,
};
use lecture_qanda::cli::{Cli, Commands};
use lecture_qanda::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger to file (truncate on each run); the TUI owns the terminal
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("lecture-qanda.log")?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    dotenvy::dotenv().ok();
    let config = Config::load()?;

    let cli = Cli::parse();
    info!("Starting lecture-qanda {}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(Commands::Install) => install_command(&config).await,
        Some(Commands::Lecture(args)) => lecture_command(args, &config).await,
        Some(Commands::User(args)) => user_command(args, &config).await,
        Some(Commands::Config(args)) => config_command(args, &config).await,
        Some(Commands::Tui) | None => tui_command(&config).await,
    }
}
