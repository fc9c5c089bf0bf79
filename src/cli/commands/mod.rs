pub mod config;
pub mod install;
pub mod lecture;
pub mod tui;
pub mod user;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::{CouchClient, QandaApi};
use crate::config::Config;

pub use config::config_command;
pub use install::install_command;
pub use lecture::lecture_command;
pub use tui::tui_command;
pub use user::user_command;

/// Build the domain API for the configured server and database.
pub(crate) fn connect(config: &Config) -> Result<QandaApi> {
    let client = CouchClient::new(&config.server_url, config.settings.request_timeout())
        .context("Failed to build HTTP client")?;
    Ok(QandaApi::new(Arc::new(client), config.database.clone()))
}

/// Trim `value`, rejecting it when nothing is left.
pub(crate) fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    anyhow::ensure!(!trimmed.is_empty(), "{} must not be empty", field);
    Ok(trimmed.to_string())
}
