use anyhow::Result;

use super::connect;
use crate::config::Config;

pub async fn tui_command(config: &Config) -> Result<()> {
    let api = connect(config)?;
    crate::tui::launch(api, config.settings.clone()).await
}
