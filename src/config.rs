use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::tui::theme::ThemeVariant;

pub const SERVER_URL_ENV: &str = "QANDA_SERVER_URL";
pub const DATABASE_ENV: &str = "QANDA_DATABASE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_question_reload_interval_ms")]
    pub question_reload_interval_ms: u64,
    #[serde(default = "default_answer_reload_interval_ms")]
    pub answer_reload_interval_ms: u64,
    #[serde(default)]
    pub theme: ThemeVariant,
}

fn default_server_url() -> String {
    "http://127.0.0.1:5984".to_string()
}

fn default_database() -> String {
    "hci-qanda".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_question_reload_interval_ms() -> u64 {
    5000
}

fn default_answer_reload_interval_ms() -> u64 {
    2500
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            database: default_database(),
            settings: Settings::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            question_reload_interval_ms: default_question_reload_interval_ms(),
            answer_reload_interval_ms: default_answer_reload_interval_ms(),
            theme: ThemeVariant::default(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn question_reload_interval(&self) -> Duration {
        Duration::from_millis(self.question_reload_interval_ms)
    }

    pub fn answer_reload_interval(&self) -> Duration {
        Duration::from_millis(self.answer_reload_interval_ms)
    }

    /// Timeouts and reload intervals must be positive.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("request_timeout_secs", self.request_timeout_secs),
            ("question_reload_interval_ms", self.question_reload_interval_ms),
            ("answer_reload_interval_ms", self.answer_reload_interval_ms),
        ] {
            anyhow::ensure!(value > 0, "'{}' must be greater than zero", key);
        }
        Ok(())
    }
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            // XDG config directory on Linux
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("lecture-qanda")
        } else {
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".lecture-qanda")
        };

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
            info!("Created config directory: {:?}", config_dir);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load the config file and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::get_config_path()?)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        debug!("Loading config from: {:?}", config_path);

        if !config_path.exists() {
            info!("Config file doesn't exist, using defaults");
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: Config = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
        config
            .settings
            .validate()
            .with_context(|| format!("Invalid settings in config file: {:?}", config_path))?;

        debug!("Loaded config for {} / {}", config.server_url, config.database);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        debug!("Saving config to: {:?}", config_path);

        let config_content =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(config_path, config_content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        info!("Config saved successfully");
        Ok(())
    }

    /// Override the server URL and database from `lookup` (the process
    /// environment in production). Blank values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_blank = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = non_blank(SERVER_URL_ENV) {
            debug!("Server URL overridden by {}", SERVER_URL_ENV);
            self.server_url = url;
        }
        if let Some(database) = non_blank(DATABASE_ENV) {
            debug!("Database overridden by {}", DATABASE_ENV);
            self.database = database;
        }
    }
}

/// Keys accepted by [`Config::get`] and [`Config::set`].
pub const KEYS: [&str; 6] = [
    "server_url",
    "database",
    "request_timeout_secs",
    "question_reload_interval_ms",
    "answer_reload_interval_ms",
    "theme",
];

impl Config {
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "server_url" => self.server_url.clone(),
            "database" => self.database.clone(),
            "request_timeout_secs" => self.settings.request_timeout_secs.to_string(),
            "question_reload_interval_ms" => self.settings.question_reload_interval_ms.to_string(),
            "answer_reload_interval_ms" => self.settings.answer_reload_interval_ms.to_string(),
            "theme" => self.settings.theme.to_string(),
            _ => return None,
        };
        Some(value)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        let number = || -> Result<u64> {
            let parsed: u64 = value
                .parse()
                .with_context(|| format!("'{}' expects a whole number, got '{}'", key, value))?;
            anyhow::ensure!(parsed > 0, "'{}' must be greater than zero", key);
            Ok(parsed)
        };

        match key {
            "server_url" | "database" => {
                anyhow::ensure!(!value.is_empty(), "'{}' must not be empty", key);
                if key == "server_url" {
                    self.server_url = value.to_string();
                } else {
                    self.database = value.to_string();
                }
            }
            "request_timeout_secs" => self.settings.request_timeout_secs = number()?,
            "question_reload_interval_ms" => self.settings.question_reload_interval_ms = number()?,
            "answer_reload_interval_ms" => self.settings.answer_reload_interval_ms = number()?,
            "theme" => self.settings.theme = value.parse()?,
            _ => anyhow::bail!("Unknown setting '{}'. Known settings: {}", key, KEYS.join(", ")),
        }
        Ok(())
    }
}
