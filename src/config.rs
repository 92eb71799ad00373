use crate::events::Identity;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::time::Duration;

pub const DEFAULT_GREETING: &str = "Hi! I'm D-Bot, your smart event assistant. \n\nI can help you find upcoming events, check schedules, or answer questions about the venue.";
pub const PERSONALIZED_GREETING: &str = "Hi {name}! I'm D-Bot, your smart event assistant. \n\nI can help you find upcoming events, check schedules, or answer questions about the venue.";

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base url of the QA service; requests go to `{api_url}/ai/chat`
    pub api_url: String,

    /// Seconds before a QA request is abandoned
    pub request_timeout_secs: u64,

    pub typing: TypingConfig,

    pub greeting: GreetingConfig,

    /// Signed-in user forwarded with every request
    pub user: Option<Identity>,
}

/// Greeting reveal settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingConfig {
    pub enabled: bool,
    pub interval_ms: u64,
}

/// Greeting texts; `{name}` in `personalized` becomes the user's display name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GreetingConfig {
    pub default: String,
    pub personalized: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 30,
            typing: TypingConfig::default(),
            greeting: GreetingConfig::default(),
            user: None,
        }
    }
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 30,
        }
    }
}

impl Default for GreetingConfig {
    fn default() -> Self {
        Self {
            default: DEFAULT_GREETING.to_string(),
            personalized: PERSONALIZED_GREETING.to_string(),
        }
    }
}

impl Config {
    /// `~/.dbot`
    pub fn home_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".dbot"))
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("config.toml"))
    }

    /// Load `~/.dbot/config.toml` if it exists, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::default_path()?)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from a specific file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Apply `DBOT_API_URL` and `DBOT_TIMEOUT_SECS` from the given lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DBOT_API_URL").filter(|url| !url.trim().is_empty()) {
            self.api_url = url;
        }
        if let Some(raw) = lookup("DBOT_TIMEOUT_SECS") {
            match raw.trim().parse() {
                Ok(secs) => self.request_timeout_secs = secs,
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid DBOT_TIMEOUT_SECS"),
            }
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::default_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn typing_interval(&self) -> Duration {
        Duration::from_millis(self.typing.interval_ms.max(1))
    }
}
