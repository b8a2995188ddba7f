use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::store::json_store::JsonStore;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_autosave_delay_secs")]
    pub autosave_delay_secs: u64,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_show_keyboard")]
    pub show_keyboard: bool,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub sync_url: Option<String>,
    #[serde(default)]
    pub sync_token: Option<String>,
    #[serde(default = "default_sync_timeout_secs")]
    pub sync_timeout_secs: u64,
}

fn default_autosave_delay_secs() -> u64 {
    5
}
fn default_theme() -> String {
    "default".to_string()
}
fn default_show_keyboard() -> bool {
    true
}
fn default_data_dir() -> String {
    JsonStore::default_dir().to_string_lossy().to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_sync_timeout_secs() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            autosave_delay_secs: default_autosave_delay_secs(),
            theme: default_theme(),
            show_keyboard: default_show_keyboard(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            sync_url: None,
            sync_token: None,
            sync_timeout_secs: default_sync_timeout_secs(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Read `path`, or defaults when it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let mut config: Config =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        config.validate();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bookdr")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Clamp values from hand-edited files into usable ranges.
    pub fn validate(&mut self) {
        self.autosave_delay_secs = self.autosave_delay_secs.clamp(1, 300);
        self.sync_timeout_secs = self.sync_timeout_secs.clamp(1, 120);
        if self.data_dir.trim().is_empty() {
            self.data_dir = default_data_dir();
        }
        if self.sync_url.as_deref().is_some_and(|url| url.trim().is_empty()) {
            self.sync_url = None;
        }
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_secs(self.autosave_delay_secs)
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync_timeout_secs)
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_path().join("logs")
    }
}
