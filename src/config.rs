use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::anticheat::reporter::ReportPolicy;
use crate::session::settings::Settings;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Set for authenticated users; enables verified results.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default)]
    pub defaults: Settings,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub reporting: ReportingConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportingConfig {
    #[serde(default = "default_char_threshold")]
    pub char_threshold: usize,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_theme() -> String {
    "terminal-default".to_string()
}
fn default_tick_ms() -> u64 {
    100
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_char_threshold() -> usize {
    25
}
fn default_interval_ms() -> u64 {
    5000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_id: None,
            theme: default_theme(),
            tick_ms: default_tick_ms(),
            defaults: Settings::default(),
            service: ServiceConfig::default(),
            reporting: ReportingConfig::default(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            char_threshold: default_char_threshold(),
            interval_ms: default_interval_ms(),
        }
    }
}

impl ReportingConfig {
    pub fn policy(&self) -> ReportPolicy {
        ReportPolicy {
            char_threshold: self.char_threshold,
            interval: Duration::from_millis(self.interval_ms),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keypace")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn plans_dir() -> PathBuf {
        Self::config_dir().join("plans")
    }

    pub fn log_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keypace")
            .join("keypace.log")
    }

    /// The user id when results can be verified: authenticated and a service configured.
    pub fn verified_user(&self) -> Option<&str> {
        self.service.base_url.as_ref()?;
        self.user_id.as_deref().filter(|id| !id.trim().is_empty())
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Clamp values a hand-edited file may have pushed out of range.
    pub fn validate(&mut self) {
        self.tick_ms = self.tick_ms.clamp(16, 1000);
        self.defaults.duration_secs = self.defaults.duration_secs.clamp(1, 3600);
        self.defaults.word_target = self.defaults.word_target.clamp(1, 1000);
        self.defaults.ghost.wpm = self.defaults.ghost.wpm.clamp(1, 300);
        self.reporting.char_threshold = self.reporting.char_threshold.max(1);
        self.reporting.interval_ms = self.reporting.interval_ms.max(100);
        self.service.timeout_secs = self.service.timeout_secs.clamp(1, 120);
    }
}
