use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::tui::components::dialogs::{DialogConfig, DEFAULT_BUSY_LABEL};
use crate::tui::themes::Theme;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Defaults applied to every dialog the application opens
    pub dialog: DialogDefaults,

    /// Behavior of the simulated backend used by the demo
    pub demo: DemoConfig,

    /// Theme name
    pub theme: String,

    /// Tracing filter directive, used when RUST_LOG is unset
    pub log_filter: String,

    /// Write logs here instead of stderr
    pub log_file: Option<PathBuf>,
}

/// Dialog defaults
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DialogDefaults {
    pub cancel_label: String,
    pub busy_label: String,
    pub closable: bool,
    pub dismiss_on_backdrop: bool,
    pub show_close_button: bool,
}

impl Default for DialogDefaults {
    fn default() -> Self {
        Self {
            cancel_label: "Cancel".to_string(),
            busy_label: DEFAULT_BUSY_LABEL.to_string(),
            closable: true,
            dismiss_on_backdrop: true,
            show_close_button: true,
        }
    }
}

impl DialogDefaults {
    /// Apply these defaults on top of a dialog configuration
    pub fn apply(&self, config: DialogConfig) -> DialogConfig {
        let confirm = config.confirm_label.clone();
        config
            .with_labels(confirm, self.cancel_label.clone())
            .with_busy_label(self.busy_label.clone())
            .closable(self.closable)
            .dismiss_on_backdrop(self.dismiss_on_backdrop)
            .with_close_button(self.show_close_button)
    }
}

/// Simulated backend settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DemoConfig {
    /// Latency of every confirmed action, in milliseconds
    pub delay_ms: u64,

    /// Whether confirmed actions fail
    pub fail: bool,

    /// Error reported when an action fails
    pub failure_message: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            delay_ms: 800,
            fail: false,
            failure_message: "network error".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialog: DialogDefaults::default(),
            demo: DemoConfig::default(),
            theme: "dark".to_string(),
            log_filter: "quire=info".to_string(),
            log_file: None,
        }
    }
}

impl Config {
    /// Initialize configuration: defaults, then the first config file found,
    /// then environment variables
    pub async fn init() -> Result<Self> {
        debug!("Initializing configuration");

        let mut config = match Self::load_from_file().await? {
            Some(config) => config,
            None => Self::default(),
        };
        config.load_from_env();

        Ok(config)
    }

    /// Candidate config files, highest priority first
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./.quire.json"), PathBuf::from("./quire.json")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("quire").join("quire.json"));
        }

        paths
    }

    /// Load the first configuration file that exists
    pub async fn load_from_file() -> Result<Option<Self>> {
        for path in Self::config_paths() {
            if path.exists() {
                return Self::load_from_path(&path).await.map(Some);
            }
        }
        Ok(None)
    }

    /// Load configuration from a specific JSON file
    pub async fn load_from_path(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Load configuration from `QUIRE_*` environment variables
    pub fn load_from_env(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    /// Apply overrides from a variable lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(label) = lookup("QUIRE_CANCEL_LABEL") {
            self.dialog.cancel_label = label;
        }

        if let Some(label) = lookup("QUIRE_BUSY_LABEL") {
            self.dialog.busy_label = label;
        }

        if let Some(value) = lookup("QUIRE_DISMISS_ON_BACKDROP") {
            self.dialog.dismiss_on_backdrop = parse_flag(&value);
        }

        if let Some(value) = lookup("QUIRE_DELAY_MS") {
            if let Ok(delay) = value.trim().parse() {
                self.demo.delay_ms = delay;
            }
        }

        if let Some(value) = lookup("QUIRE_FAIL") {
            self.demo.fail = parse_flag(&value);
        }

        if let Some(message) = lookup("QUIRE_FAILURE_MESSAGE") {
            self.demo.failure_message = message;
        }

        if let Some(theme) = lookup("QUIRE_THEME") {
            self.theme = theme;
        }

        if let Some(filter) = lookup("QUIRE_LOG") {
            self.log_filter = filter;
        }

        if let Some(file) = lookup("QUIRE_LOG_FILE") {
            self.log_file = Some(PathBuf::from(file));
        }
    }

    /// Resolve the configured theme
    pub fn theme(&self) -> Theme {
        Theme::by_name(&self.theme).unwrap_or_default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.dialog.cancel_label.trim().is_empty() {
            return Err(anyhow::anyhow!("dialog.cancel_label must not be blank"));
        }

        if self.dialog.busy_label.trim().is_empty() {
            return Err(anyhow::anyhow!("dialog.busy_label must not be blank"));
        }

        if Theme::by_name(&self.theme).is_none() {
            return Err(anyhow::anyhow!(
                "Unknown theme '{}'. Available themes: {}",
                self.theme,
                Theme::available().join(", ")
            ));
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
