use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::config::Config;
use crate::tui::{self, DemoDialog};

/// Run the interactive dialog demo
#[derive(Args, Debug)]
pub struct DemoCommand {
    /// Dialog to open on start
    #[arg(value_enum, default_value_t = DemoDialog::Delete)]
    pub dialog: DemoDialog,

    /// Make every confirmed action fail
    #[arg(long)]
    pub fail: bool,

    /// Backend latency in milliseconds
    #[arg(long = "delay-ms")]
    pub delay_ms: Option<u64>,

    /// Theme name
    #[arg(long)]
    pub theme: Option<String>,
}

impl Default for DemoCommand {
    fn default() -> Self {
        Self {
            dialog: DemoDialog::Delete,
            fail: false,
            delay_ms: None,
            theme: None,
        }
    }
}

impl DemoCommand {
    /// Layer command-line flags over the loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if self.fail {
            config.demo.fail = true;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.demo.delay_ms = delay_ms;
        }
        if let Some(theme) = &self.theme {
            config.theme = theme.clone();
        }
    }

    pub async fn execute(&self, mut config: Config) -> Result<()> {
        self.apply(&mut config);
        config.validate()?;

        info!(dialog = ?self.dialog, fail = config.demo.fail, delay_ms = config.demo.delay_ms, "Starting demo");
        tui::run(&config, self.dialog).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let command = DemoCommand {
            dialog: DemoDialog::Container,
            fail: true,
            delay_ms: Some(0),
            theme: Some("light".to_string()),
        };
        let mut config = Config::default();
        command.apply(&mut config);

        assert!(config.demo.fail);
        assert_eq!(config.demo.delay_ms, 0);
        assert_eq!(config.theme, "light");
    }

    #[test]
    fn test_absent_flags_keep_config() {
        let mut config = Config::default();
        config.demo.fail = true;
        DemoCommand::default().apply(&mut config);

        assert!(config.demo.fail);
        assert_eq!(config.demo.delay_ms, 800);
    }
}
