use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info};

use super::config::ConfigCommand;
use super::demo::DemoCommand;
use crate::config::Config;

/// Quire - modal dialogs and focus management for terminal writing tools
#[derive(Parser, Debug)]
#[command(
    name = "quire",
    version,
    about = "Modal dialogs and focus management for terminal writing tools",
    long_about = r#"Quire runs a small writing desk in the terminal with modal dialogs on top:
a danger confirmation for deleting an item and creation forms for stories
and containers, all backed by a simulated store.

Examples:
  quire                              # Delete confirmation demo
  quire demo story                   # Story creation form
  quire demo container --fail        # Every confirm fails
  quire demo delete --delay-ms 3000  # Slow backend
  quire config                       # Print the effective configuration"#
)]
pub struct Cli {
    /// Current working directory
    #[arg(short = 'c', long = "cwd", global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the interactive dialog demo
    Demo(DemoCommand),

    /// Print the effective configuration as JSON
    Config(ConfigCommand),
}

impl Cli {
    /// Change directory if requested, then load configuration
    pub async fn load_config(&self) -> Result<Config> {
        if let Some(cwd) = &self.cwd {
            std::env::set_current_dir(cwd)
                .map_err(|e| anyhow::anyhow!("Failed to change directory to {}: {}", cwd.display(), e))?;
        }

        Config::init().await
    }

    /// Log filter, honoring --debug over the configured one
    pub fn log_filter(&self, config: &Config) -> String {
        if self.debug {
            "quire=debug".to_string()
        } else {
            config.log_filter.clone()
        }
    }

    /// Where logs go; the TUI owns the terminal, so it logs to a file
    pub fn log_file(&self, config: &Config) -> Option<PathBuf> {
        if config.log_file.is_some() {
            return config.log_file.clone();
        }
        match self.command {
            Some(Commands::Config(_)) => None,
            _ => dirs::cache_dir().map(|dir| dir.join("quire").join("quire.log")),
        }
    }

    pub async fn execute(self, config: Config) -> Result<()> {
        if let Some(cwd) = &self.cwd {
            info!("Working directory: {}", cwd.display());
        }
        debug!("Configuration initialized");

        match self.command {
            Some(Commands::Config(cmd)) => cmd.execute(&config),
            Some(Commands::Demo(cmd)) => cmd.execute(config).await,
            None => DemoCommand::default().execute(config).await,
        }
    }
}
