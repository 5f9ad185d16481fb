use anyhow::Result;
use clap::Args;

use crate::config::Config;

/// Print the effective configuration
#[derive(Args, Debug)]
pub struct ConfigCommand {
    /// List the config file locations instead, highest priority first
    #[arg(long)]
    pub paths: bool,
}

impl ConfigCommand {
    pub fn execute(&self, config: &Config) -> Result<()> {
        if self.paths {
            for path in Config::config_paths() {
                let marker = if path.exists() { "*" } else { " " };
                println!("{} {}", marker, path.display());
            }
            return Ok(());
        }

        println!("{}", serde_json::to_string_pretty(config)?);
        Ok(())
    }
}
