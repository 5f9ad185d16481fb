mod config;
mod demo;
mod root;

pub use config::ConfigCommand;
pub use demo::DemoCommand;
pub use root::{Cli, Commands};
