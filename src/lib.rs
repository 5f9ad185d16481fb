//! Quire: a modal dialog and focus-management engine for ratatui applications
//!
//! The engine lives in [`tui::components::dialogs`]; the rest of the crate is
//! the demo writing desk and its command-line entry point.

pub mod cli;
pub mod config;
pub mod tui;

pub use config::Config;
pub use tui::components::dialogs::{
    DialogConfig, DialogController, DialogDriver, DialogError, DialogHost, DialogOutcome,
    DialogResult, DialogVariant, FormSchema, SettleOutcome, Submission,
};
