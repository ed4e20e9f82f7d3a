//! reviewdb command-line tool.

pub mod commands;
pub mod config;
pub mod error;

pub use commands::run;
pub use config::{Action, AppConfig, Args};
pub use error::{CliError, Result};
