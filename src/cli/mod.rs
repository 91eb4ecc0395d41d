//! CLI argument parsing and command dispatch.

pub mod args;
pub mod lambda;
pub mod run;

use std::path::Path;

use crate::error::Result;
use crate::storage::Config;

pub use args::{Cli, Commands, RunArgs};

/// Execute the `config` command.
///
/// # Errors
///
/// Returns a config error if loading or serialization fails.
pub fn show_config(config_path: Option<&Path>) -> Result<()> {
    let config = Config::resolve(config_path)?;
    print!("{}", config.to_toml()?);
    Ok(())
}
