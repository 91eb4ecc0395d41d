//! rsm-monitor - RSM parent-portal monitor
//!
//! CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use clap::Parser;
use std::process::ExitCode;

use rsm_monitor::cli::{self, Cli, Commands};
use rsm_monitor::core::logging;
use rsm_monitor::storage::running_in_lambda;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let env = |key: &str| std::env::var(key).ok();
    let log_level = cli
        .log_level
        .as_deref()
        .and_then(logging::LogLevel::from_arg)
        .or_else(|| logging::log_level_from(env))
        .unwrap_or_default();
    let log_format = if cli.json_output {
        logging::LogFormat::Json
    } else {
        logging::log_format_from(env)
            .unwrap_or_else(|| logging::LogFormat::default_for(running_in_lambda()))
    };
    let log_file = logging::log_file_from(env);
    logging::init(log_level, log_format, log_file, cli.verbose);

    let config_path = cli.config.as_deref();
    let result = match &cli.command {
        Commands::Run(args) => cli::run::execute(config_path, args).await,
        Commands::Lambda => cli::lambda::execute(config_path).await.map(|()| true),
        Commands::Config => cli::show_config(config_path).map(|()| true),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(code = e.error_code(), "{}", e);
            eprintln!("Error [{}]: {e}", e.error_code());
            for suggestion in e.fix_suggestions() {
                eprint!("\n{suggestion}");
            }
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
