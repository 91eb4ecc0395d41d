//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::storage::{SecretBackend, StrategyKind};

/// RSM parent-portal monitor - harvest homework scores for enrolled students.
#[derive(Parser, Debug)]
#[command(name = "rsm-monitor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    // === Global flags ===
    /// Config file (defaults to the platform config directory)
    #[arg(long, value_name = "PATH", global = true, env = "RSM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit JSONL logs to stderr
    #[arg(long, global = true)]
    pub json_output: bool,

    /// Verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one invocation locally and print the response envelope
    Run(RunArgs),

    /// Serve invocations from the AWS Lambda runtime
    Lambda,

    /// Print the resolved configuration as TOML
    Config,
}

/// Token acquisition strategy flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    Browser,
    Http,
}

impl From<StrategyArg> for StrategyKind {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Browser => Self::Browser,
            StrategyArg::Http => Self::Http,
        }
    }
}

/// Secret backend flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Aws,
    Keyring,
    File,
}

impl From<BackendArg> for SecretBackend {
    fn from(value: BackendArg) -> Self {
        match value {
            BackendArg::Aws => Self::Aws,
            BackendArg::Keyring => Self::Keyring,
            BackendArg::File => Self::File,
        }
    }
}

/// Arguments for the `run` command.
#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Request id echoed in the response (defaults to `local-<time>`)
    #[arg(long, value_name = "ID")]
    pub request_id: Option<String>,

    /// Pretty-print the envelope
    #[arg(long)]
    pub pretty: bool,

    /// Token acquisition strategy
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Where to read the password from
    #[arg(long, value_enum)]
    pub secret_backend: Option<BackendArg>,

    /// Student id to harvest (repeatable; replaces the configured list)
    #[arg(long = "student", value_name = "ID")]
    pub students: Vec<i64>,
}
