//! Configuration and platform paths.

pub mod config;
pub mod paths;

pub use config::{
    AccountConfig, AuthConfig, Config, GeneralConfig, PortalConfig, SecretBackend, SecretsConfig,
    StrategyKind, ENV_CONFIG, running_in_lambda,
};
pub use paths::AppPaths;
