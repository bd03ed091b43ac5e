//! Run configuration assembled from flags and environment fallbacks.

use crate::cli::Cli;
use crate::utils::extra_config::ExtraConfig;
use crate::utils::presence::PresenceSet;

/// Flags that must be present before any connection is attempted.
pub const REQUIRED_FLAGS: &[&str] = &["url", "token", "org", "vdc", "vm", "e"];

/// Configuration error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required argument(s): {}", format_flags(.0))]
    MissingRequired(Vec<String>),
}

fn format_flags(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("-{name}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Immutable configuration for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Cloud Director host, optionally with scheme
    pub host: String,
    /// API token, or the password when `user` is set
    pub token: String,
    pub user: Option<String>,
    pub insecure: bool,
    pub org: String,
    pub vdc: String,
    pub vm: String,
    pub extra_config: ExtraConfig,
    pub power_on: bool,
    pub verbose: bool,
}

impl Config {
    /// Validate required flags against `presence` and build the configuration.
    ///
    /// Nothing touches the network before this succeeds.
    pub fn assemble(cli: Cli, presence: &PresenceSet) -> Result<Self, ConfigError> {
        let missing = presence.missing(REQUIRED_FLAGS);
        if !missing.is_empty() {
            return Err(ConfigError::MissingRequired(
                missing.into_iter().map(str::to_string).collect(),
            ));
        }

        Ok(Self {
            host: cli.url.unwrap_or_default(),
            token: cli.token.unwrap_or_default(),
            user: cli.user.filter(|user| !user.is_empty()),
            insecure: cli.insecure,
            org: cli.org.unwrap_or_default(),
            vdc: cli.vdc.unwrap_or_default(),
            vm: cli.vm.unwrap_or_default(),
            extra_config: ExtraConfig::from(cli.extra_config),
            power_on: cli.poweron,
            verbose: cli.verbose,
        })
    }
}
