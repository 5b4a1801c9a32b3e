//! CLI argument definitions for autonet-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.
//! All reconciliation settings come from the environment; the flags
//! only override logging and select validation mode.

use clap::Parser;

use autonet_core::config::GeneralConfig;

/// Label-driven Docker network membership reconciler.
///
/// Connects containers carrying a configured label to the mapped network
/// and keeps memberships in sync from the Docker event stream and
/// periodic rescans.
#[derive(Parser, Debug, Default)]
#[command(name = "autonet-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over `AUTONET_LOG_LEVEL`.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over `AUTONET_LOG_FORMAT`.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Additionally append log lines to this file (overrides `LOG_FILE`).
    #[arg(long)]
    pub log_file: Option<String>,

    /// Load and validate the configuration, print it as JSON and exit.
    #[arg(long)]
    pub validate: bool,
}

impl DaemonCli {
    /// Apply the logging overrides to a loaded configuration.
    pub fn apply_overrides(&self, general: &mut GeneralConfig) {
        if let Some(level) = &self.log_level {
            general.log_level = level.to_ascii_lowercase();
        }
        if let Some(format) = &self.log_format {
            general.log_format = format.to_ascii_lowercase();
        }
        if let Some(path) = &self.log_file {
            general.log_file = Some(path.clone());
        }
    }
}
