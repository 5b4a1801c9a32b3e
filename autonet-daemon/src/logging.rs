//! Logging initialization for autonet-daemon.
//!
//! Configures `tracing-subscriber` from [`GeneralConfig`]. Supports JSON
//! structured logging and human-readable pretty format on stdout, plus an
//! optional append-only copy of every line in `LOG_FILE`.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use autonet_core::config::GeneralConfig;

/// Initialize the global tracing subscriber.
///
/// Must be called exactly once, before any tracing macros are used.
/// `RUST_LOG` wins over the configured level; `AUTONET_DEBUG` forces `debug`.
///
/// # Formats
///
/// * `"json"` - Machine-parseable JSON lines (default)
/// * `"pretty"` - Human-readable colored output (for development)
///
/// A log file that cannot be opened is reported as a warning once the
/// subscriber is up; stdout logging continues.
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    if config.log_format != "json" && config.log_format != "pretty" {
        return Err(anyhow::anyhow!(
            "unknown log format '{}', expected 'json' or 'pretty'",
            config.log_format
        ));
    }

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.effective_level()));

    let (log_file, open_error) = match config.log_file.as_deref() {
        Some(path) => match open_log_file(Path::new(path)) {
            Ok(file) => (Some(Mutex::new(file)), None),
            Err(e) => (None, Some((path, e))),
        },
        None => (None, None),
    };

    if config.log_format == "json" {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .with(log_file.map(|file| tracing_subscriber::fmt::layer().json().with_writer(file)))
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to initialize JSON tracing subscriber: {}", e))?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .with(log_file.map(|file| {
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(file)
            }))
            .try_init()
            .map_err(|e| {
                anyhow::anyhow!("failed to initialize pretty tracing subscriber: {}", e)
            })?;
    }

    if let Some((path, e)) = open_error {
        tracing::warn!(path, error = %e, "failed to open log file, logging to stdout only");
    } else if let Some(path) = &config.log_file {
        tracing::debug!(path = %path, "mirroring logs to file");
    }

    Ok(())
}

/// Opens the log file in append mode, creating it if needed.
pub fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_format_is_rejected_before_install() {
        let config = GeneralConfig {
            log_format: "xml".to_owned(),
            ..Default::default()
        };
        let err = init_tracing(&config).unwrap_err();
        assert!(err.to_string().contains("xml"));
    }

    #[test]
    fn open_log_file_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("autonet.log");
        std::fs::write(&path, "first\n").unwrap();

        {
            use std::io::Write;
            let mut file = open_log_file(&path).unwrap();
            writeln!(file, "second").unwrap();
        }

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn open_log_file_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(open_log_file(&dir.path().join("missing").join("autonet.log")).is_err());
    }
}
