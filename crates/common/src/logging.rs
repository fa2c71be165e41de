//! Logging setup and configuration

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Setup tracing subscriber for the application
///
/// `RUST_LOG` takes precedence over `default_level`. With a `log_file` the
/// output is appended there without ANSI colors, which keeps the terminal
/// clean while the TUI owns it.
pub fn setup_logging(default_level: &str, log_file: Option<&Path>) -> crate::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| crate::Error::Config(format!("Invalid log filter: {}", e)))?;

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
                .try_init()
                .map_err(|e| crate::Error::Config(format!("Logging already initialized: {}", e)))?;
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| crate::Error::Config(format!("Logging already initialized: {}", e)))?;
        }
    }

    Ok(())
}
