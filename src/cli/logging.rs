//! Logging initialization

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Initialize logging based on debug flag
///
/// With `debug` every event down to debug level goes to a temporary log file
/// whose path is returned. Otherwise warnings and errors go to stderr; both
/// levels can be overridden through `RUST_LOG`.
pub fn init_logging(debug: bool) -> Result<Option<PathBuf>> {
    if !debug {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_ansi(false)
            .with_target(false)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
        return Ok(None);
    }

    // A named temp file that outlives this process so the log can be read afterwards
    let (file, path) = tempfile::Builder::new()
        .prefix("stevedore-")
        .suffix(".log")
        .tempfile()
        .context("Failed to create debug log file")?
        .keep()
        .context("Failed to persist debug log file")?;

    tracing_subscriber::fmt()
        .with_writer(file)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_ansi(false) // No ANSI codes in log file
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(Some(path))
}
