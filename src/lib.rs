//! dockertimes - Stable File Timestamps for Build Caches
//!
//! Records each tracked path's mtime and SHA-1 in a JSON cache file. On
//! later runs, files rewritten with byte-identical content get their recorded
//! mtime back, so tooling that keys on mtimes (Docker layer caching, make,
//! incremental builds) sees no change.
//!
//! # Architecture
//!
//! - [`cache`]: Cache entries and the load/persist store
//! - [`scanner`]: Pattern expansion and SHA-1 fingerprinting
//! - [`reconcile`]: The per-path decision procedure
//! - [`driver`]: Concurrent run over the whole file set
//! - [`config`], [`cli`], [`logging`], [`progress`], [`error`]: Application shell

pub mod cache;
pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod logging;
pub mod progress;
pub mod reconcile;
pub mod scanner;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::Cli;
use crate::config::Config;
use crate::error::ExitCode;
use crate::progress::{Progress, ProgressCallback};

/// Run the application for parsed command-line arguments.
///
/// # Errors
///
/// Returns configuration errors ([`config::ConfigError`]) and run errors
/// ([`driver::RunError`]) wrapped in [`anyhow::Error`]. A cache write
/// failure is not an error.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet, cli.no_color);
    log::debug!(
        "dockertimes {} (log level {})",
        env!("CARGO_PKG_VERSION"),
        log::max_level()
    );

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_cli(&cli);

    if cli.print_config {
        print!("{}", config.effective(&cli)?.to_toml()?);
        return Ok(ExitCode::Success);
    }

    let options = config.run_options(&cli)?;
    log::debug!("Run options: {:?}", options);

    let progress: Option<Arc<dyn ProgressCallback>> = if cli.progress {
        Some(Arc::new(Progress::new(cli.quiet)))
    } else {
        None
    };

    driver::run(&options, progress).with_context(|| {
        format!(
            "Failed to reconcile timestamps for cache {}",
            options.cache_path.display()
        )
    })?;

    Ok(ExitCode::Success)
}
