//! Command-line interface definitions for dockertimes.
//!
//! This module defines all CLI arguments using the clap derive API. Every
//! option here overrides the corresponding value from configuration files
//! and environment variables (see [`crate::config`]).
//!
//! # Example
//!
//! ```bash
//! # Reconcile everything under dist/ against .dockertimes.json
//! dockertimes 'dist/**'
//!
//! # Use a base directory and a custom cache file
//! dockertimes --cwd build --cache build/.dockertimes 'dist/**'
//!
//! # Run a named target from dockertimes.toml
//! dockertimes --target release
//!
//! # Verbose mode shows unmodified paths too
//! dockertimes -v 'dist/**'
//! ```

use clap::Parser;
use std::path::PathBuf;

/// Keep file mtimes stable across builds when content is unchanged.
///
/// dockertimes records each tracked path's mtime and SHA-1 in a cache file.
/// On later runs, files rewritten with identical content get their recorded
/// mtime back, so mtime-keyed build caches (such as Docker layer caching)
/// see no change.
#[derive(Debug, Parser)]
#[command(name = "dockertimes")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Glob patterns or paths to track (overrides configured files)
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// Cache file path [default: .dockertimes.json]
    #[arg(short, long, value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// Base directory joined onto every tracked path
    #[arg(short = 'C', long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Named target from the configuration file
    #[arg(short, long, value_name = "NAME")]
    pub target: Option<String>,

    /// Configuration file [default: dockertimes.toml if present]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Number of worker threads
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: Option<u16>,

    /// Show a progress bar on stderr
    #[arg(long)]
    pub progress: bool,

    /// Print the configuration a run would use (target and flags applied) as TOML and exit
    #[arg(long)]
    pub print_config: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    /// Report errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}
