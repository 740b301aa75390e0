//! Application configuration management.
//!
//! Configuration is layered with [`figment`], lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. User config file (`config.toml` in the platform config directory)
//! 3. Project config file (`dockertimes.toml`, or `--config <PATH>`)
//! 4. Environment variables prefixed with `DOCKERTIMES_` (nested keys are
//!    split on `__`, e.g. `DOCKERTIMES_TARGETS__RELEASE__CWD`)
//! 5. Command-line flags, applied by [`Config::apply_cli`]
//!
//! # Targets
//!
//! The top-level `files`, `cache` and `cwd` form the default target. Named
//! targets live under `[targets.<name>]`; selecting one replaces all three
//! values rather than merging with the top level.
//!
//! ```toml
//! files = ["dist/**"]
//!
//! [targets.subtest]
//! cache = "tmp/subtest/.dockertimes"
//! cwd = "tmp/subtest"
//! files = ["dist/**"]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CACHE_FILE;
use crate::cli::Cli;
use crate::driver::{RunOptions, DEFAULT_JOBS};

/// Project configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "dockertimes.toml";

/// Prefix for configuration environment variables.
pub const ENV_PREFIX: &str = "DOCKERTIMES_";

/// Errors raised while building the run configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A config source could not be parsed.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// The requested target is not defined.
    #[error("Unknown target '{name}'{}", did_you_mean(.suggestion))]
    UnknownTarget {
        /// Requested target name
        name: String,
        /// Closest defined target name, if any is close enough
        suggestion: Option<String>,
    },

    /// No files to track after all layers were applied.
    #[error("No files configured; pass FILES or set `files` in the configuration")]
    NoFiles,

    /// The effective configuration could not be rendered.
    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(", did you mean '{s}'?"))
        .unwrap_or_default()
}

/// One set of tracked files with its cache file and base directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Glob patterns or literal paths to track.
    #[serde(default)]
    pub files: Vec<String>,

    /// Cache file path; defaults to `.dockertimes.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<PathBuf>,

    /// Base directory joined onto every tracked path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Default target's tracked files.
    #[serde(default)]
    pub files: Vec<String>,

    /// Default target's cache file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<PathBuf>,

    /// Default target's base directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,

    /// Number of worker threads.
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Named targets.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub targets: BTreeMap<String, TargetConfig>,
}

fn default_jobs() -> usize {
    DEFAULT_JOBS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            cache: None,
            cwd: None,
            jobs: DEFAULT_JOBS,
            targets: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from every layer except the command line.
    ///
    /// `config_file` replaces the project config lookup and must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] for a missing explicit config file,
    /// or [`ConfigError::Invalid`] when any layer fails to parse.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let project_file = match config_file {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(user_file) = Self::user_config_path() {
            log::trace!("User config path: {}", user_file.display());
            figment = figment.merge(Toml::file(user_file));
        }
        let figment = figment
            .merge(Toml::file(project_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        Self::from_figment(&figment)
    }

    /// Extract configuration from a prepared figment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if extraction fails.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        figment.extract().map_err(|e| ConfigError::Invalid(Box::new(e)))
    }

    /// Apply command-line overrides on top of the loaded layers.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(jobs) = cli.jobs {
            self.jobs = usize::from(jobs);
        }
    }

    /// Resolve the default target (`None`) or a named one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownTarget`] if `name` is not defined.
    pub fn target(&self, name: Option<&str>) -> Result<TargetConfig, ConfigError> {
        let Some(name) = name else {
            return Ok(TargetConfig {
                files: self.files.clone(),
                cache: self.cache.clone(),
                cwd: self.cwd.clone(),
            });
        };

        self.targets
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownTarget {
                name: name.to_string(),
                suggestion: self.suggest_target(name),
            })
    }

    /// Select the target named on the command line and apply the `FILES`,
    /// `--cache` and `--cwd` overrides to it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownTarget`] for an undefined target.
    pub fn resolve(&self, cli: &Cli) -> Result<TargetConfig, ConfigError> {
        let mut target = self.target(cli.target.as_deref())?;
        if !cli.files.is_empty() {
            target.files = cli.files.clone();
        }
        if let Some(ref cache) = cli.cache {
            target.cache = Some(cache.clone());
        }
        if let Some(ref cwd) = cli.cwd {
            target.cwd = Some(cwd.clone());
        }
        target.cache.get_or_insert_with(|| PathBuf::from(DEFAULT_CACHE_FILE));
        Ok(target)
    }

    /// The configuration a run would use, flattened to a single target.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownTarget`] for an undefined target.
    pub fn effective(&self, cli: &Cli) -> Result<Config, ConfigError> {
        let target = self.resolve(cli)?;
        Ok(Config {
            files: target.files,
            cache: target.cache,
            cwd: target.cwd,
            jobs: self.jobs,
            targets: BTreeMap::new(),
        })
    }

    /// Build the run options for a target, applying command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownTarget`] for an undefined target, or
    /// [`ConfigError::NoFiles`] if nothing is left to track.
    pub fn run_options(&self, cli: &Cli) -> Result<RunOptions, ConfigError> {
        let target = self.resolve(cli)?;
        if target.files.is_empty() {
            return Err(ConfigError::NoFiles);
        }

        let mut options = RunOptions::new(target.files).with_jobs(self.jobs);
        if let Some(cache) = target.cache {
            options = options.with_cache_path(cache);
        }
        if let Some(cwd) = target.cwd {
            options = options.with_cwd(cwd);
        }
        Ok(options)
    }

    /// Render the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Render`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Closest defined target name, if reasonably close.
    fn suggest_target(&self, name: &str) -> Option<String> {
        self.targets
            .keys()
            .map(|candidate| (strsim::levenshtein(name, candidate), candidate))
            .filter(|(distance, _)| *distance <= 3)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, candidate)| candidate.clone())
    }

    /// Get the platform-specific user configuration path.
    fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dockertimes").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
