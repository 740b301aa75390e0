//! Run orchestration: expand, load, reconcile, persist.
//!
//! # Overview
//!
//! A run follows a fixed order:
//! 1. Expand the configured patterns into the tracked path list
//! 2. Load the cache store (never fails)
//! 3. Reconcile every path concurrently on a bounded rayon pool, all workers
//!    sharing one `Mutex<CacheStore>`
//! 4. Persist the store exactly once
//!
//! # Failure policy
//!
//! A failed path does not cancel its siblings. Every reconciliation runs to
//! completion, each failure is logged, and the first failure in path order
//! is returned. The cache is not persisted for a failed run. Restores that
//! already happened agree with the old cache, so the next run starts from a
//! consistent state.
//!
//! A cache write failure only produces a warning; the run still succeeds.
//!
//! # Example
//!
//! ```no_run
//! use dockertimes::driver::{run, RunOptions};
//!
//! let options = RunOptions::new(vec!["dist/**".to_string()]);
//! let summary = run(&options, None)?;
//! println!("{} restored", summary.restored);
//! # Ok::<(), dockertimes::driver::RunError>(())
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use rayon::prelude::*;

use crate::cache::{CacheStore, DEFAULT_CACHE_FILE};
use crate::progress::ProgressCallback;
use crate::reconcile::{Outcome, ReconcileError, Reconciler};
use crate::scanner::{expand_patterns, Fingerprint, ScanError};

/// Default number of reconciliation threads.
pub const DEFAULT_JOBS: usize = 4;

/// Inputs for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Glob patterns or literal paths to track.
    pub files: Vec<String>,
    /// Cache file, relative to the process working directory.
    pub cache_path: PathBuf,
    /// Base directory joined onto every tracked path.
    pub cwd: Option<PathBuf>,
    /// Number of worker threads (minimum 1).
    pub jobs: usize,
}

impl RunOptions {
    /// Options with the default cache file and thread count.
    #[must_use]
    pub fn new(files: Vec<String>) -> Self {
        Self {
            files,
            cache_path: PathBuf::from(DEFAULT_CACHE_FILE),
            cwd: None,
            jobs: DEFAULT_JOBS,
        }
    }

    /// Set the cache file path.
    #[must_use]
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }

    /// Set the base directory.
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Set the worker thread count.
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }
}

/// Counts of each outcome in a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Regular files seen for the first time.
    pub new_files: usize,
    /// Non-regular paths seen for the first time.
    pub new_paths: usize,
    /// Paths whose mtime matched the cache.
    pub unmodified: usize,
    /// Paths whose mtime was rewritten to the cached value.
    pub restored: usize,
    /// Files whose content changed.
    pub modified: usize,
    /// Whether the cache file was written.
    pub cache_persisted: bool,
}

impl RunSummary {
    /// Total number of reconciled paths.
    #[must_use]
    pub fn total(&self) -> usize {
        self.new_files + self.new_paths + self.unmodified + self.restored + self.modified
    }

    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::CachedNewFile { .. } => self.new_files += 1,
            Outcome::CachedNewPath { .. } => self.new_paths += 1,
            Outcome::Unmodified { .. } => self.unmodified += 1,
            Outcome::Restored { .. } => self.restored += 1,
            Outcome::CachedModified { .. } => self.modified += 1,
        }
    }
}

/// Errors that abort a run.
#[derive(thiserror::Error, Debug)]
pub enum RunError {
    /// The tracked file set could not be expanded.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// A tracked path could not be reconciled.
    #[error("{failed} of {total} paths failed; first error: {source}")]
    Reconcile {
        /// Number of failed paths
        failed: usize,
        /// Number of tracked paths
        total: usize,
        /// First failure in path order
        #[source]
        source: ReconcileError,
    },
}

/// Run with the default SHA-1 fingerprinter.
///
/// # Errors
///
/// See [`run_with`].
pub fn run(
    options: &RunOptions,
    progress: Option<Arc<dyn ProgressCallback>>,
) -> Result<RunSummary, RunError> {
    run_with(options, &Reconciler::new(), progress)
}

/// Expand, load, reconcile and persist using `reconciler`.
///
/// # Errors
///
/// Returns [`RunError::Scan`] if pattern expansion fails, or
/// [`RunError::Reconcile`] if any path fails. Cache write failures are
/// logged and reported through [`RunSummary::cache_persisted`].
pub fn run_with<F: Fingerprint>(
    options: &RunOptions,
    reconciler: &Reconciler<F>,
    progress: Option<Arc<dyn ProgressCallback>>,
) -> Result<RunSummary, RunError> {
    let paths = expand_patterns(&options.files, options.cwd.as_deref())?;
    log::debug!("Tracking {} paths", paths.len());

    let store = Mutex::new(CacheStore::load_or_default(&options.cache_path));

    if let Some(ref callback) = progress {
        callback.on_start(paths.len());
    }

    let results = reconcile_all(&paths, reconciler, &store, options.jobs, progress.as_deref());

    if let Some(ref callback) = progress {
        callback.on_finish();
    }

    let mut summary = RunSummary::default();
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(outcome) => summary.record(&outcome),
            Err(e) => {
                log::error!("{}", e);
                failures.push(e);
            }
        }
    }

    let failed = failures.len();
    if let Some(source) = failures.into_iter().next() {
        return Err(RunError::Reconcile {
            failed,
            total: paths.len(),
            source,
        });
    }

    let store = store.into_inner().unwrap_or_else(PoisonError::into_inner);
    match store.persist(&options.cache_path) {
        Ok(()) => summary.cache_persisted = true,
        Err(e) => log::warn!("{}", e),
    }

    log::info!(
        "Reconciled {} paths: {} new, {} restored, {} modified, {} unmodified",
        summary.total(),
        summary.new_files + summary.new_paths,
        summary.restored,
        summary.modified,
        summary.unmodified
    );

    Ok(summary)
}

/// Reconcile `paths` on a pool of `jobs` threads, results in path order.
fn reconcile_all<F: Fingerprint>(
    paths: &[PathBuf],
    reconciler: &Reconciler<F>,
    store: &Mutex<CacheStore>,
    jobs: usize,
    progress: Option<&dyn ProgressCallback>,
) -> Vec<Result<Outcome, ReconcileError>> {
    let done = AtomicUsize::new(0);
    let work = || {
        paths
            .par_iter()
            .map(|path| {
                let result = reconciler.reconcile(path, store);
                if let Some(callback) = progress {
                    let current = done.fetch_add(1, Ordering::SeqCst) + 1;
                    callback.on_progress(current, &display(path));
                }
                result
            })
            .collect::<Vec<_>>()
    };

    match rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .build()
    {
        Ok(pool) => pool.install(work),
        Err(e) => {
            log::warn!(
                "Failed to create thread pool, using global pool with {} threads: {}",
                rayon::current_num_threads(),
                e
            );
            work()
        }
    }
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
