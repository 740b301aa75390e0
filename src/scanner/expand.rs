//! Expansion of glob patterns and literal paths into the tracked file set.
//!
//! # Overview
//!
//! Each configured entry is either a literal path or a glob pattern, written
//! relative to an optional base directory (`cwd`). Glob patterns are resolved
//! by walking their literal prefix with [`walkdir`] and matching every entry
//! against a [`globset`] matcher.
//!
//! # Matching rules
//!
//! - `*` and `?` never cross a `/`; `**` matches any number of directories.
//! - A trailing `/**` also matches the directory it is anchored on, so
//!   `dist/**` yields `dist` itself plus every file and directory below it.
//! - Names starting with `.` are only matched by a pattern component that
//!   starts with `.` too. `**` skips `.git` and the `.dockertimes.json` cache;
//!   `dist/.*` picks up dotfiles in `dist`.
//! - A pattern starting with `!` removes its matches from the paths collected
//!   so far. Later patterns can add them back.
//! - A pattern that matches nothing is kept verbatim as a literal path. A
//!   missing literal path then fails loudly when it is reconciled instead of
//!   being dropped without notice.
//! - Every result is joined onto `cwd` and normalized lexically (`.` dropped,
//!   `..` folded into its parent). That path is the cache key, so the same
//!   `cwd` must be used on every run.
//! - Names that are not valid UTF-8 cannot be cache keys and are skipped with
//!   a warning.
//! - Results are deduplicated, keeping the first occurrence.
//!
//! # Example
//!
//! ```no_run
//! use dockertimes::scanner::expand_patterns;
//! use std::path::Path;
//!
//! let patterns = ["dist/**".to_string(), "!dist/tmp/**".to_string()];
//! let files = expand_patterns(&patterns, Some(Path::new("build")))?;
//! for file in &files {
//!     println!("{}", file.display());
//! }
//! # Ok::<(), dockertimes::scanner::ScanError>(())
//! ```

use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use super::ScanError;

/// Characters that turn a path component into a glob component.
const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// Expand `patterns` into a deduplicated list of paths, each joined onto `cwd`.
///
/// # Errors
///
/// Returns [`ScanError::InvalidPattern`] for a pattern that does not compile,
/// or [`ScanError::Io`] when a directory cannot be read during the walk.
pub fn expand_patterns(patterns: &[String], cwd: Option<&Path>) -> Result<Vec<PathBuf>, ScanError> {
    let anchor = cwd.unwrap_or_else(|| Path::new(""));
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for pattern in patterns {
        if let Some(negated) = pattern.strip_prefix('!') {
            let excluded: HashSet<PathBuf> = expand_one(negated, anchor)?
                .iter()
                .map(|path| normalize(path))
                .collect();
            let before = files.len();
            files.retain(|path| !excluded.contains(path));
            seen.retain(|path| !excluded.contains(path));
            log::debug!("Pattern '{}' excluded {} paths", pattern, before - files.len());
            continue;
        }

        let matches = expand_one(pattern, anchor)?;
        if matches.is_empty() {
            log::debug!("Pattern '{}' matched nothing, keeping it as a path", pattern);
            push_unique(&mut files, &mut seen, &anchor.join(pattern));
            continue;
        }
        log::debug!("Pattern '{}' matched {} paths", pattern, matches.len());
        for path in &matches {
            push_unique(&mut files, &mut seen, path);
        }
    }

    Ok(files)
}

fn push_unique(files: &mut Vec<PathBuf>, seen: &mut HashSet<PathBuf>, path: &Path) {
    let path = normalize(path);
    if seen.insert(path.clone()) {
        files.push(path);
    }
}

/// Expand a single pattern. An empty result means "nothing matched".
fn expand_one(pattern: &str, anchor: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let Some((base, glob_components)) = split_pattern(pattern) else {
        // No glob metacharacters: a literal path, taken as-is.
        return Ok(vec![anchor.join(pattern)]);
    };

    let matcher = build_matcher(pattern)?;
    let dot_matcher = build_dot_matcher(pattern, &glob_components)?;
    let walk_root = if base.as_os_str().is_empty() {
        if anchor.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            anchor.to_path_buf()
        }
    } else {
        anchor.join(&base)
    };

    if walk_root.symlink_metadata().is_err() {
        return Ok(Vec::new());
    }

    let walker = WalkDir::new(&walk_root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || is_visible(entry.file_name(), &dot_matcher));

    let mut matches = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| ScanError::Io {
            path: e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| walk_root.clone()),
            source: e.into(),
        })?;

        let suffix = entry
            .path()
            .strip_prefix(&walk_root)
            .unwrap_or_else(|_| entry.path());
        let relative = base.join(suffix);
        if relative.as_os_str().is_empty() {
            continue;
        }

        if matcher.is_match(to_slash(&relative)) {
            matches.push(anchor.join(&relative));
        }
    }

    Ok(matches)
}

/// Whether a walked name may be matched (and descended into).
fn is_visible(name: &OsStr, dot_matcher: &GlobSet) -> bool {
    match name.to_str() {
        None => {
            log::warn!(
                "Skipping {}: name is not valid UTF-8",
                name.to_string_lossy()
            );
            false
        }
        Some(name) if name.starts_with('.') => dot_matcher.is_match(name),
        Some(_) => true,
    }
}

/// Split a glob pattern into its literal directory prefix and the remaining
/// components, or `None` when the pattern contains no glob metacharacters.
fn split_pattern(pattern: &str) -> Option<(PathBuf, Vec<&str>)> {
    let components: Vec<&str> = pattern.split('/').collect();
    let first_glob = components.iter().position(|c| c.contains(GLOB_META))?;

    let base = components[..first_glob].join("/");
    let base = if base.is_empty() && pattern.starts_with('/') {
        PathBuf::from("/")
    } else {
        PathBuf::from(base)
    };
    Some((base, components[first_glob..].to_vec()))
}

fn build_matcher(pattern: &str) -> Result<GlobSet, ScanError> {
    let invalid = |source| ScanError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    };

    let mut builder = GlobSetBuilder::new();
    builder.add(
        GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(invalid)?,
    );

    // `dir/**` also names `dir` itself.
    if let Some(anchor_dir) = pattern.strip_suffix("/**") {
        if !anchor_dir.is_empty() {
            builder.add(
                GlobBuilder::new(anchor_dir)
                    .literal_separator(true)
                    .build()
                    .map_err(invalid)?,
            );
        }
    }

    builder.build().map_err(invalid)
}

/// Matcher for the pattern components that name dotfiles explicitly.
fn build_dot_matcher(pattern: &str, components: &[&str]) -> Result<GlobSet, ScanError> {
    let invalid = |source| ScanError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    };

    let mut builder = GlobSetBuilder::new();
    for component in components.iter().filter(|c| c.starts_with('.')) {
        builder.add(Glob::new(component).map_err(invalid)?);
    }
    builder.build().map_err(invalid)
}

/// Drop `.` components and fold `..` into the preceding name.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Render a relative path with forward slashes for glob matching.
fn to_slash(path: &Path) -> String {
    let s = path.to_string_lossy();
    if cfg!(windows) {
        s.replace('\\', "/")
    } else {
        s.into_owned()
    }
}
