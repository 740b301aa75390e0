//! Timestamp cache for dockertimes.
//!
//! This module holds the persisted record of every tracked path: the mtime
//! last observed or restored, and a content fingerprint for regular files.
//!
//! # Architecture
//!
//! * [`entry`]: The per-path record and its on-disk field names.
//! * [`store`]: The in-memory mapping, loaded once and persisted once per run.
//!
//! # File format
//!
//! The cache file is a single compact JSON object keyed by path:
//!
//! ```json
//! {"dist/app.js":{"mtime":1417469686000,"sha1":"6681fa487fc6adfe5cf0ebf7f9893d74b13d6c78"},"dist":{"mtime":1417469686000}}
//! ```
//!
//! A missing or unreadable cache file is never an error: it loads as an
//! empty store, and every tracked path is then treated as first-seen.

pub mod entry;
pub mod store;

pub use entry::CacheEntry;
pub use store::{CacheError, CacheStore, DEFAULT_CACHE_FILE};
