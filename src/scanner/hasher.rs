//! SHA-1 file hasher with streaming support.
//!
//! # Overview
//! This module provides the [`Hasher`] struct for computing SHA-1 digests
//! of file contents using a fixed-size read buffer, and the [`Fingerprint`]
//! trait the reconciler calls through.
//!
//! SHA-1 is used because the digest is persisted in the cache file as a
//! 40-character hex string, and existing cache files must stay readable.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha1::{Digest, Sha1};

use super::HashError;

/// Default read buffer size (64 KiB).
const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Computes a content fingerprint for a file.
///
/// The reconciler only calls this when a path's mtime has drifted from its
/// cached value, or when a regular file is seen for the first time.
pub trait Fingerprint: Send + Sync {
    /// Read the full content of `path` and return its hex-encoded digest.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be opened or read.
    fn fingerprint(&self, path: &Path) -> Result<String, HashError>;
}

/// Streaming SHA-1 hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    buffer_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default 64 KiB read buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Create a hasher with a custom read buffer size (minimum 1 byte).
    #[must_use]
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
        }
    }

    /// Hash everything readable from `reader`.
    fn hash_reader<R: Read>(&self, mut reader: R) -> std::io::Result<String> {
        let mut hasher = Sha1::new();
        let mut buffer = vec![0u8; self.buffer_size];
        loop {
            let n = reader.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }
        Ok(format!("{:x}", hasher.finalize()))
    }
}

impl Fingerprint for Hasher {
    fn fingerprint(&self, path: &Path) -> Result<String, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path.to_path_buf(), e))?;
        let reader = BufReader::with_capacity(self.buffer_size, file);
        let hash = self
            .hash_reader(reader)
            .map_err(|e| HashError::from_io(path.to_path_buf(), e))?;
        log::trace!("Fingerprinted {}: {}", path.display(), hash);
        Ok(hash)
    }
}
