//! Persistent extraction cache under the project root.
//!
//! Layout: `.importee_cache/index.json` carries the store version and the
//! rules fingerprint; `.importee_cache/files/<rel>.json` holds one record
//! per source file. A stale fingerprint resets the whole store. Any read
//! or write problem degrades to a cache miss, never to a failed run.

use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::extract::Extraction;
use crate::graph::ImportRecord;
use crate::scanner::SourceFile;
use crate::types::Issue;

/// Name of the cache directory under the project root.
pub const CACHE_DIR_NAME: &str = ".importee_cache";

/// On-disk format version. Bump when record or index shapes change.
const CACHE_VERSION: u32 = 1;

/// Errors from the persisted cache store.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Filesystem access under the cache directory failed.
    #[error("cache io at {}: {source}", path.display())]
    Io {
        /// Path the operation touched.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// A record or the index failed to encode.
    #[error("cache encode: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Fingerprint of a file's content, used as the cache key.
#[must_use]
pub fn content_fingerprint(source: &str) -> String {
    blake3::hash(source.as_bytes()).to_hex().to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheIndex {
    version: u32,
    rules_fingerprint: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    version: u32,
    content_hash: String,
    records: Vec<ImportRecord>,
    issues: Vec<Issue>,
}

/// Store for per-file extraction results.
#[derive(Debug)]
pub struct CacheStore {
    dir: PathBuf,
    rules_fingerprint: String,
    enabled: bool,
}

impl CacheStore {
    /// Opens the store under `root`.
    ///
    /// With `enabled` false (the `no_cache` run mode) the store never
    /// touches the filesystem: no lookups, no writes, and existing entries
    /// are left as they are. When the persisted index does not match the
    /// current version and rules fingerprint, all records are dropped and
    /// the index is rewritten. A store that cannot be prepared disables
    /// itself with a warning.
    #[must_use]
    pub fn open(root: &Path, rules_fingerprint: &str, enabled: bool) -> Self {
        let mut store = Self {
            dir: root.join(CACHE_DIR_NAME),
            rules_fingerprint: rules_fingerprint.to_string(),
            enabled,
        };
        if !store.enabled {
            return store;
        }
        if let Err(e) = store.prepare() {
            warn!("cache disabled for this run: {e}");
            store.enabled = false;
        }
        store
    }

    /// True when lookups and stores are active.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Removes the entire persisted store.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the directory exists but cannot be removed.
    pub fn clear(root: &Path) -> Result<(), CacheError> {
        let dir = root.join(CACHE_DIR_NAME);
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Io { path: dir, source: e }),
        }
    }

    /// Returns the cached extraction for a file, if its content hash
    /// matches the stored record.
    #[must_use]
    pub fn lookup(&self, file: &SourceFile, content_hash: &str) -> Option<Extraction> {
        if !self.enabled {
            return None;
        }
        let path = self.record_path(file);
        let data = fs::read_to_string(&path).ok()?;
        let record: CacheRecord = match serde_json::from_str(&data) {
            Ok(record) => record,
            Err(e) => {
                debug!("corrupt cache record {}: {e}", path.display());
                return None;
            }
        };
        if record.version != CACHE_VERSION || record.content_hash != content_hash {
            return None;
        }
        Some(Extraction {
            records: record.records,
            issues: record.issues,
        })
    }

    /// Persists a file's extraction result.
    ///
    /// Callers store sequentially after the merge step, so there is one
    /// writer per store. Write failures are logged and swallowed.
    pub fn store(&self, file: &SourceFile, content_hash: &str, extraction: &Extraction) {
        if !self.enabled {
            return;
        }
        let record = CacheRecord {
            version: CACHE_VERSION,
            content_hash: content_hash.to_string(),
            records: extraction.records.clone(),
            issues: extraction.issues.clone(),
        };
        if let Err(e) = self.write_record(file, &record) {
            warn!("failed to cache {}: {e}", file.rel_path);
        }
    }

    fn prepare(&self) -> Result<(), CacheError> {
        let index_path = self.dir.join("index.json");
        if let Ok(data) = fs::read_to_string(&index_path) {
            if let Ok(index) = serde_json::from_str::<CacheIndex>(&data) {
                if index.version == CACHE_VERSION
                    && index.rules_fingerprint == self.rules_fingerprint
                {
                    return Ok(());
                }
            }
            debug!("cache index stale, resetting store");
        }

        let files_dir = self.dir.join("files");
        if files_dir.exists() {
            fs::remove_dir_all(&files_dir).map_err(|e| CacheError::Io {
                path: files_dir.clone(),
                source: e,
            })?;
        }
        fs::create_dir_all(&files_dir).map_err(|e| CacheError::Io {
            path: files_dir,
            source: e,
        })?;

        // Keep the store out of version control.
        let gitignore = self.dir.join(".gitignore");
        fs::write(&gitignore, "*\n").map_err(|e| CacheError::Io {
            path: gitignore,
            source: e,
        })?;

        let index = CacheIndex {
            version: CACHE_VERSION,
            rules_fingerprint: self.rules_fingerprint.clone(),
        };
        let encoded = serde_json::to_string_pretty(&index)?;
        fs::write(&index_path, encoded).map_err(|e| CacheError::Io {
            path: index_path,
            source: e,
        })?;
        Ok(())
    }

    fn write_record(&self, file: &SourceFile, record: &CacheRecord) -> Result<(), CacheError> {
        let path = self.record_path(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| CacheError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let encoded = serde_json::to_string(record)?;
        fs::write(&path, encoded).map_err(|e| CacheError::Io { path, source: e })
    }

    fn record_path(&self, file: &SourceFile) -> PathBuf {
        self.dir.join("files").join(format!("{}.json", file.rel_path))
    }
}
