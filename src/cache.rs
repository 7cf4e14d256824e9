//! Content-hash cache for skipping files that have not changed.
//!
//! The cache is a flat JSON object in the project root mapping project
//! relative paths to SHA-256 hashes of the content last seen (and, if it was
//! rewritten, of the content written). It is loaded once at the start of a
//! run and saved once at the end.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const CACHE_FILE: &str = ".fix-type-imports-cache.json";

/// Hex-encoded SHA-256 of `content`.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashCache {
    entries: BTreeMap<String, String>,
}

impl HashCache {
    pub fn path(project_root: &Path) -> PathBuf {
        project_root.join(CACHE_FILE)
    }

    /// Loads the cache from `project_root`. A missing, unreadable or corrupt
    /// cache file yields an empty cache.
    pub fn load(project_root: &Path) -> Self {
        let path = Self::path(project_root);
        let Ok(content) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(cache) => cache,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring corrupt cache");
                Self::default()
            }
        }
    }

    pub fn save(&self, project_root: &Path) -> Result<()> {
        let path = Self::path(project_root);
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::Cache {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, json).map_err(|e| Error::io(path, e))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// True if `key` was last recorded with exactly `hash`.
    pub fn is_fresh(&self, key: &str, hash: &str) -> bool {
        self.get(key) == Some(hash)
    }

    pub fn update(&mut self, key: impl Into<String>, hash: impl Into<String>) {
        self.entries.insert(key.into(), hash.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
