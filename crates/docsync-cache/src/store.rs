//! Flat-file key/value persistence for cache metadata and artifacts.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use docsync_core::{CacheConfig, DocsyncError};
use tracing::debug;

/// Fixed logical keys of the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// JSON [`CacheMetadata`](crate::metadata::CacheMetadata).
    Metadata,
    /// The generated document, raw text.
    Artifact,
    /// Copy of the artifact taken at the last full rebuild.
    ArtifactBaseline,
}

impl CacheKey {
    pub const ALL: [CacheKey; 3] = [
        CacheKey::Metadata,
        CacheKey::Artifact,
        CacheKey::ArtifactBaseline,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CacheKey::Metadata => "metadata",
            CacheKey::Artifact => "artifact",
            CacheKey::ArtifactBaseline => "artifact-baseline",
        }
    }

    /// File name backing this key inside the cache directory.
    pub fn file_name(self) -> &'static str {
        match self {
            CacheKey::Metadata => "metadata.json",
            CacheKey::Artifact => "artifact.md",
            CacheKey::ArtifactBaseline => "artifact-baseline.md",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CacheKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown cache key: {s}"))
    }
}

/// Durable key/value store addressed by [`CacheKey`].
pub trait CacheStore {
    /// Bytes stored under `key`, or `None` if absent.
    fn read(&self, key: CacheKey) -> Result<Option<Vec<u8>>, DocsyncError>;

    /// Replace the value under `key`.
    fn write(&self, key: CacheKey, bytes: &[u8]) -> Result<(), DocsyncError>;

    /// Delete `key`. Removing an absent key is not an error.
    fn remove(&self, key: CacheKey) -> Result<(), DocsyncError>;

    fn contains(&self, key: CacheKey) -> bool {
        matches!(self.read(key), Ok(Some(_)))
    }
}

/// [`CacheStore`] backed by one file per key in a directory.
///
/// Writes go to a temporary file that is then renamed over the target, so a
/// reader sees either the old or the new value. There is no locking: one
/// writer per directory is assumed.
///
/// # Examples
///
/// ```
/// use docsync_cache::store::{CacheKey, CacheStore, FsCacheStore};
///
/// let dir = tempfile::tempdir().unwrap();
/// let store = FsCacheStore::new(dir.path().join(".docsync"));
///
/// assert_eq!(store.read(CacheKey::Artifact).unwrap(), None);
/// store.write(CacheKey::Artifact, b"# Overview").unwrap();
/// assert_eq!(store.read(CacheKey::Artifact).unwrap().as_deref(), Some(&b"# Overview"[..]));
/// ```
#[derive(Debug, Clone)]
pub struct FsCacheStore {
    dir: PathBuf,
}

impl FsCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under `project_root` at the configured cache directory.
    pub fn for_project(project_root: &Path, config: &CacheConfig) -> Self {
        Self::new(project_root.join(&config.dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, key: CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Delete every key, then the directory itself if it is left empty.
    ///
    /// # Errors
    ///
    /// Returns [`DocsyncError::Cache`] if a key file exists but cannot be removed.
    pub fn clear(&self) -> Result<(), DocsyncError> {
        for key in CacheKey::ALL {
            self.remove(key)?;
        }
        // Only succeeds when no other files remain.
        if fs::remove_dir(&self.dir).is_ok() {
            debug!(dir = %self.dir.display(), "removed cache directory");
        }
        Ok(())
    }
}

impl CacheStore for FsCacheStore {
    fn read(&self, key: CacheKey) -> Result<Option<Vec<u8>>, DocsyncError> {
        match fs::read(self.path_of(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DocsyncError::Cache(format!("failed to read {key}: {e}"))),
        }
    }

    fn write(&self, key: CacheKey, bytes: &[u8]) -> Result<(), DocsyncError> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            DocsyncError::Cache(format!(
                "failed to create cache directory {}: {e}",
                self.dir.display()
            ))
        })?;

        let target = self.path_of(key);
        let tmp = self.dir.join(format!(".{}.tmp", key.file_name()));
        fs::write(&tmp, bytes)
            .map_err(|e| DocsyncError::Cache(format!("failed to write {key}: {e}")))?;
        fs::rename(&tmp, &target).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            DocsyncError::Cache(format!("failed to replace {key}: {e}"))
        })?;
        debug!(key = %key, bytes = bytes.len(), "wrote cache entry");
        Ok(())
    }

    fn remove(&self, key: CacheKey) -> Result<(), DocsyncError> {
        match fs::remove_file(self.path_of(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DocsyncError::Cache(format!("failed to remove {key}: {e}"))),
        }
    }
}
