//! The revision-history seam.
//!
//! Impact analysis and the recency window only see history through
//! [`RevisionHistory`], so they can run against git, a test double, or
//! [`NoHistory`] for directories outside version control.

use docsync_core::DocsyncError;
use serde::{Deserialize, Serialize};

/// Errors reported by a revision-history provider.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// The directory is not under version control, or has no commits yet.
    #[error("revision history unavailable: {0}")]
    Unavailable(String),

    /// A revision identifier does not name a reachable revision.
    #[error("unknown revision '{0}'")]
    UnknownRevision(String),

    /// Any other backend failure.
    #[error("history backend error: {0}")]
    Backend(String),
}

impl From<HistoryError> for DocsyncError {
    fn from(err: HistoryError) -> Self {
        DocsyncError::Git(err.to_string())
    }
}

/// A file touched between two revisions, with its line deltas.
///
/// # Examples
///
/// ```
/// use docsync_history::provider::TouchedFile;
///
/// let file = TouchedFile::new("src/app.js", 12, 3);
/// assert_eq!(file.lines(), 15);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TouchedFile {
    /// Project-relative path with `/` separators.
    pub path: String,
    /// Lines added.
    pub added: u64,
    /// Lines deleted.
    pub deleted: u64,
}

impl TouchedFile {
    pub fn new(path: impl Into<String>, added: u64, deleted: u64) -> Self {
        Self {
            path: path.into(),
            added,
            deleted,
        }
    }

    /// Added plus deleted lines.
    pub fn lines(&self) -> u64 {
        self.added + self.deleted
    }
}

/// Access to version-control history.
///
/// Calls are blocking.
pub trait RevisionHistory {
    /// Identifier of the current revision (a full commit hash for git).
    fn current_revision(&self) -> Result<String, HistoryError>;

    /// Files touched between `from` and `to`, sorted by path.
    fn touched_files(&self, from: &str, to: &str) -> Result<Vec<TouchedFile>, HistoryError>;

    /// Paths touched by each of the newest `limit` revisions, newest first.
    fn recent_changes(&self, limit: usize) -> Result<Vec<Vec<String>>, HistoryError>;
}

/// Provider for directories without version control. Every call reports
/// [`HistoryError::Unavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHistory;

impl RevisionHistory for NoHistory {
    fn current_revision(&self) -> Result<String, HistoryError> {
        Err(HistoryError::Unavailable("not a version-controlled directory".into()))
    }

    fn touched_files(&self, _from: &str, _to: &str) -> Result<Vec<TouchedFile>, HistoryError> {
        Err(HistoryError::Unavailable("not a version-controlled directory".into()))
    }

    fn recent_changes(&self, _limit: usize) -> Result<Vec<Vec<String>>, HistoryError> {
        Err(HistoryError::Unavailable("not a version-controlled directory".into()))
    }
}
