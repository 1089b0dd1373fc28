//! How often each file changed in the recent history window.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::provider::RevisionHistory;

/// Per-file appearance counts over the newest `window` revisions.
///
/// A file touched in a revision counts once for that revision. An empty
/// window (no history, or history unavailable) gives every file a factor
/// of 0.
///
/// # Examples
///
/// ```
/// use docsync_history::recency::RecentChanges;
///
/// let recent = RecentChanges::from_revisions(vec![
///     vec!["src/app.js".to_string(), "src/db.js".to_string()],
///     vec!["src/app.js".to_string()],
/// ]);
/// assert_eq!(recent.count("src/app.js"), 2);
/// assert_eq!(recent.factor("src/app.js"), 1.0);
/// assert_eq!(recent.factor("src/db.js"), 0.5);
/// assert_eq!(recent.factor("README.md"), 0.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecentChanges {
    counts: HashMap<String, u32>,
    max: u32,
    revisions: usize,
}

impl RecentChanges {
    /// Read the newest `window` revisions from `history`.
    ///
    /// Degrades to an empty window if history is unavailable.
    pub fn collect(history: &dyn RevisionHistory, window: usize) -> Self {
        match history.recent_changes(window) {
            Ok(revisions) => {
                let recent = Self::from_revisions(revisions);
                debug!(
                    revisions = recent.revisions,
                    files = recent.counts.len(),
                    "collected recent changes"
                );
                recent
            }
            Err(e) => {
                warn!(error = %e, "recent history unavailable; recency ignored");
                Self::default()
            }
        }
    }

    /// Build from per-revision path lists.
    pub fn from_revisions(revisions: Vec<Vec<String>>) -> Self {
        let mut counts: HashMap<String, u32> = HashMap::new();
        let total = revisions.len();
        for mut paths in revisions {
            paths.sort_unstable();
            paths.dedup();
            for path in paths {
                *counts.entry(path).or_default() += 1;
            }
        }
        let max = counts.values().copied().max().unwrap_or(0);
        Self {
            counts,
            max,
            revisions: total,
        }
    }

    /// Number of revisions in the window that touched `path`.
    pub fn count(&self, path: &str) -> u32 {
        self.counts.get(path).copied().unwrap_or(0)
    }

    /// `count / max count` in `[0, 1]`.
    pub fn factor(&self, path: &str) -> f64 {
        if self.max == 0 {
            return 0.0;
        }
        f64::from(self.count(path)) / f64::from(self.max)
    }

    /// Revisions actually read.
    pub fn revisions(&self) -> usize {
        self.revisions
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
