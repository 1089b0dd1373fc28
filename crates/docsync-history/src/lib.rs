//! Version-control signals: change impact between revisions and recent churn.
//!
//! History is read through the [`provider::RevisionHistory`] trait, with a
//! git2-backed implementation in [`git`]. Every consumer degrades to a
//! "no signal" value when history is unavailable instead of failing.

pub mod git;
pub mod impact;
pub mod provider;
pub mod recency;

#[cfg(test)]
mod testutil;

use std::path::Path;

use tracing::debug;

use crate::git::GitHistory;
use crate::provider::{NoHistory, RevisionHistory};

/// Open the history for `project_root`: git when the directory is inside a
/// repository, [`NoHistory`] otherwise.
pub fn open_history(project_root: &Path) -> Box<dyn RevisionHistory> {
    match GitHistory::open(project_root) {
        Ok(history) => Box::new(history),
        Err(e) => {
            debug!(error = %e, "no revision history");
            Box::new(NoHistory)
        }
    }
}
