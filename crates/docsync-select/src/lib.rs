//! Smart file selection: rank a project's files by relevance and attach
//! content previews to the top of the list.
//!
//! Scoring is pure and works on the analysis produced by `docsync-graph`
//! plus the recent-change window from `docsync-history`. Files are read only
//! for the final selection.

pub mod output;
pub mod preview;
pub mod ranker;

use std::path::Path;

use docsync_core::{DocsyncError, RankConfig};
use docsync_graph::ProjectAnalysis;
use docsync_history::recency::RecentChanges;
use tracing::debug;

use crate::preview::RankedFile;
use crate::ranker::RelevanceRanker;

/// Rank every analyzed file and return the top `k` with previews.
///
/// # Errors
///
/// Returns [`DocsyncError`] if a preview read task fails.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use docsync_core::DocsyncConfig;
/// use docsync_graph::analyze_project;
/// use docsync_history::recency::RecentChanges;
/// use docsync_select::select_files;
///
/// # async fn run() -> Result<(), docsync_core::DocsyncError> {
/// let config = DocsyncConfig::default();
/// let analysis = analyze_project(Path::new("."), &config).await?;
/// let files = select_files(Path::new("."), &analysis, &RecentChanges::default(), &config.rank, 10).await?;
/// for f in &files {
///     println!("{:.1} {}", f.score, f.path);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn select_files(
    root: &Path,
    analysis: &ProjectAnalysis,
    recent: &RecentChanges,
    config: &RankConfig,
    k: usize,
) -> Result<Vec<RankedFile>, DocsyncError> {
    let ranker = RelevanceRanker::new(config.weights.clone());
    let ranked = ranker.rank(
        &analysis.index,
        &analysis.graph,
        &analysis.centrality,
        recent,
        k,
    );
    debug!(selected = ranked.len(), of = analysis.index.len(), "ranked files");
    preview::attach_previews(root, ranked, config.preview_lines).await
}
