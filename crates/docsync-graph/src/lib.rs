//! Import graph and structural centrality for a project tree.
//!
//! Walks the project with the `ignore` crate, extracts raw import strings
//! from the head of every file with per-language regex strategies, resolves
//! the relative ones into a petgraph import graph, and scores each file's
//! structural importance on a 0–100 scale.

pub mod centrality;
pub mod extract;
pub mod graph;
pub mod index;
pub mod resolve;
pub mod walker;

use std::path::Path;

use docsync_core::{DocsyncConfig, DocsyncError};
use tracing::info;

use crate::centrality::CentralityScores;
use crate::extract::ExtractorRegistry;
use crate::graph::{ImportGraph, ImportGraphBuilder};
use crate::index::FileIndex;

/// Everything the ranker needs from one analysis run.
#[derive(Debug, Clone)]
pub struct ProjectAnalysis {
    pub index: FileIndex,
    pub graph: ImportGraph,
    pub centrality: CentralityScores,
}

/// Walk, index, graph and score the project at `root`.
///
/// # Errors
///
/// Returns [`DocsyncError`] if the root is missing, an ignore pattern is
/// invalid, or an indexing task fails.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use docsync_core::DocsyncConfig;
/// use docsync_graph::analyze_project;
///
/// # async fn run() -> Result<(), docsync_core::DocsyncError> {
/// let analysis = analyze_project(Path::new("."), &DocsyncConfig::default()).await?;
/// for (path, score) in analysis.centrality.top(10) {
///     println!("{score:>3}  {path}");
/// }
/// # Ok(())
/// # }
/// ```
pub async fn analyze_project(
    root: &Path,
    config: &DocsyncConfig,
) -> Result<ProjectAnalysis, DocsyncError> {
    let entries = walker::walk_project(root, &config.index)?;
    let index = FileIndex::build(root, entries, &config.index, &ExtractorRegistry::default()).await?;
    let graph = ImportGraphBuilder::default().build(&index);
    let centrality = CentralityScores::score(&graph);

    info!(
        files = index.len(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "analyzed project"
    );
    Ok(ProjectAnalysis {
        index,
        graph,
        centrality,
    })
}
