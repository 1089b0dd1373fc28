use std::cmp::Ordering;

use docsync_core::{FileRecord, RankWeights};
use docsync_graph::centrality::CentralityScores;
use docsync_graph::graph::ImportGraph;
use docsync_graph::index::FileIndex;
use docsync_history::recency::RecentChanges;
use serde::Serialize;

/// Bytes at which the complexity signal saturates.
const COMPLEXITY_SATURATION: f64 = 10_000.0;

/// Per-file inputs to the relevance score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Signals {
    /// Share of recent revisions touching the file, relative to the busiest file.
    pub recency: f64,
    /// Raw number of files importing this one.
    pub fan_in: usize,
    /// `min(size / 10000, 1)`.
    pub complexity: f64,
    /// Centrality score divided by 100.
    pub centrality: f64,
    /// Fixed weight of the file's kind.
    pub type_score: f64,
}

/// A file and its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredFile {
    pub path: String,
    pub score: f64,
    pub signals: Signals,
}

/// Weighted relevance ranking over every indexed file.
///
/// ```text
/// score = w.recency * recency + w.fan_in * fan_in + w.complexity * complexity
///       + w.centrality * centrality + w.file_type * type_score
/// ```
///
/// with default weights 50, 10, 5, 8 and 7. Pure: reads no files.
///
/// # Examples
///
/// ```
/// use docsync_core::{FileRecord, RankWeights};
/// use docsync_graph::centrality::CentralityScores;
/// use docsync_graph::graph::ImportGraphBuilder;
/// use docsync_graph::index::FileIndex;
/// use docsync_history::recency::RecentChanges;
/// use docsync_select::ranker::RelevanceRanker;
///
/// let record = |path: &str, imports: &[&str]| FileRecord {
///     path: path.into(),
///     extension: path.rsplit_once('.').map(|(_, e)| e).unwrap_or("").into(),
///     size: 500,
///     modified: 0,
///     imports: imports.iter().map(|s| s.to_string()).collect(),
///     exports: vec![],
///     content_hash: String::new(),
/// };
/// let index = FileIndex::from_records(vec![
///     record("src/index.js", &["./db"]),
///     record("src/db.js", &[]),
///     record("notes.txt", &[]),
/// ]);
/// let graph = ImportGraphBuilder::default().build(&index);
/// let centrality = CentralityScores::score(&graph);
///
/// let ranker = RelevanceRanker::new(RankWeights::default());
/// let top = ranker.rank(&index, &graph, &centrality, &RecentChanges::default(), 2);
/// assert_eq!(top.len(), 2);
/// assert_eq!(top[0].path, "src/db.js");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RelevanceRanker {
    weights: RankWeights,
}

impl RelevanceRanker {
    pub fn new(weights: RankWeights) -> Self {
        Self { weights }
    }

    /// The `k` most relevant files, best first, ties broken by path.
    pub fn rank(
        &self,
        index: &FileIndex,
        graph: &ImportGraph,
        centrality: &CentralityScores,
        recent: &RecentChanges,
        k: usize,
    ) -> Vec<ScoredFile> {
        let mut scored: Vec<ScoredFile> = index
            .iter()
            .map(|record| {
                let signals = signals(record, graph, centrality, recent);
                ScoredFile {
                    path: record.path.clone(),
                    score: self.score(&signals),
                    signals,
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.path.cmp(&b.path))
        });
        scored.truncate(k);
        scored
    }

    /// Weighted sum of `signals`. A non-finite result scores 0.
    pub fn score(&self, s: &Signals) -> f64 {
        let w = &self.weights;
        let score = w.recency * s.recency
            + w.fan_in * s.fan_in as f64
            + w.complexity * s.complexity
            + w.centrality * s.centrality
            + w.file_type * s.type_score;
        if score.is_finite() {
            score
        } else {
            0.0
        }
    }
}

fn signals(
    record: &FileRecord,
    graph: &ImportGraph,
    centrality: &CentralityScores,
    recent: &RecentChanges,
) -> Signals {
    Signals {
        recency: recent.factor(&record.path),
        fan_in: graph.fan_in(&record.path),
        complexity: (record.size as f64 / COMPLEXITY_SATURATION).min(1.0),
        centrality: f64::from(centrality.get(&record.path)) / 100.0,
        type_score: record.kind().weight(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsync_graph::graph::ImportGraphBuilder;

    fn record(path: &str, size: u64, imports: &[&str]) -> FileRecord {
        FileRecord {
            path: path.into(),
            extension: path.rsplit_once('.').map(|(_, e)| e).unwrap_or("").into(),
            size,
            modified: 0,
            imports: imports.iter().map(|s| s.to_string()).collect(),
            exports: vec![],
            content_hash: String::new(),
        }
    }

    fn setup(records: Vec<FileRecord>) -> (FileIndex, ImportGraph, CentralityScores) {
        let index = FileIndex::from_records(records);
        let graph = ImportGraphBuilder::default().build(&index);
        let centrality = CentralityScores::score(&graph);
        (index, graph, centrality)
    }

    #[test]
    fn score_matches_weighted_formula() {
        let ranker = RelevanceRanker::default();
        let s = Signals {
            recency: 0.5,
            fan_in: 3,
            complexity: 0.2,
            centrality: 0.75,
            type_score: 0.6,
        };
        let expected = 50.0 * 0.5 + 10.0 * 3.0 + 5.0 * 0.2 + 8.0 * 0.75 + 7.0 * 0.6;
        assert!((ranker.score(&s) - expected).abs() < 1e-9);
    }

    #[test]
    fn signals_are_derived_from_inputs() {
        let (index, graph, centrality) = setup(vec![
            record("src/a.js", 25_000, &["./b"]),
            record("src/b.js", 2_500, &[]),
        ]);
        let recent = RecentChanges::from_revisions(vec![
            vec!["src/a.js".into()],
            vec!["src/a.js".into(), "src/b.js".into()],
        ]);

        let a = signals(index.get("src/a.js").unwrap(), &graph, &centrality, &recent);
        assert_eq!(a.complexity, 1.0);
        assert_eq!(a.recency, 1.0);
        assert_eq!(a.fan_in, 0);

        let b = signals(index.get("src/b.js").unwrap(), &graph, &centrality, &recent);
        assert_eq!(b.complexity, 0.25);
        assert_eq!(b.recency, 0.5);
        assert_eq!(b.fan_in, 1);
        assert_eq!(b.centrality, 1.0);
        assert_eq!(b.type_score, 0.6);
    }

    #[test]
    fn recency_dominates() {
        let (index, graph, centrality) = setup(vec![
            record("src/hub.js", 100, &[]),
            record("src/x.js", 100, &["./hub"]),
            record("src/y.js", 100, &["./hub"]),
            record("docs/changelog.md", 100, &[]),
        ]);
        let recent = RecentChanges::from_revisions(vec![vec!["docs/changelog.md".into()]]);
        let top = RelevanceRanker::default().rank(&index, &graph, &centrality, &recent, 1);
        assert_eq!(top[0].path, "docs/changelog.md");
    }

    #[test]
    fn ties_break_by_path_and_output_is_bounded() {
        let (index, graph, centrality) = setup(vec![
            record("c.txt", 10, &[]),
            record("a.txt", 10, &[]),
            record("b.txt", 10, &[]),
        ]);
        let recent = RecentChanges::default();
        let ranker = RelevanceRanker::default();

        let top = ranker.rank(&index, &graph, &centrality, &recent, 2);
        let paths: Vec<&str> = top.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a.txt", "b.txt"]);
        assert_eq!(top[0].score, top[1].score);

        assert!(ranker.rank(&index, &graph, &centrality, &recent, 0).is_empty());
        assert_eq!(ranker.rank(&index, &graph, &centrality, &recent, 10).len(), 3);
    }

    #[test]
    fn ranking_is_deterministic() {
        let records = vec![
            record("src/index.ts", 4_000, &["./api", "./db"]),
            record("src/api.ts", 9_000, &["./db"]),
            record("src/db.ts", 3_000, &[]),
            record("package.json", 800, &[]),
            record("README.md", 1_200, &[]),
            record("src/util.ts", 3_000, &[]),
        ];
        let recent = RecentChanges::from_revisions(vec![
            vec!["src/api.ts".into(), "README.md".into()],
            vec!["src/api.ts".into()],
        ]);
        let ranker = RelevanceRanker::default();

        let (i1, g1, c1) = setup(records.clone());
        let (i2, g2, c2) = setup(records);
        let first = ranker.rank(&i1, &g1, &c1, &recent, 5);
        let second = ranker.rank(&i2, &g2, &c2, &recent, 5);
        assert_eq!(first, second);
        for pair in first.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn non_finite_scores_become_zero() {
        let ranker = RelevanceRanker::new(RankWeights {
            recency: f64::NAN,
            ..RankWeights::default()
        });
        let s = Signals {
            recency: 1.0,
            fan_in: 0,
            complexity: 0.0,
            centrality: 0.0,
            type_score: 0.1,
        };
        assert_eq!(ranker.score(&s), 0.0);
    }
}
