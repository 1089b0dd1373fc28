use std::collections::HashMap;

use docsync_core::is_entry_point;

use crate::graph::ImportGraph;

const ENTRY_POINT_BONUS: u32 = 5;
const UTILITY_BONUS: u32 = 3;
const CONFIG_BONUS: u32 = 3;

/// Per-file centrality on a 0–100 scale.
///
/// Raw score is `2 * fan_in + fan_out + bonus`, where the bonus rewards entry
/// points, shared utility directories and configuration files. Raw scores are
/// divided by the maximum and rounded, so the most central file scores 100.
/// If every raw score is zero, every normalized score is zero.
///
/// # Examples
///
/// ```
/// use docsync_graph::centrality::CentralityScores;
/// use docsync_graph::graph::ImportGraph;
///
/// let mut graph = ImportGraph::default();
/// graph.add_edge("src/routes.js", "src/db.js");
/// graph.add_edge("src/jobs.js", "src/db.js");
///
/// let scores = CentralityScores::score(&graph);
/// assert_eq!(scores.get("src/db.js"), 100);
/// assert_eq!(scores.get("src/routes.js"), 25);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CentralityScores {
    scores: HashMap<String, u32>,
}

impl CentralityScores {
    /// Score every node of `graph`.
    pub fn score(graph: &ImportGraph) -> Self {
        let raw: Vec<(&str, u32)> = graph
            .nodes()
            .map(|path| (path, raw_score(graph, path)))
            .collect();
        let max = raw.iter().map(|(_, s)| *s).max().unwrap_or(0);

        let scores = raw
            .into_iter()
            .map(|(path, s)| {
                let normalized = if max == 0 {
                    0
                } else {
                    (f64::from(s) / f64::from(max) * 100.0).round() as u32
                };
                (path.to_string(), normalized)
            })
            .collect();
        Self { scores }
    }

    /// Normalized score for `path`, or 0 if it is not a graph node.
    pub fn get(&self, path: &str) -> u32 {
        self.scores.get(path).copied().unwrap_or(0)
    }

    /// The `n` highest-scoring files, ties broken by path.
    pub fn top(&self, n: usize) -> Vec<(&str, u32)> {
        let mut all: Vec<(&str, u32)> = self
            .scores
            .iter()
            .map(|(p, s)| (p.as_str(), *s))
            .collect();
        all.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        all.truncate(n);
        all
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Unnormalized score: `2 * fan_in + fan_out + bonus(path)`.
pub fn raw_score(graph: &ImportGraph, path: &str) -> u32 {
    2 * graph.fan_in(path) as u32 + graph.fan_out(path) as u32 + bonus(path)
}

/// Structural bonus from the path alone.
///
/// ```
/// use docsync_graph::centrality::bonus;
///
/// assert_eq!(bonus("src/main.rs"), 5);
/// assert_eq!(bonus("src/utils/date.js"), 3);
/// assert_eq!(bonus("config/app.config.js"), 8);
/// assert_eq!(bonus("src/models/user.py"), 0);
/// ```
pub fn bonus(path: &str) -> u32 {
    let mut segments: Vec<&str> = path.split('/').collect();
    let name = segments.pop().unwrap_or("");
    let lower_name = name.to_lowercase();

    let mut bonus = 0;
    if is_entry_point(name) {
        bonus += ENTRY_POINT_BONUS;
    }
    if segments
        .iter()
        .any(|s| matches!(s.to_lowercase().as_str(), "utils" | "helpers"))
    {
        bonus += UTILITY_BONUS;
    }
    if segments.iter().any(|s| s.eq_ignore_ascii_case("config")) || lower_name.contains("config") {
        bonus += CONFIG_BONUS;
    }
    bonus
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_graph_scores_nothing() {
        let scores = CentralityScores::score(&ImportGraph::default());
        assert!(scores.is_empty());
        assert_eq!(scores.get("anything"), 0);
    }

    #[test]
    fn all_zero_raw_scores_stay_zero() {
        let mut graph = ImportGraph::default();
        graph.add_node("a.js");
        graph.add_node("b.js");
        let scores = CentralityScores::score(&graph);
        assert_eq!(scores.get("a.js"), 0);
        assert_eq!(scores.get("b.js"), 0);
    }

    #[test]
    fn isolated_entry_point_still_scores() {
        let mut graph = ImportGraph::default();
        graph.add_node("src/index.ts");
        graph.add_node("src/orphan.ts");
        let scores = CentralityScores::score(&graph);
        assert_eq!(scores.get("src/index.ts"), 100);
        assert_eq!(scores.get("src/orphan.ts"), 0);
    }

    #[test]
    fn fan_in_weighs_double() {
        let mut graph = ImportGraph::default();
        graph.add_edge("a.js", "b.js");
        assert_eq!(raw_score(&graph, "a.js"), 1);
        assert_eq!(raw_score(&graph, "b.js"), 2);

        let scores = CentralityScores::score(&graph);
        assert_eq!(scores.get("b.js"), 100);
        assert_eq!(scores.get("a.js"), 50);
    }

    #[test]
    fn adding_an_edge_never_lowers_raw_score() {
        let mut graph = ImportGraph::default();
        graph.add_edge("a.js", "b.js");
        let before = raw_score(&graph, "b.js");
        graph.add_edge("c.js", "b.js");
        assert!(raw_score(&graph, "b.js") > before);
        let before_a = raw_score(&graph, "a.js");
        graph.add_edge("a.js", "c.js");
        assert!(raw_score(&graph, "a.js") > before_a);
    }

    #[test]
    fn self_loops_are_counted_once_each_way() {
        let mut graph = ImportGraph::default();
        graph.add_edge("a.js", "a.js");
        assert_eq!(raw_score(&graph, "a.js"), 3);
        assert_eq!(CentralityScores::score(&graph).get("a.js"), 100);
    }

    #[test]
    fn bonuses_stack() {
        assert_eq!(bonus("App.tsx"), 5);
        assert_eq!(bonus("server.go"), 5);
        assert_eq!(bonus("lib/helpers/config_loader.rb"), 6);
        assert_eq!(bonus("src/Utils/x.js"), 3);
        assert_eq!(bonus("src/utilsx/x.js"), 0);
    }

    #[test]
    fn top_breaks_ties_by_path() {
        let mut graph = ImportGraph::default();
        graph.add_edge("z.js", "hub.js");
        graph.add_edge("y.js", "hub.js");
        let scores = CentralityScores::score(&graph);
        let top = scores.top(3);
        assert_eq!(top[0], ("hub.js", 100));
        assert_eq!(top[1].0, "y.js");
        assert_eq!(top[2].0, "z.js");
    }
}
