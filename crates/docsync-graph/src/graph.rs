use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use tracing::debug;

use crate::index::FileIndex;
use crate::resolve::Resolver;

/// Directed import graph over indexed files.
///
/// An edge `a -> b` means `a` imports `b`. Nodes are the source files of the
/// index plus any non-source file an import resolved to (a `.json` import,
/// say). The latter departs from a source-only node set: such targets take
/// part in fan-in and centrality like any other node, but never have
/// outgoing edges since only source files are scanned for imports.
/// Parallel edges are collapsed; self-loops and cycles are kept.
///
/// # Examples
///
/// ```
/// use docsync_graph::graph::ImportGraph;
///
/// let mut graph = ImportGraph::default();
/// graph.add_edge("src/app.js", "src/db.js");
/// graph.add_edge("src/api.js", "src/db.js");
/// graph.add_edge("src/api.js", "src/db.js");
///
/// assert_eq!(graph.fan_in("src/db.js"), 2);
/// assert_eq!(graph.fan_out("src/api.js"), 1);
/// assert_eq!(graph.imported_by("src/db.js"), vec!["src/api.js", "src/app.js"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ImportGraph {
    graph: DiGraph<String, ()>,
    path_to_index: HashMap<String, NodeIndex>,
    unresolved: usize,
}

impl ImportGraph {
    /// Add a node for `path` if it is not present yet.
    pub fn add_node(&mut self, path: &str) -> NodeIndex {
        if let Some(&idx) = self.path_to_index.get(path) {
            return idx;
        }
        let idx = self.graph.add_node(path.to_string());
        self.path_to_index.insert(path.to_string(), idx);
        idx
    }

    /// Add an edge `from -> to`, creating nodes as needed.
    ///
    /// Returns `false` if the edge already existed.
    pub fn add_edge(&mut self, from: &str, to: &str) -> bool {
        let a = self.add_node(from);
        let b = self.add_node(to);
        if self.graph.contains_edge(a, b) {
            return false;
        }
        self.graph.add_edge(a, b, ());
        true
    }

    pub fn contains(&self, path: &str) -> bool {
        self.path_to_index.contains_key(path)
    }

    pub fn contains_edge(&self, from: &str, to: &str) -> bool {
        match (self.path_to_index.get(from), self.path_to_index.get(to)) {
            (Some(&a), Some(&b)) => self.graph.contains_edge(a, b),
            _ => false,
        }
    }

    /// Number of distinct files importing `path`.
    pub fn fan_in(&self, path: &str) -> usize {
        self.degree(path, Direction::Incoming)
    }

    /// Number of distinct files `path` imports.
    pub fn fan_out(&self, path: &str) -> usize {
        self.degree(path, Direction::Outgoing)
    }

    /// Files imported by `path`, sorted.
    pub fn imports_of(&self, path: &str) -> Vec<&str> {
        self.neighbors(path, Direction::Outgoing)
    }

    /// Files importing `path`, sorted.
    pub fn imported_by(&self, path: &str) -> Vec<&str> {
        self.neighbors(path, Direction::Incoming)
    }

    /// All node paths in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Relative imports that matched no indexed file during the build.
    pub fn unresolved(&self) -> usize {
        self.unresolved
    }

    fn degree(&self, path: &str, direction: Direction) -> usize {
        self.path_to_index
            .get(path)
            .map_or(0, |&idx| self.graph.neighbors_directed(idx, direction).count())
    }

    fn neighbors(&self, path: &str, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.path_to_index.get(path) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].as_str())
            .collect();
        out.sort_unstable();
        out
    }
}

/// Builds an [`ImportGraph`] from a [`FileIndex`].
///
/// # Examples
///
/// ```
/// use docsync_core::FileRecord;
/// use docsync_graph::graph::ImportGraphBuilder;
/// use docsync_graph::index::FileIndex;
///
/// let record = |path: &str, imports: &[&str]| FileRecord {
///     path: path.into(),
///     extension: "ts".into(),
///     size: 0,
///     modified: 0,
///     imports: imports.iter().map(|s| s.to_string()).collect(),
///     exports: vec![],
///     content_hash: String::new(),
/// };
/// let index = FileIndex::from_records(vec![
///     record("src/index.ts", &["./db", "express"]),
///     record("src/db.ts", &[]),
/// ]);
/// let graph = ImportGraphBuilder::default().build(&index);
/// assert!(graph.contains_edge("src/index.ts", "src/db.ts"));
/// assert_eq!(graph.edge_count(), 1);
/// ```
#[derive(Default)]
pub struct ImportGraphBuilder {
    resolver: Resolver,
}

impl ImportGraphBuilder {
    pub fn new(resolver: Resolver) -> Self {
        Self { resolver }
    }

    /// Resolve every source file's relative imports into edges.
    ///
    /// Visits records in index order, so identical input yields an identical
    /// graph. External specifiers are skipped; relative ones that resolve to
    /// nothing are counted in [`ImportGraph::unresolved`].
    pub fn build(&self, index: &FileIndex) -> ImportGraph {
        let mut graph = ImportGraph::default();

        let sources: Vec<_> = index.iter().filter(|r| r.is_source()).collect();
        for record in &sources {
            graph.add_node(&record.path);
        }

        for record in &sources {
            let mut targets = HashSet::new();
            for raw in &record.imports {
                if !crate::resolve::is_relative(raw) {
                    continue;
                }
                match self.resolver.resolve(&record.path, raw, index) {
                    Some(target) => {
                        if targets.insert(target.clone()) {
                            graph.add_edge(&record.path, &target);
                        }
                    }
                    None => graph.unresolved += 1,
                }
            }
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            unresolved = graph.unresolved,
            "built import graph"
        );
        graph
    }
}
