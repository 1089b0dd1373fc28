//! Relative import resolution against a [`FileIndex`].
//!
//! Resolution is pure lookup: no filesystem access. A [`Resolver`] holds an
//! ordered list of strategies and the first one that yields a path wins.

use crate::index::FileIndex;

/// Extensions tried when an import omits one, in order.
pub const CANDIDATE_EXTENSIONS: &[&str] = &[
    "js", "jsx", "ts", "tsx", "json", "mjs", "cjs", "vue", "py", "rb", "rs", "go",
];

/// Directory entry files tried by [`index_fallback`], in order.
pub const INDEX_BASENAMES: &[&str] = &["index", "__init__", "mod"];

/// A single resolution strategy: `(from_path, raw_import, index) -> path`.
pub type ResolveFn = fn(&str, &str, &FileIndex) -> Option<String>;

/// Ordered list of resolution strategies.
///
/// # Examples
///
/// ```
/// use docsync_core::FileRecord;
/// use docsync_graph::index::FileIndex;
/// use docsync_graph::resolve::Resolver;
///
/// let record = |path: &str| FileRecord {
///     path: path.into(),
///     extension: "js".into(),
///     size: 0,
///     modified: 0,
///     imports: vec![],
///     exports: vec![],
///     content_hash: String::new(),
/// };
/// let index = FileIndex::from_records(vec![record("src/app.js"), record("src/lib/index.js")]);
/// let resolver = Resolver::default();
///
/// assert_eq!(resolver.resolve("src/app.js", "./lib", &index).as_deref(), Some("src/lib/index.js"));
/// assert_eq!(resolver.resolve("src/lib/index.js", "../app", &index).as_deref(), Some("src/app.js"));
/// assert_eq!(resolver.resolve("src/app.js", "react", &index), None);
/// ```
pub struct Resolver {
    strategies: Vec<(&'static str, ResolveFn)>,
}

impl Resolver {
    /// Build a resolver from explicit strategies, evaluated in order.
    pub fn new(strategies: Vec<(&'static str, ResolveFn)>) -> Self {
        Self { strategies }
    }

    /// Names of the strategies in evaluation order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|(name, _)| *name).collect()
    }

    /// Resolve `raw` as imported from `from` to an indexed path.
    ///
    /// Returns `None` for external (non-relative) specifiers, malformed input,
    /// and relative specifiers that match nothing in the index.
    pub fn resolve(&self, from: &str, raw: &str, index: &FileIndex) -> Option<String> {
        if !is_relative(raw) {
            return None;
        }
        self.strategies
            .iter()
            .find_map(|(_, strategy)| strategy(from, raw, index))
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(vec![
            ("exact", exact as ResolveFn),
            ("extension", with_extension as ResolveFn),
            ("index", index_fallback as ResolveFn),
        ])
    }
}

/// Relative specifiers start with `.` or `/`; everything else is external.
pub fn is_relative(raw: &str) -> bool {
    raw.starts_with('.') || raw.starts_with('/')
}

/// Join `raw` onto the directory of `from`, normalising `.` and `..`.
///
/// A leading `/` anchors at the project root. Query strings and fragments
/// (`./a.svg?raw`) are dropped. Returns `None` if the path climbs above the
/// root or normalises to nothing.
///
/// # Examples
///
/// ```
/// use docsync_graph::resolve::join_relative;
///
/// assert_eq!(join_relative("src/a/b.js", "../c").as_deref(), Some("src/c"));
/// assert_eq!(join_relative("src/a/b.js", "./d/./e").as_deref(), Some("src/a/d/e"));
/// assert_eq!(join_relative("src/a/b.js", "/lib/x").as_deref(), Some("lib/x"));
/// assert_eq!(join_relative("b.js", "../../x"), None);
/// ```
pub fn join_relative(from: &str, raw: &str) -> Option<String> {
    let raw = raw.split(['?', '#']).next().unwrap_or("");
    let mut segments: Vec<&str> = if raw.starts_with('/') {
        Vec::new()
    } else {
        let mut dir: Vec<&str> = from.split('/').collect();
        dir.pop();
        dir
    };

    for part in raw.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}

/// The joined path itself is an indexed file.
pub fn exact(from: &str, raw: &str, index: &FileIndex) -> Option<String> {
    let target = join_relative(from, raw)?;
    index.contains(&target).then_some(target)
}

/// The joined path plus one of [`CANDIDATE_EXTENSIONS`].
pub fn with_extension(from: &str, raw: &str, index: &FileIndex) -> Option<String> {
    let target = join_relative(from, raw)?;
    CANDIDATE_EXTENSIONS
        .iter()
        .map(|ext| format!("{target}.{ext}"))
        .find(|candidate| index.contains(candidate))
}

/// The joined path as a directory holding an index file.
pub fn index_fallback(from: &str, raw: &str, index: &FileIndex) -> Option<String> {
    let target = join_relative(from, raw)?;
    INDEX_BASENAMES.iter().find_map(|base| {
        CANDIDATE_EXTENSIONS
            .iter()
            .map(|ext| format!("{target}/{base}.{ext}"))
            .find(|candidate| index.contains(candidate))
    })
}
