use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Extensions treated as source code (graph nodes, import extraction).
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "js", "jsx", "mjs", "cjs", "ts", "tsx", "vue", "svelte", "py", "rs", "go", "rb", "java", "kt",
    "php", "c", "h", "cpp", "hpp", "cs", "swift",
];

const DATA_EXTENSIONS: &[&str] = &["json", "yaml", "yml", "toml", "xml", "ini", "cfg"];

const DOC_EXTENSIONS: &[&str] = &["md", "mdx", "rst", "txt", "adoc"];

const BUILD_FILES: &[&str] = &[
    "package.json",
    "cargo.toml",
    "pyproject.toml",
    "setup.py",
    "go.mod",
    "gemfile",
    "pom.xml",
    "build.gradle",
    "makefile",
    "dockerfile",
    "tsconfig.json",
    "requirements.txt",
    "composer.json",
];

const ENTRY_POINT_PREFIXES: &[&str] = &["index", "main", "app", "server"];

/// A file discovered during indexing.
///
/// `path` is the file's identity: repository-relative with `/` separators,
/// which is also the form version-control history reports paths in.
///
/// # Examples
///
/// ```
/// use docsync_core::{FileKind, FileRecord};
///
/// let record = FileRecord {
///     path: "src/index.ts".into(),
///     extension: "ts".into(),
///     size: 1200,
///     modified: 1_700_000_000,
///     imports: vec!["./app".into()],
///     exports: vec!["start".into()],
///     content_hash: String::new(),
/// };
/// assert_eq!(record.file_name(), "index.ts");
/// assert_eq!(record.kind(), FileKind::EntryPoint);
/// assert!(record.is_source());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Repository-relative path with `/` separators.
    pub path: String,
    /// Lower-case extension without the dot (empty when none).
    pub extension: String,
    /// File size in bytes.
    pub size: u64,
    /// Modification time as a Unix timestamp.
    pub modified: i64,
    /// Raw import identifiers, deduplicated, in first-seen order.
    pub imports: Vec<String>,
    /// Raw export identifiers, deduplicated, in first-seen order.
    pub exports: Vec<String>,
    /// Hex sha256 of the scanned content.
    pub content_hash: String,
}

impl FileRecord {
    /// Last path segment.
    pub fn file_name(&self) -> &str {
        file_name(&self.path)
    }

    /// Whether this file participates in the import graph.
    pub fn is_source(&self) -> bool {
        SOURCE_EXTENSIONS.contains(&self.extension.as_str())
    }

    /// Type category used for relevance ranking.
    pub fn kind(&self) -> FileKind {
        FileKind::classify(&self.path)
    }
}

/// Last `/`-separated segment of a path.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Returns `true` if the file name starts with `index`, `main`, `app` or
/// `server`, ignoring case.
///
/// # Examples
///
/// ```
/// use docsync_core::is_entry_point;
///
/// assert!(is_entry_point("src/index.js"));
/// assert!(is_entry_point("Server.ts"));
/// assert!(is_entry_point("lib/application.py"));
/// assert!(!is_entry_point("src/domain/main_helpers/util.js"));
/// ```
pub fn is_entry_point(path: &str) -> bool {
    let name = file_name(path).to_lowercase();
    ENTRY_POINT_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// Source files that hold configuration: a name starting with `config` or
/// `settings`, or anything under a `config/`, `configs/` or `settings/`
/// directory.
fn is_config_source(path: &str) -> bool {
    let lower = path.to_lowercase();
    let mut segments: Vec<&str> = lower.split('/').collect();
    let name = segments.pop().unwrap_or("");
    name.starts_with("config")
        || name.starts_with("settings")
        || segments
            .iter()
            .any(|s| matches!(*s, "config" | "configs" | "settings"))
}

/// Coarse file category, each with a fixed importance weight.
///
/// # Examples
///
/// ```
/// use docsync_core::FileKind;
///
/// assert_eq!(FileKind::classify("package.json"), FileKind::Build);
/// assert_eq!(FileKind::classify("src/main.rs"), FileKind::EntryPoint);
/// assert_eq!(FileKind::classify("src/graph.rs"), FileKind::Source);
/// assert_eq!(FileKind::classify("data/fixtures.yaml"), FileKind::Data);
/// assert_eq!(FileKind::classify("README.md"), FileKind::Docs);
/// assert_eq!(FileKind::classify("logo.svg"), FileKind::Other);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FileKind {
    /// Build manifests and configuration (`package.json`, `*.config.js`,
    /// `config/db.ts`, `settings.py`, ...).
    Build,
    /// Source files whose name marks them as an entry point.
    EntryPoint,
    /// Any other source file.
    Source,
    /// Structured data (`.json`, `.yaml`, `.toml`, ...).
    Data,
    /// Documentation and prose.
    Docs,
    /// Everything else.
    Other,
}

impl FileKind {
    /// Classify a repository-relative path.
    pub fn classify(path: &str) -> Self {
        let name = file_name(path).to_lowercase();
        let ext = name.rsplit_once('.').map(|(_, e)| e).unwrap_or("");

        if BUILD_FILES.contains(&name.as_str()) || name.contains(".config.") {
            return FileKind::Build;
        }
        if SOURCE_EXTENSIONS.contains(&ext) {
            if is_config_source(path) {
                return FileKind::Build;
            }
            if is_entry_point(&name) {
                return FileKind::EntryPoint;
            }
            return FileKind::Source;
        }
        if DATA_EXTENSIONS.contains(&ext) {
            return FileKind::Data;
        }
        if DOC_EXTENSIONS.contains(&ext) {
            return FileKind::Docs;
        }
        FileKind::Other
    }

    /// Fixed importance weight in `[0.0, 1.0]`.
    pub fn weight(self) -> f64 {
        match self {
            FileKind::Build => 0.9,
            FileKind::EntryPoint => 0.8,
            FileKind::Source => 0.6,
            FileKind::Data => 0.5,
            FileKind::Docs => 0.3,
            FileKind::Other => 0.1,
        }
    }
}

/// Output format for CLI subcommands.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use docsync_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tables and summaries.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
