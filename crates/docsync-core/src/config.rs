use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DocsyncError;

/// Top-level configuration loaded from `.docsync.toml`.
///
/// Supports layered resolution: CLI flags > local config > defaults. Every
/// field has a default, so an empty file is a valid configuration.
///
/// # Examples
///
/// ```
/// use docsync_core::DocsyncConfig;
///
/// let config = DocsyncConfig::default();
/// assert_eq!(config.thresholds.full_min_files, 10);
/// assert_eq!(config.rank.top_k, 15);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocsyncConfig {
    /// File indexing settings.
    #[serde(default)]
    pub index: IndexConfig,
    /// Path patterns used to flag change impact.
    #[serde(default)]
    pub impact: ImpactConfig,
    /// Policy constants for the cache decision.
    #[serde(default)]
    pub thresholds: Thresholds,
    /// Relevance ranking settings.
    #[serde(default)]
    pub rank: RankConfig,
    /// On-disk cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

impl DocsyncConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DocsyncError::Io`] if the file cannot be read, or
    /// [`DocsyncError::Toml`] if the content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, DocsyncError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`DocsyncError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use docsync_core::DocsyncConfig;
    ///
    /// let toml = r#"
    /// [thresholds]
    /// full_min_files = 20
    /// "#;
    /// let config = DocsyncConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.thresholds.full_min_files, 20);
    /// assert_eq!(config.thresholds.full_min_lines, 500);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, DocsyncError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load `.docsync.toml` from `root` if present, defaults otherwise.
    ///
    /// # Errors
    ///
    /// Fails only when the file exists but cannot be read or parsed.
    pub fn discover(root: &Path) -> Result<Self, DocsyncError> {
        let path = root.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Name of the per-project configuration file.
pub const CONFIG_FILE_NAME: &str = ".docsync.toml";

/// File indexing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Files larger than this many bytes are skipped (default: 1 MiB).
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Bytes read from the head of each file for import extraction (default: 8192).
    #[serde(default = "default_scan_bytes")]
    pub scan_bytes: usize,
    /// Concurrent reads per indexing batch (default: 10).
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Extra glob patterns to skip, on top of `.gitignore`.
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

fn default_max_file_size() -> u64 {
    1_048_576
}

fn default_scan_bytes() -> usize {
    8192
}

fn default_batch_size() -> usize {
    10
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            scan_bytes: default_scan_bytes(),
            batch_size: default_batch_size(),
            ignore_patterns: Vec::new(),
        }
    }
}

/// Path patterns for the change-impact flags.
///
/// API and config patterns are case-insensitive substrings of the touched
/// path. Manifest patterns match the file name exactly, ignoring case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactConfig {
    /// Substrings marking a public API surface.
    #[serde(default = "default_api_patterns")]
    pub api_patterns: Vec<String>,
    /// File names of dependency manifests and lockfiles.
    #[serde(default = "default_manifest_patterns")]
    pub manifest_patterns: Vec<String>,
    /// Substrings marking configuration files.
    #[serde(default = "default_config_patterns")]
    pub config_patterns: Vec<String>,
    /// A change touching more than this many top-level modules is cross-cutting (default: 3).
    #[serde(default = "default_many_modules_threshold")]
    pub many_modules_threshold: usize,
}

fn default_api_patterns() -> Vec<String> {
    [
        "api/",
        "routes/",
        "controllers/",
        "endpoints/",
        "handlers/",
        "openapi",
        "swagger",
        "graphql",
        ".proto",
        "/index.",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

fn default_manifest_patterns() -> Vec<String> {
    [
        "package.json",
        "package-lock.json",
        "yarn.lock",
        "pnpm-lock.yaml",
        "Cargo.toml",
        "Cargo.lock",
        "requirements.txt",
        "pyproject.toml",
        "Pipfile",
        "poetry.lock",
        "go.mod",
        "go.sum",
        "Gemfile",
        "Gemfile.lock",
        "pom.xml",
        "build.gradle",
        "composer.json",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

fn default_config_patterns() -> Vec<String> {
    [
        "config",
        ".env",
        ".eslintrc",
        ".prettierrc",
        "webpack",
        "babel",
        "docker",
        ".yml",
        ".yaml",
        ".ini",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

fn default_many_modules_threshold() -> usize {
    3
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            api_patterns: default_api_patterns(),
            manifest_patterns: default_manifest_patterns(),
            config_patterns: default_config_patterns(),
            many_modules_threshold: default_many_modules_threshold(),
        }
    }
}

/// Policy constants for the update decision.
///
/// All comparisons are strict except `partial_max_files`, which is an
/// inclusive upper bound.
///
/// # Examples
///
/// ```
/// use docsync_core::Thresholds;
///
/// let t = Thresholds::default();
/// assert_eq!(t.full_min_lines, 500);
/// assert_eq!(t.max_single_file_lines, 1000);
/// assert_eq!(t.partial_max_files, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Full rebuild needs more touched files than this (default: 10)...
    #[serde(default = "default_full_min_files")]
    pub full_min_files: usize,
    /// ...together with more changed lines than this (default: 500).
    #[serde(default = "default_full_min_lines")]
    pub full_min_lines: u64,
    /// Full rebuild when the API surface changes in more files than this (default: 2).
    #[serde(default = "default_api_min_files")]
    pub api_min_files: usize,
    /// Full rebuild when a cross-cutting change exceeds this many lines (default: 100).
    #[serde(default = "default_many_modules_min_lines")]
    pub many_modules_min_lines: u64,
    /// Full rebuild when any single file changes by more lines than this (default: 1000).
    #[serde(default = "default_max_single_file_lines")]
    pub max_single_file_lines: u64,
    /// Partial update for more than one and at most this many files (default: 5).
    #[serde(default = "default_partial_max_files")]
    pub partial_max_files: usize,
    /// Partial update when a lone file changes by more lines than this (default: 200).
    #[serde(default = "default_partial_single_file_lines")]
    pub partial_single_file_lines: u64,
}

fn default_full_min_files() -> usize {
    10
}

fn default_full_min_lines() -> u64 {
    500
}

fn default_api_min_files() -> usize {
    2
}

fn default_many_modules_min_lines() -> u64 {
    100
}

fn default_max_single_file_lines() -> u64 {
    1000
}

fn default_partial_max_files() -> usize {
    5
}

fn default_partial_single_file_lines() -> u64 {
    200
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            full_min_files: default_full_min_files(),
            full_min_lines: default_full_min_lines(),
            api_min_files: default_api_min_files(),
            many_modules_min_lines: default_many_modules_min_lines(),
            max_single_file_lines: default_max_single_file_lines(),
            partial_max_files: default_partial_max_files(),
            partial_single_file_lines: default_partial_single_file_lines(),
        }
    }
}

/// Relevance ranking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankConfig {
    /// Number of files to select (default: 15).
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Number of recent revisions scanned for the recency signal (default: 30).
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Lines of content included per selected file (default: 100).
    #[serde(default = "default_preview_lines")]
    pub preview_lines: usize,
    /// Weights of the individual ranking signals.
    #[serde(default)]
    pub weights: RankWeights,
}

fn default_top_k() -> usize {
    15
}

fn default_history_window() -> usize {
    30
}

fn default_preview_lines() -> usize {
    100
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            history_window: default_history_window(),
            preview_lines: default_preview_lines(),
            weights: RankWeights::default(),
        }
    }
}

/// Weights of the relevance score terms.
///
/// # Examples
///
/// ```
/// use docsync_core::RankWeights;
///
/// let w = RankWeights::default();
/// assert_eq!(w.recency, 50.0);
/// assert_eq!(w.fan_in, 10.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankWeights {
    #[serde(default = "default_recency_weight")]
    pub recency: f64,
    #[serde(default = "default_fan_in_weight")]
    pub fan_in: f64,
    #[serde(default = "default_complexity_weight")]
    pub complexity: f64,
    #[serde(default = "default_centrality_weight")]
    pub centrality: f64,
    #[serde(default = "default_type_weight")]
    pub file_type: f64,
}

fn default_recency_weight() -> f64 {
    50.0
}

fn default_fan_in_weight() -> f64 {
    10.0
}

fn default_complexity_weight() -> f64 {
    5.0
}

fn default_centrality_weight() -> f64 {
    8.0
}

fn default_type_weight() -> f64 {
    7.0
}

impl Default for RankWeights {
    fn default() -> Self {
        Self {
            recency: default_recency_weight(),
            fan_in: default_fan_in_weight(),
            complexity: default_complexity_weight(),
            centrality: default_centrality_weight(),
            file_type: default_type_weight(),
        }
    }
}

/// On-disk cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache directory, relative to the project root (default: `.docsync`).
    #[serde(default = "default_cache_dir")]
    pub dir: String,
    /// Number of update records kept in the metadata history (default: 20).
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_cache_dir() -> String {
    ".docsync".into()
}

fn default_history_limit() -> usize {
    20
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            history_limit: default_history_limit(),
        }
    }
}
