use std::collections::BTreeSet;

use docsync_core::{file_name, ImpactConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::provider::{RevisionHistory, TouchedFile};

/// Summary of what changed between two revisions.
///
/// A default value is the "no signal" impact: zero counts, every flag false,
/// and `available == false`. Consumers must never read that as "nothing
/// changed".
///
/// # Examples
///
/// ```
/// use docsync_core::ImpactConfig;
/// use docsync_history::impact::ChangeImpact;
/// use docsync_history::provider::TouchedFile;
///
/// let impact = ChangeImpact::from_files(
///     vec![
///         TouchedFile::new("src/api/users.ts", 40, 2),
///         TouchedFile::new("package.json", 1, 1),
///     ],
///     &ImpactConfig::default(),
/// );
/// assert_eq!(impact.file_count, 2);
/// assert_eq!(impact.total_lines, 44);
/// assert_eq!(impact.max_lines_in_one_file, 42);
/// assert!(impact.touches_api);
/// assert!(impact.touches_dependency_manifest);
/// assert!(impact.available);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeImpact {
    /// Touched files, sorted by path.
    pub files: Vec<TouchedFile>,
    /// Always `files.len()`.
    pub file_count: usize,
    /// Sum of added and deleted lines over all files.
    pub total_lines: u64,
    /// Largest added-plus-deleted count of any single file.
    pub max_lines_in_one_file: u64,
    /// Distinct first path segments; files at the root share one module.
    pub modules_touched: usize,
    pub touches_api: bool,
    pub touches_dependency_manifest: bool,
    pub touches_configuration: bool,
    pub touches_many_modules: bool,
    /// `false` when history could not be read.
    pub available: bool,
}

impl ChangeImpact {
    /// The "no signal" impact.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Summarize a list of touched files.
    pub fn from_files(mut files: Vec<TouchedFile>, config: &ImpactConfig) -> Self {
        files.sort_by(|a, b| a.path.cmp(&b.path));

        let total_lines = files.iter().map(TouchedFile::lines).sum();
        let max_lines_in_one_file = files.iter().map(TouchedFile::lines).max().unwrap_or(0);
        let modules: BTreeSet<&str> = files.iter().map(|f| top_level_module(&f.path)).collect();
        let modules_touched = modules.len();

        let touches_api = files.iter().any(|f| is_api(&f.path, config));
        let touches_dependency_manifest = files.iter().any(|f| is_manifest(&f.path, config));
        let touches_configuration = files.iter().any(|f| is_configuration(&f.path, config));

        Self {
            file_count: files.len(),
            files,
            total_lines,
            max_lines_in_one_file,
            modules_touched,
            touches_api,
            touches_dependency_manifest,
            touches_configuration,
            touches_many_modules: modules_touched > config.many_modules_threshold,
            available: true,
        }
    }

    /// Whether no file was touched. An unavailable impact is empty too, so
    /// check [`ChangeImpact::available`] first.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Analyze the change between `previous` and `current`.
///
/// Never fails: if history is unavailable or either revision is unknown the
/// result is [`ChangeImpact::unavailable`].
///
/// # Examples
///
/// ```
/// use docsync_core::ImpactConfig;
/// use docsync_history::impact::analyze;
/// use docsync_history::provider::NoHistory;
///
/// let impact = analyze(&NoHistory, "abc123", "def456", &ImpactConfig::default());
/// assert!(!impact.available);
/// assert_eq!(impact.file_count, 0);
/// ```
pub fn analyze(
    history: &dyn RevisionHistory,
    previous: &str,
    current: &str,
    config: &ImpactConfig,
) -> ChangeImpact {
    match history.touched_files(previous, current) {
        Ok(files) => {
            let impact = ChangeImpact::from_files(files, config);
            debug!(
                from = previous,
                to = current,
                files = impact.file_count,
                lines = impact.total_lines,
                modules = impact.modules_touched,
                "analyzed change impact"
            );
            impact
        }
        Err(e) => {
            warn!(from = previous, to = current, error = %e, "no change signal");
            ChangeImpact::unavailable()
        }
    }
}

/// First path segment, or `""` for files at the project root.
///
/// ```
/// use docsync_history::impact::top_level_module;
///
/// assert_eq!(top_level_module("src/a/b.rs"), "src");
/// assert_eq!(top_level_module("README.md"), "");
/// ```
pub fn top_level_module(path: &str) -> &str {
    match path.split_once('/') {
        Some((first, _)) => first,
        None => "",
    }
}

fn is_api(path: &str, config: &ImpactConfig) -> bool {
    let lower = path.to_lowercase();
    // Leading `/` lets root-level paths match `/`-prefixed patterns.
    let anchored = format!("/{lower}");
    config
        .api_patterns
        .iter()
        .any(|p| anchored.contains(&p.to_lowercase()))
}

fn is_manifest(path: &str, config: &ImpactConfig) -> bool {
    let name = file_name(path);
    config
        .manifest_patterns
        .iter()
        .any(|p| p.eq_ignore_ascii_case(name))
}

fn is_configuration(path: &str, config: &ImpactConfig) -> bool {
    let lower = path.to_lowercase();
    config
        .config_patterns
        .iter()
        .any(|p| lower.contains(&p.to_lowercase()))
}
