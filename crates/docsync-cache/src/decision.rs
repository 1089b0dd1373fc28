//! Cache invalidation: turn change impact into an update strategy.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use docsync_core::{DocsyncConfig, DocsyncError, Thresholds};
use docsync_history::impact::{self, ChangeImpact};
use docsync_history::provider::RevisionHistory;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::metadata::{CacheMetadata, LoadOutcome};
use crate::store::{CacheKey, CacheStore};

/// Update strategy for the cached artifact, cheapest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionKind {
    /// The artifact is current.
    NoOp,
    /// Small, localized change.
    Micro,
    /// Patch the affected sections.
    Partial,
    /// Regenerate from scratch.
    Full,
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DecisionKind::NoOp => "NO_OP",
            DecisionKind::Micro => "MICRO",
            DecisionKind::Partial => "PARTIAL",
            DecisionKind::Full => "FULL",
        };
        f.write_str(s)
    }
}

impl FromStr for DecisionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "no_op" | "noop" => Ok(DecisionKind::NoOp),
            "micro" => Ok(DecisionKind::Micro),
            "partial" => Ok(DecisionKind::Partial),
            "full" => Ok(DecisionKind::Full),
            other => Err(format!("unknown decision kind: {other}")),
        }
    }
}

/// One invalidation decision and what led to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub kind: DecisionKind,
    /// Present when the decision came from comparing two revisions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<ChangeImpact>,
    /// Human-readable rule that fired.
    pub reason: String,
}

impl Decision {
    pub fn full(reason: impl Into<String>) -> Self {
        Self {
            kind: DecisionKind::Full,
            impact: None,
            reason: reason.into(),
        }
    }
}

/// Classify `impact` under `thresholds`. Pure; the first matching rule wins.
///
/// Cross-cutting signals (API surface, dependency manifests, many modules)
/// are checked before the file and line counts. An impact without history
/// behind it is always [`DecisionKind::Full`].
///
/// # Examples
///
/// ```
/// use docsync_cache::decision::{evaluate, DecisionKind};
/// use docsync_core::{ImpactConfig, Thresholds};
/// use docsync_history::impact::ChangeImpact;
/// use docsync_history::provider::TouchedFile;
///
/// let impact = ChangeImpact::from_files(
///     vec![TouchedFile::new("src/engine.rs", 600, 0)],
///     &ImpactConfig::default(),
/// );
/// let decision = evaluate(&impact, &Thresholds::default());
/// assert_eq!(decision.kind, DecisionKind::Partial);
/// ```
pub fn evaluate(impact: &ChangeImpact, t: &Thresholds) -> Decision {
    let (kind, reason) = classify(impact, t);
    Decision {
        kind,
        impact: Some(impact.clone()),
        reason,
    }
}

fn classify(i: &ChangeImpact, t: &Thresholds) -> (DecisionKind, String) {
    use DecisionKind::{Full, Micro, Partial};

    if !i.available {
        return (Full, "no change signal from revision history".into());
    }

    let files = i.file_count;
    if files > t.full_min_files && i.total_lines > t.full_min_lines {
        return (
            Full,
            format!(
                "{files} files and {} lines changed (over {} files and {} lines)",
                i.total_lines, t.full_min_files, t.full_min_lines
            ),
        );
    }
    if i.touches_api && files > t.api_min_files {
        return (Full, format!("API surface changed across {files} files"));
    }
    if i.touches_dependency_manifest {
        return (Full, "dependency manifest changed".into());
    }
    if i.touches_many_modules && i.total_lines > t.many_modules_min_lines {
        return (
            Full,
            format!(
                "{} lines across {} top-level modules",
                i.total_lines, i.modules_touched
            ),
        );
    }
    if i.max_lines_in_one_file > t.max_single_file_lines {
        return (
            Full,
            format!("{} lines changed in one file", i.max_lines_in_one_file),
        );
    }

    if files > 1 && files <= t.partial_max_files {
        return (Partial, format!("{files} files changed"));
    }
    if files == 1 && i.max_lines_in_one_file > t.partial_single_file_lines {
        return (
            Partial,
            format!("{} lines changed in a single file", i.max_lines_in_one_file),
        );
    }
    if i.touches_configuration {
        return (Partial, "configuration changed".into());
    }

    (
        Micro,
        format!("{files} files, {} lines changed", i.total_lines),
    )
}

/// Snapshot of the cache for `docsync status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub artifact_present: bool,
    pub baseline_present: bool,
    /// `"ok"`, `"missing"` or `"corrupt"`.
    pub metadata: &'static str,
    pub last_hash: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_full_analysis: Option<DateTime<Utc>>,
    pub updates: usize,
    pub last_update: Option<DecisionKind>,
}

/// Decides, per invocation, how the cached artifact must be refreshed, and
/// records the outcome once the caller has acted on it.
///
/// # Examples
///
/// ```
/// use docsync_cache::decision::{CacheDecisionEngine, DecisionKind};
/// use docsync_cache::store::FsCacheStore;
/// use docsync_core::DocsyncConfig;
/// use docsync_history::provider::NoHistory;
///
/// let dir = tempfile::tempdir().unwrap();
/// let store = FsCacheStore::new(dir.path());
/// let config = DocsyncConfig::default();
/// let engine = CacheDecisionEngine::new(&store, &NoHistory, &config);
///
/// assert_eq!(engine.decide(false).kind, DecisionKind::Full);
/// ```
pub struct CacheDecisionEngine<'a> {
    store: &'a dyn CacheStore,
    history: &'a dyn RevisionHistory,
    config: &'a DocsyncConfig,
}

impl<'a> CacheDecisionEngine<'a> {
    pub fn new(
        store: &'a dyn CacheStore,
        history: &'a dyn RevisionHistory,
        config: &'a DocsyncConfig,
    ) -> Self {
        Self {
            store,
            history,
            config,
        }
    }

    /// Decide how to refresh the artifact.
    ///
    /// Never fails. Any error on the way is logged and answered with
    /// [`DecisionKind::Full`].
    pub fn decide(&self, force: bool) -> Decision {
        let decision = self.try_decide(force).unwrap_or_else(|e| {
            warn!(error = %e, "decision failed; falling back to full rebuild");
            Decision::full(format!("internal error: {e}"))
        });
        info!(kind = %decision.kind, reason = %decision.reason, "cache decision");
        decision
    }

    fn try_decide(&self, force: bool) -> Result<Decision, DocsyncError> {
        if force {
            return Ok(Decision::full("rebuild forced"));
        }
        if self.store.read(CacheKey::Artifact)?.is_none() {
            return Ok(Decision::full("no cached artifact"));
        }

        let meta = match CacheMetadata::load(self.store) {
            LoadOutcome::Loaded(meta) => meta,
            LoadOutcome::Missing => return Ok(Decision::full("no cache metadata")),
            LoadOutcome::Corrupt(reason) => {
                return Ok(Decision::full(format!("cache metadata unusable: {reason}")))
            }
        };
        let Some(last_hash) = meta.last_hash else {
            return Ok(Decision::full("no stored revision"));
        };

        let current = match self.history.current_revision() {
            Ok(rev) => rev,
            Err(e) => {
                warn!(error = %e, "current revision unknown");
                return Ok(Decision::full("current revision unavailable"));
            }
        };
        if last_hash == current {
            return Ok(Decision {
                kind: DecisionKind::NoOp,
                impact: None,
                reason: format!("artifact is current at {}", short(&current)),
            });
        }

        let impact = impact::analyze(self.history, &last_hash, &current, &self.config.impact);
        Ok(evaluate(&impact, &self.config.thresholds))
    }

    /// Record that `decision` was acted upon at revision `current_hash`.
    ///
    /// Missing or corrupt metadata is replaced. For a full rebuild the stored
    /// artifact, if any, is also copied to [`CacheKey::ArtifactBaseline`].
    ///
    /// # Errors
    ///
    /// Returns [`DocsyncError`] if the store cannot be written.
    pub fn record(
        &self,
        decision: &Decision,
        current_hash: &str,
    ) -> Result<CacheMetadata, DocsyncError> {
        let now = Utc::now();
        let mut meta = CacheMetadata::load(self.store)
            .into_option()
            .unwrap_or_else(|| CacheMetadata::new(now));
        if decision.kind == DecisionKind::NoOp {
            return Ok(meta);
        }

        meta.apply(decision, current_hash, now, self.config.cache.history_limit);
        meta.save(self.store)?;

        if decision.kind == DecisionKind::Full {
            if let Some(artifact) = self.store.read(CacheKey::Artifact)? {
                self.store.write(CacheKey::ArtifactBaseline, &artifact)?;
            }
        }
        info!(kind = %decision.kind, hash = short(current_hash), "recorded cache update");
        Ok(meta)
    }

    /// Current state of the cache.
    pub fn status(&self) -> CacheStatus {
        let (metadata, meta) = match CacheMetadata::load(self.store) {
            LoadOutcome::Loaded(meta) => ("ok", Some(meta)),
            LoadOutcome::Missing => ("missing", None),
            LoadOutcome::Corrupt(_) => ("corrupt", None),
        };
        CacheStatus {
            artifact_present: self.store.contains(CacheKey::Artifact),
            baseline_present: self.store.contains(CacheKey::ArtifactBaseline),
            metadata,
            last_hash: meta.as_ref().and_then(|m| m.last_hash.clone()),
            created_at: meta.as_ref().map(|m| m.created_at),
            last_updated: meta.as_ref().map(|m| m.last_updated),
            last_full_analysis: meta.as_ref().and_then(|m| m.last_full_analysis),
            updates: meta.as_ref().map_or(0, |m| m.history.len()),
            last_update: meta
                .as_ref()
                .and_then(|m| m.history.last())
                .map(|r| r.kind),
        }
    }
}

fn short(hash: &str) -> &str {
    &hash[..hash.len().min(8)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FsCacheStore;
    use docsync_core::ImpactConfig;
    use docsync_history::provider::{HistoryError, NoHistory, TouchedFile};

    /// History with a fixed HEAD and a fixed diff.
    struct FakeHistory {
        current: String,
        files: Vec<TouchedFile>,
        diff_fails: bool,
    }

    impl FakeHistory {
        fn at(current: &str) -> Self {
            Self {
                current: current.into(),
                files: Vec::new(),
                diff_fails: false,
            }
        }

        fn with_files(mut self, files: &[(&str, u64, u64)]) -> Self {
            self.files = files
                .iter()
                .map(|(p, a, d)| TouchedFile::new(*p, *a, *d))
                .collect();
            self
        }
    }

    impl RevisionHistory for FakeHistory {
        fn current_revision(&self) -> Result<String, HistoryError> {
            Ok(self.current.clone())
        }
        fn touched_files(&self, from: &str, _to: &str) -> Result<Vec<TouchedFile>, HistoryError> {
            if self.diff_fails {
                return Err(HistoryError::UnknownRevision(from.into()));
            }
            Ok(self.files.clone())
        }
        fn recent_changes(&self, _limit: usize) -> Result<Vec<Vec<String>>, HistoryError> {
            Ok(Vec::new())
        }
    }

    fn impact(files: &[(&str, u64, u64)]) -> ChangeImpact {
        ChangeImpact::from_files(
            files
                .iter()
                .map(|(p, a, d)| TouchedFile::new(*p, *a, *d))
                .collect(),
            &ImpactConfig::default(),
        )
    }

    /// `n` files under one module, spreading `lines` across them.
    fn spread(n: usize, lines: u64) -> ChangeImpact {
        let paths: Vec<String> = (0..n).map(|i| format!("src/f{i}.rs")).collect();
        let mut files: Vec<(&str, u64, u64)> = paths.iter().map(|p| (p.as_str(), 0, 0)).collect();
        let per = lines / n as u64;
        for f in files.iter_mut() {
            f.1 = per;
        }
        files[0].1 += lines - per * n as u64;
        impact(&files)
    }

    fn seeded_store(last_hash: Option<&str>) -> (tempfile::TempDir, FsCacheStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsCacheStore::new(dir.path().join(".docsync"));
        store.write(CacheKey::Artifact, b"# Project overview\n").unwrap();
        let mut meta = CacheMetadata::new(Utc::now());
        meta.last_hash = last_hash.map(str::to_string);
        meta.save(&store).unwrap();
        (dir, store)
    }

    #[test]
    fn ten_files_five_hundred_lines_is_not_full() {
        let t = Thresholds::default();
        let at_boundary = spread(10, 500);
        assert_eq!(at_boundary.file_count, 10);
        assert_eq!(at_boundary.total_lines, 500);
        assert_ne!(evaluate(&at_boundary, &t).kind, DecisionKind::Full);

        let over = spread(11, 501);
        assert_eq!(evaluate(&over, &t).kind, DecisionKind::Full);
    }

    #[test]
    fn dependency_manifest_always_forces_full() {
        let tiny = impact(&[("package.json", 1, 0)]);
        assert_eq!(tiny.file_count, 1);
        assert_eq!(evaluate(&tiny, &Thresholds::default()).kind, DecisionKind::Full);
    }

    #[test]
    fn api_surface_needs_more_than_two_files() {
        let t = Thresholds::default();
        let two = impact(&[("src/api/a.ts", 1, 0), ("src/api/b.ts", 1, 0)]);
        assert_eq!(evaluate(&two, &t).kind, DecisionKind::Partial);
        let three = impact(&[
            ("src/api/a.ts", 1, 0),
            ("src/api/b.ts", 1, 0),
            ("src/c.ts", 1, 0),
        ]);
        assert_eq!(evaluate(&three, &t).kind, DecisionKind::Full);
    }

    #[test]
    fn many_modules_need_enough_lines() {
        let t = Thresholds::default();
        let small = impact(&[("a/x", 10, 0), ("b/x", 10, 0), ("c/x", 10, 0), ("d/x", 10, 0)]);
        assert!(small.touches_many_modules);
        assert_eq!(evaluate(&small, &t).kind, DecisionKind::Partial);

        let big = impact(&[("a/x", 30, 0), ("b/x", 30, 0), ("c/x", 30, 0), ("d/x", 11, 0)]);
        assert_eq!(evaluate(&big, &t).kind, DecisionKind::Full);
    }

    #[test]
    fn single_file_size_rules() {
        let t = Thresholds::default();
        assert_eq!(
            evaluate(&impact(&[("src/a.rs", 1001, 0)]), &t).kind,
            DecisionKind::Full
        );
        assert_eq!(
            evaluate(&impact(&[("src/a.rs", 1000, 0)]), &t).kind,
            DecisionKind::Partial
        );
        assert_eq!(
            evaluate(&impact(&[("src/a.rs", 200, 0)]), &t).kind,
            DecisionKind::Micro
        );
        assert_eq!(
            evaluate(&impact(&[("src/a.rs", 150, 51)]), &t).kind,
            DecisionKind::Partial
        );
    }

    #[test]
    fn partial_range_is_inclusive_of_five() {
        let t = Thresholds::default();
        assert_eq!(evaluate(&spread(5, 10), &t).kind, DecisionKind::Partial);
        assert_eq!(evaluate(&spread(6, 10), &t).kind, DecisionKind::Micro);
    }

    #[test]
    fn configuration_change_is_partial() {
        let found = evaluate(&impact(&[("config/app.js", 1, 0)]), &Thresholds::default());
        assert_eq!(found.kind, DecisionKind::Partial);
        assert_eq!(found.reason, "configuration changed");
    }

    #[test]
    fn unavailable_impact_is_full() {
        let found = evaluate(&ChangeImpact::unavailable(), &Thresholds::default());
        assert_eq!(found.kind, DecisionKind::Full);
    }

    #[test]
    fn thresholds_are_configurable() {
        let t = Thresholds {
            max_single_file_lines: 100,
            ..Thresholds::default()
        };
        assert_eq!(
            evaluate(&impact(&[("src/a.rs", 150, 0)]), &t).kind,
            DecisionKind::Full
        );
    }

    #[test]
    fn no_op_is_idempotent() {
        let (_dir, store) = seeded_store(Some("abc123"));
        let history = FakeHistory::at("abc123");
        let config = DocsyncConfig::default();
        let engine = CacheDecisionEngine::new(&store, &history, &config);

        assert_eq!(engine.decide(false).kind, DecisionKind::NoOp);
        assert_eq!(engine.decide(false).kind, DecisionKind::NoOp);
    }

    #[test]
    fn scenario_from_no_op_to_partial() {
        let (_dir, store) = seeded_store(Some("abc123"));
        let config = DocsyncConfig::default();

        let unchanged = FakeHistory::at("abc123");
        let engine = CacheDecisionEngine::new(&store, &unchanged, &config);
        assert_eq!(engine.decide(false).kind, DecisionKind::NoOp);

        let moved = FakeHistory::at("def456").with_files(&[("src/engine.rs", 600, 0)]);
        let engine = CacheDecisionEngine::new(&store, &moved, &config);
        let decision = engine.decide(false);
        assert_eq!(decision.kind, DecisionKind::Partial);

        let impact = decision.impact.as_ref().unwrap();
        assert_eq!(impact.file_count, 1);
        assert_eq!(impact.total_lines, 600);
        assert_eq!(impact.max_lines_in_one_file, 600);

        let meta = engine.record(&decision, "def456").unwrap();
        assert_eq!(meta.last_hash.as_deref(), Some("def456"));
        assert_eq!(meta.last_full_analysis, None);
        assert_eq!(engine.decide(false).kind, DecisionKind::NoOp);
    }

    #[test]
    fn force_missing_artifact_and_missing_hash_are_full() {
        let config = DocsyncConfig::default();
        let history = FakeHistory::at("abc123");

        let (_dir, store) = seeded_store(Some("abc123"));
        let engine = CacheDecisionEngine::new(&store, &history, &config);
        assert_eq!(engine.decide(true).kind, DecisionKind::Full);

        store.remove(CacheKey::Artifact).unwrap();
        assert_eq!(engine.decide(false).kind, DecisionKind::Full);

        let (_dir2, no_hash) = seeded_store(None);
        let engine = CacheDecisionEngine::new(&no_hash, &history, &config);
        assert_eq!(engine.decide(false).kind, DecisionKind::Full);
    }

    #[test]
    fn no_history_and_no_hash_is_full_never_no_op() {
        let (_dir, store) = seeded_store(None);
        let config = DocsyncConfig::default();
        let found = impact::analyze(&NoHistory, "", "", &config.impact);
        assert!(!found.available);

        let engine = CacheDecisionEngine::new(&store, &NoHistory, &config);
        assert_eq!(engine.decide(false).kind, DecisionKind::Full);
    }

    #[test]
    fn lost_history_with_stored_hash_is_full() {
        let (_dir, store) = seeded_store(Some("abc123"));
        let config = DocsyncConfig::default();
        let engine = CacheDecisionEngine::new(&store, &NoHistory, &config);
        assert_eq!(engine.decide(false).kind, DecisionKind::Full);
    }

    #[test]
    fn unreachable_previous_revision_is_full() {
        let (_dir, store) = seeded_store(Some("abc123"));
        let config = DocsyncConfig::default();
        let history = FakeHistory {
            diff_fails: true,
            ..FakeHistory::at("def456")
        };
        let engine = CacheDecisionEngine::new(&store, &history, &config);
        assert_eq!(engine.decide(false).kind, DecisionKind::Full);
    }

    #[test]
    fn unreadable_artifact_falls_back_to_full() {
        let (_dir, store) = seeded_store(Some("abc123"));
        store.remove(CacheKey::Artifact).unwrap();
        std::fs::create_dir_all(store.path_of(CacheKey::Artifact)).unwrap();
        let config = DocsyncConfig::default();
        let history = FakeHistory::at("abc123");
        let engine = CacheDecisionEngine::new(&store, &history, &config);

        assert!(engine.try_decide(false).is_err());
        let decision = engine.decide(false);
        assert_eq!(decision.kind, DecisionKind::Full);
        assert!(decision.reason.starts_with("internal error"));
    }

    #[test]
    fn corrupt_metadata_is_a_miss_and_gets_overwritten() {
        let (_dir, store) = seeded_store(Some("abc123"));
        store.write(CacheKey::Metadata, b"\x00garbage").unwrap();
        let config = DocsyncConfig::default();
        let history = FakeHistory::at("abc123");
        let engine = CacheDecisionEngine::new(&store, &history, &config);

        let decision = engine.decide(false);
        assert_eq!(decision.kind, DecisionKind::Full);
        assert_eq!(engine.status().metadata, "corrupt");

        engine.record(&decision, "abc123").unwrap();
        assert_eq!(engine.status().metadata, "ok");
        assert_eq!(engine.decide(false).kind, DecisionKind::NoOp);
    }

    #[test]
    fn recording_full_snapshots_the_baseline() {
        let (_dir, store) = seeded_store(None);
        let config = DocsyncConfig::default();
        let history = FakeHistory::at("abc123");
        let engine = CacheDecisionEngine::new(&store, &history, &config);

        let meta = engine.record(&Decision::full("first run"), "abc123").unwrap();
        assert!(meta.last_full_analysis.is_some());
        assert_eq!(
            store.read(CacheKey::ArtifactBaseline).unwrap().as_deref(),
            Some(&b"# Project overview\n"[..])
        );

        let status = engine.status();
        assert!(status.artifact_present && status.baseline_present);
        assert_eq!(status.updates, 1);
        assert_eq!(status.last_update, Some(DecisionKind::Full));
    }

    #[test]
    fn recording_no_op_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsCacheStore::new(dir.path().join(".docsync"));
        let config = DocsyncConfig::default();
        let engine = CacheDecisionEngine::new(&store, &NoHistory, &config);

        let noop = Decision {
            kind: DecisionKind::NoOp,
            impact: None,
            reason: String::new(),
        };
        engine.record(&noop, "abc123").unwrap();
        assert!(!store.contains(CacheKey::Metadata));
    }

    #[test]
    fn decision_kind_parses_cli_spellings() {
        assert_eq!("full".parse::<DecisionKind>().unwrap(), DecisionKind::Full);
        assert_eq!("NO_OP".parse::<DecisionKind>().unwrap(), DecisionKind::NoOp);
        assert_eq!("no-op".parse::<DecisionKind>().unwrap(), DecisionKind::NoOp);
        assert!("huge".parse::<DecisionKind>().is_err());
        assert_eq!(DecisionKind::Partial.to_string(), "PARTIAL");
    }
}
