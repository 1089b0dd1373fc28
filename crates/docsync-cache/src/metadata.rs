use chrono::{DateTime, Utc};
use docsync_core::DocsyncError;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::decision::{Decision, DecisionKind};
use crate::store::{CacheKey, CacheStore};

/// Schema version written by this build.
pub const METADATA_VERSION: u32 = 1;

/// Persisted cache state, stored as JSON under [`CacheKey::Metadata`].
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use docsync_cache::metadata::CacheMetadata;
///
/// let meta = CacheMetadata::new(Utc::now());
/// assert_eq!(meta.last_hash, None);
/// assert!(meta.history.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetadata {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    /// Baseline for future diffs; refreshed on every full rebuild.
    #[serde(default)]
    pub last_full_analysis: Option<DateTime<Utc>>,
    /// Revision the cached artifact describes.
    #[serde(default)]
    pub last_hash: Option<String>,
    /// Most recent updates, oldest first.
    #[serde(default)]
    pub history: Vec<UpdateRecord>,
}

/// One recorded update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecord {
    pub timestamp: DateTime<Utc>,
    pub kind: DecisionKind,
    pub from_hash: Option<String>,
    pub to_hash: String,
    pub files_changed: usize,
    pub total_lines: u64,
}

/// Result of reading metadata from a store.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Missing,
    Loaded(CacheMetadata),
    /// Present but unusable; the reason is for logs.
    Corrupt(String),
}

impl LoadOutcome {
    /// The loaded metadata, treating corruption as absence.
    pub fn into_option(self) -> Option<CacheMetadata> {
        match self {
            LoadOutcome::Loaded(meta) => Some(meta),
            LoadOutcome::Missing | LoadOutcome::Corrupt(_) => None,
        }
    }
}

impl CacheMetadata {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            version: METADATA_VERSION,
            created_at: now,
            last_updated: now,
            last_full_analysis: None,
            last_hash: None,
            history: Vec::new(),
        }
    }

    /// Read metadata from `store`.
    ///
    /// Never fails: unreadable bytes, invalid JSON and schema versions newer
    /// than [`METADATA_VERSION`] are all reported as [`LoadOutcome::Corrupt`].
    pub fn load(store: &dyn CacheStore) -> LoadOutcome {
        let bytes = match store.read(CacheKey::Metadata) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return LoadOutcome::Missing,
            Err(e) => {
                warn!(error = %e, "cache metadata unreadable");
                return LoadOutcome::Corrupt(e.to_string());
            }
        };

        match serde_json::from_slice::<CacheMetadata>(&bytes) {
            Ok(meta) if meta.version > METADATA_VERSION => {
                warn!(version = meta.version, "cache metadata from a newer version");
                LoadOutcome::Corrupt(format!("unsupported metadata version {}", meta.version))
            }
            Ok(meta) => LoadOutcome::Loaded(meta),
            Err(e) => {
                warn!(error = %e, "cache metadata is not valid JSON");
                LoadOutcome::Corrupt(format!("invalid metadata: {e}"))
            }
        }
    }

    /// Write metadata to `store` as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DocsyncError`] if serialization or the store write fails.
    pub fn save(&self, store: &dyn CacheStore) -> Result<(), DocsyncError> {
        let content = serde_json::to_vec_pretty(self)?;
        store.write(CacheKey::Metadata, &content)
    }

    /// Apply an acted-upon decision.
    ///
    /// Stores `current_hash`, stamps `last_updated`, refreshes
    /// `last_full_analysis` for a full rebuild, and appends to the history,
    /// keeping the newest `history_limit` records. A no-op changes nothing.
    pub fn apply(
        &mut self,
        decision: &Decision,
        current_hash: &str,
        now: DateTime<Utc>,
        history_limit: usize,
    ) {
        if decision.kind == DecisionKind::NoOp {
            return;
        }

        let (files_changed, total_lines) = decision
            .impact
            .as_ref()
            .map_or((0, 0), |i| (i.file_count, i.total_lines));
        self.history.push(UpdateRecord {
            timestamp: now,
            kind: decision.kind,
            from_hash: self.last_hash.clone(),
            to_hash: current_hash.to_string(),
            files_changed,
            total_lines,
        });
        if self.history.len() > history_limit {
            let excess = self.history.len() - history_limit;
            self.history.drain(..excess);
        }

        self.version = METADATA_VERSION;
        self.last_hash = Some(current_hash.to_string());
        self.last_updated = now;
        if decision.kind == DecisionKind::Full {
            self.last_full_analysis = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FsCacheStore;
    use chrono::Duration;

    fn decision(kind: DecisionKind) -> Decision {
        Decision {
            kind,
            impact: None,
            reason: String::new(),
        }
    }

    #[test]
    fn load_missing_and_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsCacheStore::new(dir.path());
        assert_eq!(CacheMetadata::load(&store), LoadOutcome::Missing);

        let meta = CacheMetadata::new(Utc::now());
        meta.save(&store).unwrap();
        assert_eq!(CacheMetadata::load(&store), LoadOutcome::Loaded(meta));
    }

    #[test]
    fn invalid_json_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsCacheStore::new(dir.path());
        store.write(CacheKey::Metadata, b"{ not json").unwrap();
        assert!(matches!(CacheMetadata::load(&store), LoadOutcome::Corrupt(_)));
        assert_eq!(CacheMetadata::load(&store).into_option(), None);
    }

    #[test]
    fn newer_schema_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsCacheStore::new(dir.path());
        let mut meta = CacheMetadata::new(Utc::now());
        meta.version = METADATA_VERSION + 1;
        meta.save(&store).unwrap();
        assert!(matches!(CacheMetadata::load(&store), LoadOutcome::Corrupt(_)));
    }

    #[test]
    fn older_files_without_optional_fields_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsCacheStore::new(dir.path());
        let json = r#"{"version":1,"createdAt":"2025-01-01T00:00:00Z","lastUpdated":"2025-01-02T00:00:00Z"}"#;
        store.write(CacheKey::Metadata, json.as_bytes()).unwrap();

        let meta = CacheMetadata::load(&store).into_option().unwrap();
        assert_eq!(meta.last_hash, None);
        assert!(meta.history.is_empty());
    }

    #[test]
    fn full_refreshes_baseline_partial_does_not() {
        let start = Utc::now();
        let mut meta = CacheMetadata::new(start);

        let t1 = start + Duration::minutes(1);
        meta.apply(&decision(DecisionKind::Full), "abc123", t1, 20);
        assert_eq!(meta.last_hash.as_deref(), Some("abc123"));
        assert_eq!(meta.last_full_analysis, Some(t1));

        let t2 = start + Duration::minutes(2);
        meta.apply(&decision(DecisionKind::Partial), "def456", t2, 20);
        assert_eq!(meta.last_hash.as_deref(), Some("def456"));
        assert_eq!(meta.last_updated, t2);
        assert_eq!(meta.last_full_analysis, Some(t1));

        assert_eq!(meta.history.len(), 2);
        assert_eq!(meta.history[1].from_hash.as_deref(), Some("abc123"));
        assert_eq!(meta.history[1].to_hash, "def456");
        assert_eq!(meta.created_at, start);
    }

    #[test]
    fn no_op_changes_nothing() {
        let mut meta = CacheMetadata::new(Utc::now());
        meta.last_hash = Some("abc123".into());
        let before = meta.clone();
        meta.apply(&decision(DecisionKind::NoOp), "abc123", Utc::now(), 20);
        assert_eq!(meta, before);
    }

    #[test]
    fn history_keeps_newest_records() {
        let mut meta = CacheMetadata::new(Utc::now());
        for i in 0..5 {
            meta.apply(&decision(DecisionKind::Micro), &format!("h{i}"), Utc::now(), 3);
        }
        let hashes: Vec<&str> = meta.history.iter().map(|r| r.to_hash.as_str()).collect();
        assert_eq!(hashes, vec!["h2", "h3", "h4"]);
    }

    #[test]
    fn serialized_keys_are_camel_case() {
        let mut meta = CacheMetadata::new(Utc::now());
        meta.apply(&decision(DecisionKind::Full), "abc123", Utc::now(), 20);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["lastHash"], "abc123");
        assert!(json.get("lastFullAnalysis").is_some());
        assert_eq!(json["history"][0]["kind"], "FULL");
    }
}
