use std::collections::HashMap;
use std::path::Path;

use docsync_core::{DocsyncError, FileRecord, IndexConfig};
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::extract::ExtractorRegistry;
use crate::walker::FileEntry;

/// In-memory table of every analyzed file, keyed by path.
///
/// Built once per run and never mutated afterwards; the graph builder and
/// ranker borrow it. Records are kept sorted by path so iteration order is
/// deterministic.
///
/// # Examples
///
/// ```
/// use docsync_core::FileRecord;
/// use docsync_graph::index::FileIndex;
///
/// let record = |path: &str| FileRecord {
///     path: path.into(),
///     extension: "py".into(),
///     size: 10,
///     modified: 0,
///     imports: vec![],
///     exports: vec![],
///     content_hash: String::new(),
/// };
/// let index = FileIndex::from_records(vec![record("b.py"), record("a.py"), record("b.py")]);
/// assert_eq!(index.len(), 2);
/// assert_eq!(index.iter().next().unwrap().path, "a.py");
/// assert!(index.contains("b.py"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct FileIndex {
    records: Vec<FileRecord>,
    by_path: HashMap<String, usize>,
}

impl FileIndex {
    /// Build an index from already-collected records.
    ///
    /// Sorts by path; when a path appears twice the first record is kept.
    pub fn from_records(mut records: Vec<FileRecord>) -> Self {
        records.sort_by(|a, b| a.path.cmp(&b.path));
        records.dedup_by(|later, earlier| later.path == earlier.path);

        let by_path = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.path.clone(), i))
            .collect();
        Self { records, by_path }
    }

    /// Read and analyze `entries` under `root`.
    ///
    /// Reads at most `config.scan_bytes` from the head of each file, with up
    /// to `config.batch_size` reads in flight. Each batch is joined before
    /// the next starts, and the index is only returned once every batch has
    /// completed. Files that fail to read are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`DocsyncError::Io`] if a read task panics or is cancelled.
    pub async fn build(
        root: &Path,
        entries: Vec<FileEntry>,
        config: &IndexConfig,
        extractors: &ExtractorRegistry,
    ) -> Result<Self, DocsyncError> {
        let batch_size = config.batch_size.max(1);
        let scan_bytes = config.scan_bytes;
        let total = entries.len();
        let mut records = Vec::with_capacity(total);

        let files: Vec<FileEntry> = entries.into_iter().filter(|e| !e.is_dir).collect();
        for (batch_no, batch) in files.chunks(batch_size).enumerate() {
            let mut tasks = JoinSet::new();
            for entry in batch {
                let full_path = root.join(&entry.path);
                let entry = entry.clone();
                tasks.spawn(async move {
                    let result = read_head(&full_path, scan_bytes).await;
                    (entry, full_path, result)
                });
            }

            while let Some(joined) = tasks.join_next().await {
                let (entry, full_path, result) =
                    joined.map_err(|e| DocsyncError::Io(std::io::Error::other(e)))?;
                match result {
                    Ok(head) => records.push(analyze(entry, &head, extractors)),
                    Err(e) => warn!(path = %full_path.display(), error = %e, "skipping unreadable file"),
                }
            }
            debug!(batch = batch_no, done = records.len(), total, "indexed batch");
        }

        Ok(Self::from_records(records))
    }

    /// Look up a record by path.
    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        self.by_path.get(path).map(|&i| &self.records[i])
    }

    /// Whether `path` is indexed.
    pub fn contains(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }

    /// Records in path order.
    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

async fn read_head(path: &Path, scan_bytes: usize) -> std::io::Result<Vec<u8>> {
    let file = tokio::fs::File::open(path).await?;
    let mut head = Vec::with_capacity(scan_bytes.min(64 * 1024));
    file.take(scan_bytes as u64).read_to_end(&mut head).await?;
    Ok(head)
}

fn analyze(entry: FileEntry, head: &[u8], extractors: &ExtractorRegistry) -> FileRecord {
    let content = String::from_utf8_lossy(head);
    let found = extractors.extract_file(&entry.path, &entry.extension, &content);

    let mut hasher = Sha256::new();
    hasher.update(head);

    FileRecord {
        path: entry.path,
        extension: entry.extension,
        size: entry.size,
        modified: entry.modified,
        imports: found.imports,
        exports: found.exports,
        content_hash: format!("{:x}", hasher.finalize()),
    }
}
