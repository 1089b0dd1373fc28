use std::path::Path;

use docsync_core::DocsyncError;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::warn;

use crate::ranker::{ScoredFile, Signals};

/// A selected file with the head of its content.
///
/// # Examples
///
/// ```
/// use docsync_select::preview::preview_text;
///
/// let (preview, truncated, total) = preview_text("a\nb\nc\n", 2);
/// assert_eq!(preview, "a\nb");
/// assert!(truncated);
/// assert_eq!(total, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedFile {
    pub path: String,
    pub score: f64,
    /// First `preview_lines` lines of the file.
    pub content_preview: String,
    /// Whether the file has more lines than the preview.
    pub truncated: bool,
    pub total_lines: usize,
    pub signals: Signals,
}

/// Attach content previews to already-ranked files, keeping their order.
///
/// Only the given files are read. A file that cannot be read gets an empty
/// preview and zero lines.
///
/// # Errors
///
/// Returns [`DocsyncError::Io`] if a read task panics.
pub async fn attach_previews(
    root: &Path,
    ranked: Vec<ScoredFile>,
    preview_lines: usize,
) -> Result<Vec<RankedFile>, DocsyncError> {
    let mut tasks = JoinSet::new();
    for (position, file) in ranked.iter().enumerate() {
        let full_path = root.join(&file.path);
        tasks.spawn(async move { (position, tokio::fs::read(&full_path).await) });
    }

    let mut contents: Vec<Option<String>> = vec![None; ranked.len()];
    while let Some(joined) = tasks.join_next().await {
        let (position, result) = joined.map_err(|e| DocsyncError::Io(std::io::Error::other(e)))?;
        match result {
            Ok(bytes) => contents[position] = Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) => warn!(path = %ranked[position].path, error = %e, "no preview"),
        }
    }

    Ok(ranked
        .into_iter()
        .zip(contents)
        .map(|(file, content)| {
            let (content_preview, truncated, total_lines) = content
                .as_deref()
                .map_or((String::new(), false, 0), |c| preview_text(c, preview_lines));
            RankedFile {
                path: file.path,
                score: file.score,
                content_preview,
                truncated,
                total_lines,
                signals: file.signals,
            }
        })
        .collect())
}

/// First `max_lines` lines of `content`, whether more remain, and the total
/// line count.
pub fn preview_text(content: &str, max_lines: usize) -> (String, bool, usize) {
    let total = content.lines().count();
    let preview = content
        .lines()
        .take(max_lines)
        .collect::<Vec<_>>()
        .join("\n");
    (preview, total > max_lines, total)
}
