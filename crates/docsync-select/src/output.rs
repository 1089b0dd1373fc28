use std::fmt::Write;

use docsync_core::{DocsyncError, OutputFormat};

use crate::preview::RankedFile;

/// Render ranked files in the requested format.
///
/// # Errors
///
/// Returns [`DocsyncError::Serialization`] if JSON serialization fails.
pub fn render(files: &[RankedFile], format: OutputFormat) -> Result<String, DocsyncError> {
    match format {
        OutputFormat::Text => Ok(format_text(files)),
        OutputFormat::Json => format_json(files),
        OutputFormat::Markdown => Ok(format_markdown(files)),
    }
}

/// One line per file: rank, score, path, and line count.
///
/// # Examples
///
/// ```
/// use docsync_select::output::format_text;
///
/// assert!(format_text(&[]).is_empty());
/// ```
pub fn format_text(files: &[RankedFile]) -> String {
    if files.is_empty() {
        return String::new();
    }

    let width = files.iter().map(|f| f.path.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (rank, file) in files.iter().enumerate() {
        let lines = if file.truncated {
            format!("{} lines, truncated", file.total_lines)
        } else {
            format!("{} lines", file.total_lines)
        };
        let _ = writeln!(
            out,
            "{:>3}. {:>7.2}  {:<width$}  ({lines})",
            rank + 1,
            file.score,
            file.path,
        );
    }
    out
}

/// Pretty JSON array with camelCase keys.
///
/// # Errors
///
/// Returns [`DocsyncError::Serialization`] if serialization fails.
///
/// # Examples
///
/// ```
/// use docsync_select::output::format_json;
///
/// let json = format_json(&[]).unwrap();
/// assert_eq!(json, "[]");
/// ```
pub fn format_json(files: &[RankedFile]) -> Result<String, DocsyncError> {
    serde_json::to_string_pretty(files).map_err(DocsyncError::from)
}

/// A section per file with its preview in a fenced block.
pub fn format_markdown(files: &[RankedFile]) -> String {
    if files.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    out.push_str("# Most Relevant Files\n\n");
    for (rank, file) in files.iter().enumerate() {
        let _ = writeln!(
            out,
            "## {}. `{}` (score {:.2})\n",
            rank + 1,
            file.path,
            file.score
        );
        let lang = file.path.rsplit_once('.').map_or("", |(_, ext)| ext);
        let _ = writeln!(out, "```{lang}\n{}\n```", file.content_preview);
        if file.truncated {
            let _ = writeln!(
                out,
                "\n_Preview truncated; {} lines total._",
                file.total_lines
            );
        }
        out.push('\n');
    }
    out
}
