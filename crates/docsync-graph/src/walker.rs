use std::path::Path;

use docsync_core::{DocsyncError, IndexConfig};

/// Extensions that are never indexed.
const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "svgz", "pdf", "zip", "gz", "tgz", "bz2",
    "xz", "7z", "rar", "jar", "war", "exe", "dll", "so", "dylib", "a", "o", "obj", "class", "pyc",
    "wasm", "woff", "woff2", "ttf", "otf", "eot", "mp3", "mp4", "mov", "avi", "wav", "ogg", "db",
    "sqlite", "bin", "lock",
];

/// A file discovered while walking the project.
///
/// # Examples
///
/// ```
/// use docsync_graph::walker::FileEntry;
///
/// let entry = FileEntry {
///     path: "src/app.ts".into(),
///     is_dir: false,
///     extension: "ts".into(),
///     size: 512,
///     modified: 1_700_000_000,
/// };
/// assert_eq!(entry.extension, "ts");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path relative to the project root, `/`-separated.
    pub path: String,
    /// Always `false` for entries returned by [`walk_project`].
    pub is_dir: bool,
    /// Lower-case extension without the dot.
    pub extension: String,
    /// Size in bytes.
    pub size: u64,
    /// Modification time as a Unix timestamp (0 if unavailable).
    pub modified: i64,
}

/// Walk a project, respecting `.gitignore`, returning indexable files sorted by path.
///
/// Skips binary extensions, files larger than `max_file_size`, and anything
/// matching one of the configured `ignore_patterns`. Lockfiles are skipped
/// too; they change constantly and say nothing about structure.
///
/// # Errors
///
/// Returns [`DocsyncError::FileNotFound`] if `root` does not exist, or
/// [`DocsyncError::Config`] if an ignore pattern is not a valid glob.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use docsync_core::IndexConfig;
/// use docsync_graph::walker::walk_project;
///
/// let files = walk_project(Path::new("."), &IndexConfig::default()).unwrap();
/// for f in &files {
///     println!("{} ({} bytes)", f.path, f.size);
/// }
/// ```
pub fn walk_project(root: &Path, config: &IndexConfig) -> Result<Vec<FileEntry>, DocsyncError> {
    if !root.exists() {
        return Err(DocsyncError::FileNotFound(root.to_path_buf()));
    }

    let patterns = config
        .ignore_patterns
        .iter()
        .map(|p| {
            glob::Pattern::new(p)
                .map_err(|e| DocsyncError::Config(format!("invalid ignore pattern '{p}': {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let walker = ignore::WalkBuilder::new(root).hidden(true).build();
    let mut files = Vec::new();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        let Some(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_file() {
            continue;
        }

        let path = entry.path();
        let relative = match path.strip_prefix(root) {
            Ok(r) => normalize(r),
            Err(_) => continue,
        };

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if BINARY_EXTENSIONS.contains(&extension.as_str()) {
            continue;
        }

        if patterns.iter().any(|p| p.matches(&relative)) {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(_) => continue,
        };
        if metadata.len() > config.max_file_size {
            continue;
        }

        let modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_secs() as i64);

        files.push(FileEntry {
            path: relative,
            is_dir: false,
            extension,
            size: metadata.len(),
            modified,
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

fn normalize(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
