use std::path::PathBuf;

/// Errors that can occur across docsync.
///
/// Library crates return this type; the binary converts to a `miette`
/// diagnostic at the boundary. Most failure paths in the engine never surface
/// one of these: they degrade to a safe outcome instead (see the individual
/// components).
///
/// # Examples
///
/// ```
/// use docsync_core::DocsyncError;
///
/// let err = DocsyncError::Cache("metadata is not valid JSON".into());
/// assert!(err.to_string().contains("metadata"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum DocsyncError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Version-control operation failure.
    #[error("git error: {0}")]
    Git(String),

    /// Cache store read/write failure.
    #[error("cache error: {0}")]
    Cache(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}
