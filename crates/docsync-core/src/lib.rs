//! Core types, configuration, and error handling for docsync.
//!
//! This crate provides the shared foundation used by all other docsync crates:
//! - [`DocsyncError`]: unified error type using `thiserror`
//! - [`DocsyncConfig`]: configuration loaded from `.docsync.toml`
//! - Shared types: [`FileRecord`], [`FileKind`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{
    CacheConfig, DocsyncConfig, ImpactConfig, IndexConfig, RankConfig, RankWeights, Thresholds,
    CONFIG_FILE_NAME,
};
pub use error::DocsyncError;
pub use types::{file_name, is_entry_point, FileKind, FileRecord, OutputFormat, SOURCE_EXTENSIONS};

/// A convenience `Result` type for docsync operations.
pub type Result<T> = std::result::Result<T, DocsyncError>;
