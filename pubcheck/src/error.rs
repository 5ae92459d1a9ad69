//! Error types for the validation pipeline.
//!
//! These cover wiring and setup failures only. Findings about the document
//! itself are never errors: they are messages in the [`Report`](crate::Report).

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building or binding a validation context.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContextError {
    /// A checker was bound to a resource of the wrong media type.
    #[error("Checker expects media type '{expected}' but the resource declares '{found}'")]
    MediaTypeMismatch {
        /// The media type the checker handles.
        expected: &'static str,
        /// The media type declared for the resource.
        found: String,
    },

    /// The format version string is not recognized.
    #[error("Unknown format version '{0}'")]
    UnknownVersion(String),

    /// The conformance profile name is not recognized.
    #[error("Unknown profile '{0}'")]
    UnknownProfile(String),
}

/// Errors raised while opening a container.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContainerError {
    /// The container root is not a directory.
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// A directory traversal error (permission denied, loop detected, etc.).
    #[error("Directory traversal error: {0}")]
    Walk(#[from] walkdir::Error),

    /// An encrypted-entry glob pattern could not be parsed.
    #[error("Invalid encrypted-entry pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The raw pattern.
        pattern: String,
        /// The underlying glob error.
        #[source]
        source: glob::PatternError,
    },
}

/// Errors raised while loading a check configuration file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        /// The config file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML for a check configuration.
    #[error("Invalid YAML config: {0}")]
    Yaml(String),

    /// The file is not valid JSON for a check configuration.
    #[error("Invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// The file extension is neither YAML nor JSON.
    #[error("Unsupported config format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}
