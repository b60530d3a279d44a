//! Error types for DriveMove
//!
//! Every failure the migration can hit is expressed here. Only
//! [`MigrateError::PermissionDenied`] has a local recovery path (copy
//! instead of move); everything else aborts the run.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for DriveMove operations
#[derive(Error, Debug)]
pub enum MigrateError {
    /// The remote API could not be reached or its response could not be read
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The caller may not perform the operation on this entry
    #[error("Permission denied on '{entry_id}': {message}")]
    PermissionDenied { entry_id: String, message: String },

    /// A container or entry no longer exists
    #[error("Not found: {0}")]
    NotFound(String),

    /// The API rejected the request for any other reason
    #[error("API error {status} ({reason}): {message}")]
    Api {
        status: u16,
        reason: String,
        message: String,
    },

    /// No usable credentials, or the token was rejected
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Operation cancelled by user
    #[error("Operation cancelled")]
    Cancelled,

    /// I/O error while reading local files (token files)
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MigrateError {
    /// Create a transport error wrapping a reqwest failure
    pub fn transport(message: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a permission error for an entry
    pub fn permission_denied(entry_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            entry_id: entry_id.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Check if this error is a permission issue
    pub fn is_permission_error(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    /// Check if this error means the target vanished
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type alias for DriveMove operations
pub type Result<T> = std::result::Result<T, MigrateError>;
