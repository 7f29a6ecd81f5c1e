//! Error types for tunnel sync operations.
//!
//! Every layer of the sync tools reports failures through [`SyncError`].
//! Whether an error aborts a run is decided by the caller: document and
//! registry failures are fatal, per-tunnel failures are logged and skipped.

use std::io;
use thiserror::Error;

/// Result type alias for tunnel sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during tunnel sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A command could not be started.
    #[error("Failed to run command '{command}': {source}")]
    CommandSpawn {
        /// The command that failed to execute.
        command: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// A command exited non-zero.
    #[error("Command failed: '{command}' (exit code {exit_code}): {output}")]
    CommandFailed {
        /// The command that failed.
        command: String,
        /// The exit code.
        exit_code: i32,
        /// Combined stdout/stderr output.
        output: String,
    },

    /// Reading or writing a side-channel record failed.
    #[error("Record file '{path}' could not be accessed: {source}")]
    RecordIo {
        /// Path of the record file.
        path: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// A side-channel record exists but is not usable.
    #[error("Record file '{path}' is malformed: {message}")]
    RecordParse {
        /// Path of the record file.
        path: String,
        /// Error message.
        message: String,
    },

    /// A desired-state document could not be opened.
    #[error("Failed to open document '{path}': {source}")]
    DocumentIo {
        /// Path of the document.
        path: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// A desired-state document is not valid JSON of the expected shape.
    #[error("Failed to decode document from {origin}: {source}")]
    DocumentParse {
        /// Where the document came from (a path or "stdin").
        origin: String,
        /// The decoder error.
        #[source]
        source: serde_json::Error,
    },

    /// Name resolution produced no usable address.
    #[error("Failed to resolve AAAA for {fqdn}: {message}")]
    Resolve {
        /// The name that was looked up.
        fqdn: String,
        /// Error message.
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// Internal error (unexpected state).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl SyncError {
    /// Creates a record IO error.
    pub fn record_io(path: impl Into<String>, source: io::Error) -> Self {
        Self::RecordIo {
            path: path.into(),
            source,
        }
    }

    /// Creates a malformed record error.
    pub fn record_parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RecordParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a resolution error.
    pub fn resolve(fqdn: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolve {
            fqdn: fqdn.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this error is expected to clear up on the next
    /// reconciliation pass without operator action.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::CommandSpawn { .. }
                | SyncError::CommandFailed { .. }
                | SyncError::RecordIo { .. }
                | SyncError::Resolve { .. }
        )
    }
}
