//! Error types for the annotation engine
//!
//! Every fallible operation in the library returns [`Result`]. The variants
//! group into a small taxonomy that callers can test for with the `is_*`
//! helpers: parse errors, lookup misses, player failures and lock conflicts.

use std::path::PathBuf;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, AnnotateError>;

/// Errors that can occur while annotating, loading or saving
#[derive(Debug, thiserror::Error)]
pub enum AnnotateError {
    #[error("Key definition error on line {line}: {message}")]
    KeyDefinitionError { line: usize, message: String },

    #[error("Failed to parse annotation file: {0}")]
    FileParseError(String),

    #[error("Key not assigned to any meaning: {0:?}")]
    UnknownKey(char),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Bookmark not found: {0}")]
    BookmarkNotFound(String),

    #[error("Event already exists: {0}")]
    EventExists(String),

    #[error("Player error: {0}")]
    PlayerSyncError(String),

    #[error("Annotation file {0:?} is already opened by another process")]
    ConcurrentAccess(PathBuf),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl AnnotateError {
    /// True for malformed key definitions and malformed annotation files
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            AnnotateError::KeyDefinitionError { .. }
                | AnnotateError::FileParseError(_)
                | AnnotateError::JsonError(_)
        )
    }

    /// True for event and bookmark lookup misses
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AnnotateError::EventNotFound(_) | AnnotateError::BookmarkNotFound(_)
        )
    }

    pub(crate) fn key_definition(line: usize, message: impl Into<String>) -> Self {
        AnnotateError::KeyDefinitionError {
            line,
            message: message.into(),
        }
    }
}
