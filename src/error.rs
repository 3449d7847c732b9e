//! Error types for todo operations.

use crate::types::TodoId;
use thiserror::Error;

/// Errors returned by the storage layer and the domain operations.
///
/// `ConnectionFailure` is fatal at startup; every other variant is a
/// per-request error that callers log and recover from.
#[derive(Debug, Error)]
pub enum TodoError {
    #[error("todo not found: {0}")]
    NotFound(String),

    #[error("todo with title {0:?} already exists")]
    DuplicateTitle(String),

    #[error("invalid todo id: {0:?}")]
    InvalidId(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("failed to connect to database: {0}")]
    ConnectionFailure(String),
}

impl TodoError {
    pub fn not_found_id(id: TodoId) -> Self {
        Self::NotFound(format!("id {}", id))
    }

    pub fn not_found_title(title: &str) -> Self {
        Self::NotFound(format!("title {:?}", title))
    }

    pub fn connection(err: impl std::fmt::Display) -> Self {
        Self::ConnectionFailure(err.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Stable code for structured log fields.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::DuplicateTitle(_) => "DUPLICATE_TITLE",
            Self::InvalidId(_) => "INVALID_ID",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::ConnectionFailure(_) => "CONNECTION_FAILURE",
        }
    }
}

/// Result type for todo operations.
pub type TodoResult<T> = std::result::Result<T, TodoError>;
