//! Store error types.
//!
//! Every store operation returns [`StoreError`]. The IPC layer maps each
//! variant to a stable error code so the front-end can branch on it without
//! string matching.

use std::path::PathBuf;

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Input rejected before anything was written.
    #[error("{0}")]
    Validation(String),

    /// A class, date or student the request refers to does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The request would violate a uniqueness rule.
    #[error("{0}")]
    Conflict(String),

    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid JSON: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    /// A backup bundle is unreadable, of an unknown format, or fails its
    /// checksums.
    #[error("backup bundle rejected: {0}")]
    Bundle(String),
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        StoreError::NotFound(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        StoreError::Json {
            path: path.into(),
            source,
        }
    }

    /// Error code reported over IPC.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Validation(_) => "bad_params",
            StoreError::NotFound(_) => "not_found",
            StoreError::Conflict(_) => "conflict",
            StoreError::Io { .. } => "io_failed",
            StoreError::Json { .. } => "bad_document",
            StoreError::Db(_) => "db_failed",
            StoreError::Bundle(_) => "bad_bundle",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(StoreError::validation("x").code(), "bad_params");
        assert_eq!(StoreError::not_found("x").code(), "not_found");
        let io = StoreError::io("a.json", std::io::Error::other("boom"));
        assert_eq!(io.code(), "io_failed");
        assert!(io.to_string().contains("a.json"));
    }
}
