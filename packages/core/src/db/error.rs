//! Graph Store Error Types
//!
//! This module defines error types for store operations, separating contract
//! violations (caller errors, checked before any store traffic) from
//! duplicate-key conflicts (the store's uniqueness indices doing their job)
//! and transport failures (passed through unmodified).

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by extraction, write-back, and schema operations.
#[derive(Error, Debug)]
pub enum GraphError {
    /// A call violated the provider's contract: non-3D extraction region,
    /// a write attempted under read-only mode, or a read-only open of a
    /// database that does not exist. Checked before any store interaction.
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// A unique-index violation on node id or canonical edge key during a
    /// sync call. Carries every offending record; records of the same batch
    /// that did not conflict were inserted. Never retried internally.
    #[error("duplicate key in '{collection}': {} conflicting record(s)", .records.len())]
    DuplicateKey {
        collection: &'static str,
        records: Vec<serde_json::Value>,
    },

    /// Failed to open the database file backing a logical database
    #[error("failed to open graph database at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        source: libsql::Error,
    },

    /// Store operation failed at the transport layer
    #[error("database operation failed: {0}")]
    Store(#[from] libsql::Error),

    /// Filesystem error while dropping or listing databases
    #[error("failed to access store directory: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be converted to or from its stored form
    #[error("record serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

impl GraphError {
    /// Create a precondition violation error
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Create a connection failed error
    pub fn connection_failed(path: PathBuf, source: libsql::Error) -> Self {
        Self::ConnectionFailed { path, source }
    }

    /// Create a duplicate-key conflict carrying the offending records
    pub fn duplicate_key(collection: &'static str, records: Vec<serde_json::Value>) -> Self {
        Self::DuplicateKey {
            collection,
            records,
        }
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }
}
