//! Error types for ledger operations.

use anchors_core::{ChannelAddress, ValidationError};
use thiserror::Error;

/// Errors that can occur while talking to a ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The ledger refused an entry.
    #[error("entry rejected: {0}")]
    Rejected(#[from] ValidationError),

    #[error("unknown branch {0}")]
    UnknownBranch(ChannelAddress),

    #[error("branch {0} already exists with a different root")]
    BranchExists(ChannelAddress),

    /// The node could not be reached or did not answer.
    #[error("node {node} unavailable: {reason}")]
    Unavailable { node: String, reason: String },

    /// Stored data could not be decoded.
    #[error("corrupt ledger data: {0}")]
    Corrupt(String),

    #[error("migration error: {0}")]
    Migration(String),

    /// A lock or blocking task failed.
    #[error("ledger task failed: {0}")]
    Task(String),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
