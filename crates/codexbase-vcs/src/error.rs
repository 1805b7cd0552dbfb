//! Error types for version-control operations.

use thiserror::Error;

/// Errors that can occur in the version-control core.
#[derive(Debug, Error)]
pub enum VcsError {
    /// No commit with the given hash exists in the repository.
    #[error("unknown commit hash: {hash}")]
    UnknownCommitHash { hash: String },

    /// A commit with the same derived hash already exists.
    #[error("commit hash conflict: {hash}")]
    CommitHashConflict { hash: String },

    /// A malformed or incomplete request.
    #[error("validation error: {0}")]
    Validation(String),
}
