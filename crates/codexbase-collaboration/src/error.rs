//! Error types for collaboration operations.

use codexbase_types::RepositoryId;
use thiserror::Error;

/// Errors that can occur during collaboration operations.
#[derive(Debug, Error)]
pub enum CollaborationError {
    /// Pull request not found.
    #[error("pull request not found: {repo}#{number}")]
    PullRequestNotFound { repo: RepositoryId, number: u32 },

    /// A state transition was attempted on a pull request that is not open.
    ///
    /// Terminal pull requests are reported the same way as absent ones, so
    /// callers cannot distinguish "merged long ago" from "never existed".
    #[error("pull request not found or already closed: #{number}")]
    NotOpen { number: u32 },

    /// Comment not found.
    #[error("comment not found: {id}")]
    CommentNotFound { id: u64 },

    /// Validation error.
    #[error("validation error: {0}")]
    Validation(String),
}
