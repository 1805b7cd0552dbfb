//! Comments on pull requests.

use codexbase_types::{unix_now, RepositoryId, UserId};
use serde::{Deserialize, Serialize};

/// A comment attached to a pull request. Append-only: comments are never
/// edited or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Unique identifier within the store.
    pub id: u64,
    /// Repository the commented pull request belongs to.
    pub repo: RepositoryId,
    /// Number of the commented pull request.
    pub pr_number: u32,
    /// Comment author.
    pub author: UserId,
    /// Comment body.
    pub body: String,
    /// Creation timestamp (unix seconds).
    pub created_at: u64,
}

impl Comment {
    /// Creates a new comment.
    pub fn new(
        repo: RepositoryId,
        pr_number: u32,
        author: UserId,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            repo,
            pr_number,
            author,
            body: body.into(),
            created_at: unix_now(),
        }
    }
}
