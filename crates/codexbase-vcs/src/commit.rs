//! Commit snapshot records.

use crate::CommitHash;
use codexbase_types::{RepositoryId, UserId};
use serde::{Deserialize, Serialize};

/// A single file captured in a commit: full content, not a delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitFile {
    /// File name (path within the repository).
    pub name: String,
    /// Full content at commit time.
    pub content: String,
}

impl CommitFile {
    /// Creates a commit file entry.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// An immutable snapshot of the files touched by one commit.
///
/// A commit stores the full content of every file it touched at commit time,
/// independent of later writes to the file store. Commits are append-only
/// and never modified after insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    /// Store-assigned identifier, monotonically increasing.
    pub id: u64,
    /// Repository this commit belongs to.
    pub repo: RepositoryId,
    /// Commit author.
    pub author: UserId,
    /// Commit message.
    pub message: String,
    /// Snapshot of every file touched by this commit.
    pub files: Vec<CommitFile>,
    /// Derived hash, unique within the repository.
    pub hash: CommitHash,
    /// Branch the commit was made on.
    pub branch: String,
    /// Creation timestamp (unix seconds).
    pub created_at: u64,
}
