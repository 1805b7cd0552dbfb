//! Versioned file records.

use codexbase_types::{unix_now, RepositoryId, UserId};
use serde::{Deserialize, Serialize};

/// One live file on one branch of a repository.
///
/// A file record is uniquely identified by `(repo, branch, name)`. Writing
/// to an existing key overwrites `content` and `author` in place; there is
/// no per-file history (history lives in the commit log).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Repository this file belongs to.
    pub repo: RepositoryId,
    /// Branch tag.
    pub branch: String,
    /// File name (path within the repository).
    pub name: String,
    /// Full file content.
    pub content: String,
    /// Last author to write this record.
    pub author: UserId,
    /// Creation timestamp (unix seconds).
    pub created_at: u64,
    /// Last write timestamp (unix seconds).
    pub updated_at: u64,
}

impl FileRecord {
    /// Creates a new file record.
    pub fn new(
        repo: RepositoryId,
        branch: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
        author: UserId,
    ) -> Self {
        let now = unix_now();
        Self {
            repo,
            branch: branch.into(),
            name: name.into(),
            content: content.into(),
            author,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites content and author, keeping the creation timestamp.
    pub fn overwrite(&mut self, content: impl Into<String>, author: UserId) {
        self.content = content.into();
        self.author = author;
        self.updated_at = unix_now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrite_keeps_created_at() {
        let repo = RepositoryId::generate(&UserId::new("alice"), "repo");
        let mut file = FileRecord::new(repo, "main", "a.txt", "v1", UserId::new("alice"));
        let created = file.created_at;

        file.overwrite("v2", UserId::new("bob"));
        assert_eq!(file.content, "v2");
        assert_eq!(file.author, UserId::new("bob"));
        assert_eq!(file.created_at, created);
    }
}
