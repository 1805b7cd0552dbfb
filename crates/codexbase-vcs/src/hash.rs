//! Derived commit hashes.

use crate::CommitFile;
use codexbase_types::{RepositoryId, UserId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A SHA-256 commit hash.
///
/// Commit hashes are derived deterministically from the commit's repository,
/// author, message, file snapshot, and creation timestamp.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitHash([u8; 32]);

impl CommitHash {
    /// The length of a commit hash in bytes.
    pub const LEN: usize = 32;

    /// Derives the hash for a commit.
    #[must_use]
    pub fn derive(
        repo: &RepositoryId,
        author: &UserId,
        message: &str,
        files: &[CommitFile],
        created_at: u64,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(repo.as_bytes());
        hasher.update(author.as_str().as_bytes());
        hasher.update(message.as_bytes());
        for file in files {
            // Length prefixes keep (name, content) pairs unambiguous.
            hasher.update((file.name.len() as u64).to_be_bytes());
            hasher.update(file.name.as_bytes());
            hasher.update((file.content.len() as u64).to_be_bytes());
            hasher.update(file.content.as_bytes());
        }
        hasher.update(created_at.to_be_bytes());

        let digest = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Creates a commit hash from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes of this hash.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the hash as a hex string.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Creates a commit hash from a hex string.
    ///
    /// # Errors
    ///
    /// Returns an error if the hex string is invalid or the wrong length.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != Self::LEN {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommitHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn repo_id() -> RepositoryId {
        RepositoryId::generate(&UserId::new("alice"), "repo")
    }

    #[test]
    fn commit_hash_deterministic() {
        let files = vec![CommitFile::new("a.txt", "hi")];
        let h1 = CommitHash::derive(&repo_id(), &UserId::new("alice"), "init", &files, 100);
        let h2 = CommitHash::derive(&repo_id(), &UserId::new("alice"), "init", &files, 100);
        assert_eq!(h1, h2);
    }

    #[test]
    fn commit_hash_sensitive_to_inputs() {
        let files = vec![CommitFile::new("a.txt", "hi")];
        let base = CommitHash::derive(&repo_id(), &UserId::new("alice"), "init", &files, 100);

        let other_author =
            CommitHash::derive(&repo_id(), &UserId::new("bob"), "init", &files, 100);
        let other_message =
            CommitHash::derive(&repo_id(), &UserId::new("alice"), "fix", &files, 100);
        let other_time =
            CommitHash::derive(&repo_id(), &UserId::new("alice"), "init", &files, 101);

        assert_ne!(base, other_author);
        assert_ne!(base, other_message);
        assert_ne!(base, other_time);
    }

    #[test]
    fn commit_hash_file_boundaries_unambiguous() {
        // ("ab", "c") and ("a", "bc") must not collide.
        let h1 = CommitHash::derive(
            &repo_id(),
            &UserId::new("alice"),
            "m",
            &[CommitFile::new("ab", "c")],
            100,
        );
        let h2 = CommitHash::derive(
            &repo_id(),
            &UserId::new("alice"),
            "m",
            &[CommitFile::new("a", "bc")],
            100,
        );
        assert_ne!(h1, h2);
    }

    #[test]
    fn commit_hash_hex_roundtrip() {
        let hash = CommitHash::derive(
            &repo_id(),
            &UserId::new("alice"),
            "init",
            &[CommitFile::new("a.txt", "hi")],
            100,
        );
        let hex = hash.to_hex();
        assert_eq!(CommitHash::from_hex(&hex).unwrap(), hash);
    }

    #[test]
    fn commit_hash_from_hex_rejects_bad_input() {
        assert!(CommitHash::from_hex("not hex").is_err());
        assert!(CommitHash::from_hex("abcd").is_err());
    }
}
