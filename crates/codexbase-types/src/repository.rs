//! Repository types for CodexBase.

use crate::{unix_now, UserId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A unique identifier for a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryId([u8; 32]);

/// Error returned when parsing a repository id from hex fails.
#[derive(Debug, thiserror::Error)]
#[error("invalid repository id: {0}")]
pub struct InvalidRepositoryId(String);

impl RepositoryId {
    /// Creates a new repository ID from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Derives a repository ID from the owner and repository name.
    pub fn generate(owner: &UserId, name: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(owner.as_str().as_bytes());
        hasher.update(b":");
        hasher.update(name.as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Returns the ID as a hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses an ID from its hex representation.
    pub fn from_hex(s: &str) -> Result<Self, InvalidRepositoryId> {
        let bytes = hex::decode(s).map_err(|_| InvalidRepositoryId(s.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| InvalidRepositoryId(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl std::fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Visibility of a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Public repository: readable by anyone, previews truncated for
    /// non-collaborators.
    #[default]
    Public,
    /// Private repository: readable only by collaborators.
    Private,
}

/// A hosted repository.
///
/// The owner is fixed at creation and is always treated as a collaborator
/// for authorization, whether or not they appear in `collaborators`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    /// Unique identifier, derived from owner and name.
    pub id: RepositoryId,
    /// Human-readable name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Owner of the repository. Immutable after creation.
    pub owner: UserId,
    /// Users granted write access in addition to the owner.
    pub collaborators: Vec<UserId>,
    /// Repository visibility.
    pub visibility: Visibility,
    /// Users who starred this repository.
    pub starred_by: Vec<UserId>,
    /// Creation timestamp (unix seconds).
    pub created_at: u64,
    /// Last update timestamp (unix seconds).
    pub updated_at: u64,
}

impl Repository {
    /// Creates a new public repository.
    pub fn new(name: impl Into<String>, owner: UserId) -> Self {
        let name = name.into();
        let id = RepositoryId::generate(&owner, &name);
        let now = unix_now();

        Self {
            id,
            name,
            description: None,
            owner,
            collaborators: Vec::new(),
            visibility: Visibility::Public,
            starred_by: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the visibility.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Returns true if the user is the owner or a listed collaborator.
    pub fn is_collaborator(&self, user: &UserId) -> bool {
        self.owner == *user || self.collaborators.contains(user)
    }

    /// Returns true if the user is the owner.
    pub fn is_owner(&self, user: &UserId) -> bool {
        self.owner == *user
    }

    /// Grants collaborator access. Adding the owner or an existing
    /// collaborator is a no-op.
    pub fn add_collaborator(&mut self, user: UserId) {
        if !self.is_collaborator(&user) {
            self.collaborators.push(user);
            self.updated_at = unix_now();
        }
    }

    /// Toggles a star for the user. Returns true if the repository is
    /// starred after the call.
    pub fn toggle_star(&mut self, user: UserId) -> bool {
        if let Some(pos) = self.starred_by.iter().position(|u| *u == user) {
            self.starred_by.remove(pos);
            false
        } else {
            self.starred_by.push(user);
            true
        }
    }
}
