//! The repository authorization guard.

use codexbase_types::{Repository, UserId, Visibility};
use thiserror::Error;

/// Maximum number of file records served to a non-collaborator reading a
/// public repository.
pub const TRUNCATED_FILE_LIMIT: usize = 20;

/// What a caller wants to do with a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoAction {
    /// List files, commits, branches, or pull requests.
    Read,
    /// Create or delete files, commit, create branches or pull requests,
    /// clone, pull.
    Write,
    /// Merge or close pull requests, add collaborators.
    Admin,
}

/// How much of a read the caller is entitled to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadAccess {
    /// Full access to the repository's data.
    Full,
    /// Preview access: file listings are capped at
    /// [`TRUNCATED_FILE_LIMIT`] records.
    Truncated,
}

impl ReadAccess {
    /// Returns the file-listing cap for this access level, if any.
    pub fn file_limit(&self) -> Option<usize> {
        match self {
            ReadAccess::Full => None,
            ReadAccess::Truncated => Some(TRUNCATED_FILE_LIMIT),
        }
    }
}

/// Authorization failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The action needs a caller identity and none was presented.
    #[error("authentication required")]
    Unauthenticated,
    /// The caller is authenticated but not allowed to perform the action.
    #[error("forbidden")]
    Forbidden,
}

/// Decides whether `caller` may perform `action` on `repo`.
///
/// - `Write` requires the caller to be the owner or a collaborator, on
///   public and private repositories alike.
/// - `Admin` requires the caller to be the owner.
/// - `Read` on a public repository is always allowed: collaborators get
///   [`ReadAccess::Full`], everyone else [`ReadAccess::Truncated`].
/// - `Read` on a private repository is allowed only for collaborators.
///
/// Unauthenticated callers are rejected with [`AuthError::Unauthenticated`]
/// wherever an identity would be required, before any collaborator check.
pub fn authorize(
    repo: &Repository,
    caller: Option<&UserId>,
    action: RepoAction,
) -> Result<ReadAccess, AuthError> {
    match action {
        RepoAction::Read => match repo.visibility {
            Visibility::Public => match caller {
                Some(user) if repo.is_collaborator(user) => Ok(ReadAccess::Full),
                _ => Ok(ReadAccess::Truncated),
            },
            Visibility::Private => {
                let user = caller.ok_or(AuthError::Unauthenticated)?;
                if repo.is_collaborator(user) {
                    Ok(ReadAccess::Full)
                } else {
                    Err(AuthError::Forbidden)
                }
            }
        },
        RepoAction::Write => {
            let user = caller.ok_or(AuthError::Unauthenticated)?;
            if repo.is_collaborator(user) {
                Ok(ReadAccess::Full)
            } else {
                Err(AuthError::Forbidden)
            }
        }
        RepoAction::Admin => {
            let user = caller.ok_or(AuthError::Unauthenticated)?;
            if repo.is_owner(user) {
                Ok(ReadAccess::Full)
            } else {
                Err(AuthError::Forbidden)
            }
        }
    }
}
