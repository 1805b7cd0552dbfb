//! Access control for CodexBase.
//!
//! One predicate, applied uniformly: the owner and listed collaborators may
//! mutate a repository, only the owner may administer it, and reads depend
//! on visibility. The token registry resolves opaque bearer tokens to user
//! ids; credential validation itself happens outside this crate.

mod guard;
mod token;

pub use guard::{authorize, AuthError, ReadAccess, RepoAction, TRUNCATED_FILE_LIMIT};
pub use token::TokenRegistry;

/// Result type for authorization checks.
pub type Result<T> = std::result::Result<T, AuthError>;
