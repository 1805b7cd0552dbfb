//! Version-control core for CodexBase.
//!
//! The model is deliberately simplified: a branch is a set of file records
//! sharing a branch tag, a commit is an immutable full-content snapshot of
//! the files it touched, a diff is a whole-file content comparison, and a
//! merge copies every source-branch file onto the target branch.

mod commit;
mod diff;
mod error;
mod file;
mod hash;
mod store;

pub use commit::{Commit, CommitFile};
pub use diff::compute_diff;
pub use error::VcsError;
pub use file::FileRecord;
pub use hash::CommitHash;
pub use store::VcsStore;

/// Result type for version-control operations.
pub type Result<T> = std::result::Result<T, VcsError>;

/// Name of the default branch.
pub const DEFAULT_BRANCH: &str = "main";
