//! Collaboration features for CodexBase: pull requests and comments.
//!
//! A pull request proposes merging one branch into another. It carries the
//! text diff computed when it was opened and moves through a three-state
//! lifecycle: open, then either merged or closed, both terminal.

mod comment;
mod error;
mod pull_request;
mod store;

pub use comment::Comment;
pub use error::CollaborationError;
pub use pull_request::{PrStatus, PullRequest};
pub use store::CollaborationStore;

/// Result type for collaboration operations.
pub type Result<T> = std::result::Result<T, CollaborationError>;
