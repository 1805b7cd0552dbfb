//! Core types for CodexBase: user identity and repository records.
//!
//! Everything in this crate is plain data shared by the storage,
//! collaboration, and HTTP layers.

mod identity;
mod repository;

pub use identity::UserId;
pub use repository::{InvalidRepositoryId, Repository, RepositoryId, Visibility};

/// Returns the current unix timestamp in seconds.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
