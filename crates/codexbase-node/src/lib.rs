//! CodexBase node: the HTTP server tying the stores together.
//!
//! The node owns an in-memory repository registry plus the version-control
//! and collaboration stores, and exposes them as a REST JSON API. All
//! authorization flows through `codexbase_auth::authorize` before any store
//! is touched.

pub mod ai_api;
pub mod api;
pub mod auth;
pub mod collaboration_api;
pub mod config;
pub mod repository_api;

pub use api::{create_router, AppState};
pub use config::Config;
