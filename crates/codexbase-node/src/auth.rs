//! Caller identity extraction.

use axum::http::{header, HeaderMap};
use codexbase_types::UserId;

use crate::api::AppState;

/// Resolves the caller from an `Authorization: Bearer` header.
///
/// Returns `None` for anonymous requests, malformed headers, and unknown
/// tokens. Gated routes turn a missing caller into 401 through the
/// authorization guard; public reads proceed anonymously.
pub fn caller_from_headers(state: &AppState, headers: &HeaderMap) -> Option<UserId> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    state.tokens.resolve(token)
}
