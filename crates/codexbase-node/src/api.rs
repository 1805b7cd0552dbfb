//! Application state, repository registry, and error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use codexbase_ai::{AiClient, AiError};
use codexbase_auth::{AuthError, TokenRegistry};
use codexbase_collaboration::{CollaborationError, CollaborationStore};
use codexbase_types::{Repository, RepositoryId, UserId};
use codexbase_vcs::{VcsError, VcsStore};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository metadata registry.
    pub repos: Arc<RepoStore>,
    /// Versioned files and commit logs.
    pub vcs: Arc<VcsStore>,
    /// Pull requests and comments.
    pub collaboration: Arc<CollaborationStore>,
    /// Bearer token resolution.
    pub tokens: Arc<TokenRegistry>,
    /// AI annotation client, if configured.
    pub ai: Option<Arc<AiClient>>,
}

impl AppState {
    /// Creates fresh state with empty stores and no AI client.
    pub fn new() -> Self {
        Self {
            repos: Arc::new(RepoStore::new()),
            vcs: Arc::new(VcsStore::new()),
            collaboration: Arc::new(CollaborationStore::new()),
            tokens: Arc::new(TokenRegistry::new()),
            ai: None,
        }
    }

    /// Attaches an AI client.
    pub fn with_ai(mut self, ai: AiClient) -> Self {
        self.ai = Some(Arc::new(ai));
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory registry of repository metadata.
#[derive(Default)]
pub struct RepoStore {
    repos: RwLock<HashMap<RepositoryId, Repository>>,
}

impl RepoStore {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new repository.
    pub fn create(&self, repo: Repository) -> Result<Repository, ApiError> {
        let mut repos = self.repos.write();
        if repos.contains_key(&repo.id) {
            return Err(ApiError::RepoExists(format!(
                "{}/{}",
                repo.owner, repo.name
            )));
        }
        repos.insert(repo.id, repo.clone());
        Ok(repo)
    }

    /// Gets a repository by id.
    pub fn get(&self, id: &RepositoryId) -> Result<Repository, ApiError> {
        self.repos
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::RepoNotFound(id.to_hex()))
    }

    /// Lists all repositories.
    pub fn list(&self) -> Vec<Repository> {
        let mut repos: Vec<Repository> = self.repos.read().values().cloned().collect();
        repos.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.name.cmp(&b.name)));
        repos
    }

    /// Updates a repository in place.
    pub fn update<F, T>(&self, id: &RepositoryId, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut Repository) -> T,
    {
        let mut repos = self.repos.write();
        let repo = repos
            .get_mut(id)
            .ok_or_else(|| ApiError::RepoNotFound(id.to_hex()))?;
        Ok(f(repo))
    }
}

/// API error type: every failure a route can surface.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("repository not found: {0}")]
    RepoNotFound(String),
    #[error("repository already exists: {0}")]
    RepoExists(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("{0}")]
    Auth(#[from] AuthError),
    #[error("{0}")]
    Vcs(#[from] VcsError),
    #[error("{0}")]
    Collaboration(#[from] CollaborationError),
    #[error("ai collaborator unavailable")]
    AiNotConfigured,
    #[error("ai collaborator failed: {0}")]
    Ai(#[from] AiError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::RepoNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RepoExists(_) => StatusCode::CONFLICT,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(AuthError::Unauthenticated) => StatusCode::UNAUTHORIZED,
            ApiError::Auth(AuthError::Forbidden) => StatusCode::FORBIDDEN,
            ApiError::Vcs(VcsError::UnknownCommitHash { .. }) => StatusCode::NOT_FOUND,
            ApiError::Vcs(VcsError::CommitHashConflict { .. }) => StatusCode::CONFLICT,
            ApiError::Vcs(VcsError::Validation(_)) => StatusCode::BAD_REQUEST,
            // Terminal pull requests answer like absent ones.
            ApiError::Collaboration(CollaborationError::PullRequestNotFound { .. })
            | ApiError::Collaboration(CollaborationError::NotOpen { .. })
            | ApiError::Collaboration(CollaborationError::CommentNotFound { .. }) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Collaboration(CollaborationError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::AiNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Ai(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Error body: `{"message": "..."}` on every failure.
#[derive(Serialize)]
struct ErrorResponse {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (
            status,
            Json(ErrorResponse {
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Parses a repository id from its hex path segment.
pub fn parse_repo_id(raw: &str) -> Result<RepositoryId, ApiError> {
    RepositoryId::from_hex(raw).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Resolves the repository and checks the caller's access in one step.
pub fn guarded_repo(
    state: &AppState,
    raw_id: &str,
    caller: Option<&UserId>,
    action: codexbase_auth::RepoAction,
) -> Result<(Repository, codexbase_auth::ReadAccess), ApiError> {
    let id = parse_repo_id(raw_id)?;
    let repo = state.repos.get(&id)?;
    let access = codexbase_auth::authorize(&repo, caller, action)?;
    Ok((repo, access))
}

/// Creates the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(crate::repository_api::routes())
        .merge(crate::collaboration_api::routes())
        .merge(crate::ai_api::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
