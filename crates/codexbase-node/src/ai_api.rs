//! AI annotation endpoints: proxies to an OpenAI-compatible completion
//! service and persists the results where they belong.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use codexbase_ai::AiClient;
use codexbase_auth::RepoAction;
use codexbase_vcs::DEFAULT_BRANCH;

use crate::api::{guarded_repo, ApiError, AppState};
use crate::auth::caller_from_headers;

/// Creates the AI API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/repos/{repo}/ai/review", post(review_pull_request))
        .route("/api/repos/{repo}/ai/summary", post(summarize_pull_request))
        .route("/api/repos/{repo}/ai/explain-file", post(explain_file))
        .route("/api/repos/{repo}/ai/commit-message", post(suggest_commit_message))
}

// ==================== Request/Response Types ====================

/// Request naming the pull request to annotate.
#[derive(Debug, Deserialize)]
pub struct PullRequestTarget {
    pub number: u32,
}

/// Request naming the file to explain.
#[derive(Debug, Deserialize)]
pub struct ExplainFileRequest {
    pub name: String,
    pub branch: Option<String>,
}

/// Request describing changes to name a commit after.
#[derive(Debug, Deserialize)]
pub struct CommitMessageRequest {
    pub changes: String,
}

/// Response carrying the AI reply text.
#[derive(Debug, Serialize)]
pub struct AiReply {
    pub text: String,
}

fn ai_client(state: &AppState) -> Result<Arc<AiClient>, ApiError> {
    state.ai.clone().ok_or(ApiError::AiNotConfigured)
}

// ==================== Handlers ====================

/// Requests an AI review of a pull request's stored diff and persists it
/// as the pull request's feedback.
async fn review_pull_request(
    State(state): State<AppState>,
    Path(repo_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<PullRequestTarget>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers);
    let (repo, _) = guarded_repo(&state, &repo_id, caller.as_ref(), RepoAction::Write)?;
    let ai = ai_client(&state)?;

    let pr = state.collaboration.get_pull_request(&repo.id, req.number)?;
    let text = ai.complete(&AiClient::review_prompt(&pr.diff)).await?;
    state
        .collaboration
        .set_ai_feedback(&repo.id, req.number, text.clone())?;

    tracing::info!(repo = %repo.id, number = req.number, "ai review stored");
    Ok(Json(AiReply { text }))
}

/// Requests an AI summary of a pull request's stored diff and persists it.
async fn summarize_pull_request(
    State(state): State<AppState>,
    Path(repo_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<PullRequestTarget>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers);
    let (repo, _) = guarded_repo(&state, &repo_id, caller.as_ref(), RepoAction::Write)?;
    let ai = ai_client(&state)?;

    let pr = state.collaboration.get_pull_request(&repo.id, req.number)?;
    let text = ai.complete(&AiClient::summary_prompt(&pr.diff)).await?;
    state
        .collaboration
        .set_ai_summary(&repo.id, req.number, text.clone())?;

    Ok(Json(AiReply { text }))
}

/// Asks the AI to explain one file's current content.
async fn explain_file(
    State(state): State<AppState>,
    Path(repo_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<ExplainFileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers);
    let (repo, _) = guarded_repo(&state, &repo_id, caller.as_ref(), RepoAction::Write)?;
    let ai = ai_client(&state)?;

    let branch = req.branch.as_deref().unwrap_or(DEFAULT_BRANCH);
    let file = state
        .vcs
        .get_file(&repo.id, branch, &req.name)
        .ok_or_else(|| {
            ApiError::BadRequest(format!("file not found: {} on {}", req.name, branch))
        })?;

    let text = ai
        .complete(&AiClient::explain_prompt(&file.name, &file.content))
        .await?;
    Ok(Json(AiReply { text }))
}

/// Asks the AI to suggest a commit message for a described change set.
async fn suggest_commit_message(
    State(state): State<AppState>,
    Path(repo_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<CommitMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers);
    let (_, _) = guarded_repo(&state, &repo_id, caller.as_ref(), RepoAction::Write)?;
    let ai = ai_client(&state)?;

    let text = ai
        .complete(&AiClient::commit_message_prompt(&req.changes))
        .await?;
    Ok(Json(AiReply { text }))
}
