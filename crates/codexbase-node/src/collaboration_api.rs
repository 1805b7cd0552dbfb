//! Pull request and comment endpoints.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use codexbase_auth::RepoAction;
use codexbase_collaboration::{Comment, PrStatus, PullRequest};
use codexbase_vcs::compute_diff;

use crate::api::{guarded_repo, ApiError, AppState};
use crate::auth::caller_from_headers;

/// Creates the collaboration API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/repos/{repo}/pulls",
            get(list_pull_requests).post(create_pull_request),
        )
        .route("/api/repos/{repo}/pulls/{number}", get(get_pull_request))
        .route(
            "/api/repos/{repo}/pulls/{number}/merge",
            post(merge_pull_request),
        )
        .route(
            "/api/repos/{repo}/pulls/{number}/close",
            post(close_pull_request),
        )
        .route(
            "/api/repos/{repo}/pulls/{number}/comments",
            get(list_comments).post(create_comment),
        )
}

// ==================== Request/Response Types ====================

/// Request to open a pull request.
#[derive(Debug, Deserialize)]
pub struct CreatePullRequestRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub source_branch: String,
    pub target_branch: String,
}

/// Request to comment on a pull request.
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub body: String,
}

/// Response for a pull request.
#[derive(Debug, Serialize)]
pub struct PullRequestResponse {
    pub number: u32,
    pub title: String,
    pub description: String,
    pub author: String,
    pub source_branch: String,
    pub target_branch: String,
    pub status: PrStatus,
    pub diff: String,
    pub ai_feedback: Option<String>,
    pub ai_summary: Option<String>,
    pub created_at: u64,
    pub updated_at: u64,
    pub merged_at: Option<u64>,
    pub merged_by: Option<String>,
}

impl From<PullRequest> for PullRequestResponse {
    fn from(pr: PullRequest) -> Self {
        Self {
            number: pr.number,
            title: pr.title,
            description: pr.description,
            author: pr.author.to_string(),
            source_branch: pr.source_branch,
            target_branch: pr.target_branch,
            status: pr.status,
            diff: pr.diff,
            ai_feedback: pr.ai_feedback,
            ai_summary: pr.ai_summary,
            created_at: pr.created_at,
            updated_at: pr.updated_at,
            merged_at: pr.merged_at,
            merged_by: pr.merged_by.map(|u| u.to_string()),
        }
    }
}

/// Response for a comment.
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: u64,
    pub pr_number: u32,
    pub author: String,
    pub body: String,
    pub created_at: u64,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            pr_number: comment.pr_number,
            author: comment.author.to_string(),
            body: comment.body,
            created_at: comment.created_at,
        }
    }
}

/// Response for merging: the pull request plus how many files moved.
#[derive(Debug, Serialize)]
pub struct MergeResponse {
    pub pull_request: PullRequestResponse,
    pub files_merged: usize,
}

// ==================== Handlers ====================

/// Opens a pull request. The diff between the two branches is computed
/// once, here, and stored on the pull request.
async fn create_pull_request(
    State(state): State<AppState>,
    Path(repo_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<CreatePullRequestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers);
    let (repo, _) = guarded_repo(&state, &repo_id, caller.as_ref(), RepoAction::Write)?;
    let author = caller.ok_or(codexbase_auth::AuthError::Unauthenticated)?;

    let source = state.vcs.branch_snapshot(&repo.id, &req.source_branch);
    let target = state.vcs.branch_snapshot(&repo.id, &req.target_branch);
    let diff = compute_diff(&source, &target);

    let pr = state.collaboration.create_pull_request(PullRequest::new(
        repo.id,
        0,
        req.source_branch,
        req.target_branch,
        author,
        req.title,
        req.description,
        diff,
    ))?;
    tracing::info!(repo = %repo.id, number = pr.number, "pull request opened");
    Ok((StatusCode::CREATED, Json(PullRequestResponse::from(pr))))
}

/// Lists pull requests, newest first.
async fn list_pull_requests(
    State(state): State<AppState>,
    Path(repo_id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers);
    let (repo, _) = guarded_repo(&state, &repo_id, caller.as_ref(), RepoAction::Read)?;

    let prs: Vec<PullRequestResponse> = state
        .collaboration
        .list_pull_requests(&repo.id)
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(prs))
}

/// Gets one pull request.
async fn get_pull_request(
    State(state): State<AppState>,
    Path((repo_id, number)): Path<(String, u32)>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers);
    let (repo, _) = guarded_repo(&state, &repo_id, caller.as_ref(), RepoAction::Read)?;

    let pr = state.collaboration.get_pull_request(&repo.id, number)?;
    Ok(Json(PullRequestResponse::from(pr)))
}

/// Merges an open pull request. Owner only.
///
/// Every source-branch file is copied onto the target branch, overwriting
/// same-named files and keeping the source authors. Target-only files are
/// untouched, and no commit is recorded.
async fn merge_pull_request(
    State(state): State<AppState>,
    Path((repo_id, number)): Path<(String, u32)>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers);
    let (repo, _) = guarded_repo(&state, &repo_id, caller.as_ref(), RepoAction::Admin)?;
    let merged_by = caller.ok_or(codexbase_auth::AuthError::Unauthenticated)?;

    let pr = state.collaboration.get_pull_request(&repo.id, number)?;
    if !pr.is_open() {
        return Err(codexbase_collaboration::CollaborationError::NotOpen { number }.into());
    }

    let files_merged = state
        .vcs
        .merge_branch(&repo.id, &pr.source_branch, &pr.target_branch)?;
    let pr = state
        .collaboration
        .merge_pull_request(&repo.id, number, merged_by)?;

    tracing::info!(repo = %repo.id, number, files_merged, "pull request merged");
    Ok(Json(MergeResponse {
        pull_request: PullRequestResponse::from(pr),
        files_merged,
    }))
}

/// Closes an open pull request without merging. Owner only.
async fn close_pull_request(
    State(state): State<AppState>,
    Path((repo_id, number)): Path<(String, u32)>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers);
    let (repo, _) = guarded_repo(&state, &repo_id, caller.as_ref(), RepoAction::Admin)?;

    let pr = state.collaboration.close_pull_request(&repo.id, number)?;
    Ok(Json(PullRequestResponse::from(pr)))
}

/// Comments on a pull request. Any authenticated reader may comment.
async fn create_comment(
    State(state): State<AppState>,
    Path((repo_id, number)): Path<(String, u32)>,
    headers: HeaderMap,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers)
        .ok_or(codexbase_auth::AuthError::Unauthenticated)?;
    let (repo, _) = guarded_repo(&state, &repo_id, Some(&caller), RepoAction::Read)?;

    let comment = state
        .collaboration
        .create_comment(Comment::new(repo.id, number, caller, req.body))?;
    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}

/// Lists comments on a pull request, oldest first.
async fn list_comments(
    State(state): State<AppState>,
    Path((repo_id, number)): Path<(String, u32)>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers);
    let (repo, _) = guarded_repo(&state, &repo_id, caller.as_ref(), RepoAction::Read)?;

    // Comment lookups on an unknown pull request answer 404.
    state.collaboration.get_pull_request(&repo.id, number)?;
    let comments: Vec<CommentResponse> = state
        .collaboration
        .list_comments(&repo.id, number)
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(comments))
}
