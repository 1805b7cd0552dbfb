//! Repository endpoints: metadata, files, commits, branches, clone, pull.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use codexbase_auth::RepoAction;
use codexbase_types::{Repository, Visibility};
use codexbase_vcs::{Commit, CommitFile, CommitHash, FileRecord, DEFAULT_BRANCH};

use crate::api::{guarded_repo, AppState, ApiError};
use crate::auth::caller_from_headers;

/// Maximum number of commits returned by the commit listing endpoint.
const COMMIT_PAGE_LIMIT: usize = 50;

/// Creates the repository API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/repos", get(list_repos).post(create_repo))
        .route("/api/repos/{repo}", get(get_repo))
        .route("/api/repos/{repo}/collaborators", post(add_collaborator))
        .route("/api/repos/{repo}/star", post(toggle_star))
        .route(
            "/api/repos/{repo}/files",
            get(list_files).post(create_file).delete(delete_file),
        )
        .route(
            "/api/repos/{repo}/commits",
            get(list_commits).post(create_commit),
        )
        .route(
            "/api/repos/{repo}/branches",
            get(list_branches).post(create_branch),
        )
        .route("/api/repos/{repo}/clone", get(clone_repo))
        .route("/api/repos/{repo}/pull", get(pull_repo))
}

// ==================== Request/Response Types ====================

/// Request to create a repository.
#[derive(Debug, Deserialize)]
pub struct CreateRepoRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub private: bool,
}

/// Request to grant collaborator access.
#[derive(Debug, Deserialize)]
pub struct AddCollaboratorRequest {
    pub user: String,
}

/// Query parameters selecting a branch.
#[derive(Debug, Deserialize)]
pub struct BranchQuery {
    pub branch: Option<String>,
}

/// Request to create a file.
#[derive(Debug, Deserialize)]
pub struct CreateFileRequest {
    pub name: String,
    pub content: String,
    pub branch: Option<String>,
}

/// Request to delete a file.
#[derive(Debug, Deserialize)]
pub struct DeleteFileRequest {
    pub name: String,
    pub branch: Option<String>,
}

/// One file in a commit request.
#[derive(Debug, Deserialize)]
pub struct CommitFileRequest {
    pub name: String,
    pub content: String,
}

/// Request to record a commit.
#[derive(Debug, Deserialize)]
pub struct CommitRequest {
    pub message: String,
    pub files: Vec<CommitFileRequest>,
    pub branch: Option<String>,
}

/// Request to create a branch.
#[derive(Debug, Deserialize)]
pub struct CreateBranchRequest {
    pub branch_name: String,
    pub from_branch: Option<String>,
}

/// Query parameters for the pull endpoint.
#[derive(Debug, Deserialize)]
pub struct PullQuery {
    pub since: Option<String>,
}

/// Response for a repository.
#[derive(Debug, Serialize)]
pub struct RepoResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner: String,
    pub collaborators: Vec<String>,
    pub visibility: Visibility,
    pub stars: usize,
    pub created_at: u64,
    pub updated_at: u64,
}

impl From<Repository> for RepoResponse {
    fn from(repo: Repository) -> Self {
        Self {
            id: repo.id.to_hex(),
            name: repo.name,
            description: repo.description,
            owner: repo.owner.to_string(),
            collaborators: repo.collaborators.iter().map(|u| u.to_string()).collect(),
            visibility: repo.visibility,
            stars: repo.starred_by.len(),
            created_at: repo.created_at,
            updated_at: repo.updated_at,
        }
    }
}

/// Response for a file record.
#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub name: String,
    pub branch: String,
    pub content: String,
    pub author: String,
    pub created_at: u64,
    pub updated_at: u64,
}

impl From<FileRecord> for FileResponse {
    fn from(file: FileRecord) -> Self {
        Self {
            name: file.name,
            branch: file.branch,
            content: file.content,
            author: file.author.to_string(),
            created_at: file.created_at,
            updated_at: file.updated_at,
        }
    }
}

/// Response for a commit.
#[derive(Debug, Serialize)]
pub struct CommitResponse {
    pub hash: String,
    pub author: String,
    pub message: String,
    pub branch: String,
    pub files: Vec<CommitFileResponse>,
    pub created_at: u64,
}

/// One file snapshot within a commit response.
#[derive(Debug, Serialize)]
pub struct CommitFileResponse {
    pub name: String,
    pub content: String,
}

impl From<Commit> for CommitResponse {
    fn from(commit: Commit) -> Self {
        Self {
            hash: commit.hash.to_hex(),
            author: commit.author.to_string(),
            message: commit.message,
            branch: commit.branch,
            files: commit
                .files
                .into_iter()
                .map(|f| CommitFileResponse {
                    name: f.name,
                    content: f.content,
                })
                .collect(),
            created_at: commit.created_at,
        }
    }
}

/// Response for branch creation.
#[derive(Debug, Serialize)]
pub struct BranchCreatedResponse {
    pub branch: String,
    pub files_copied: usize,
}

/// Response for starring.
#[derive(Debug, Serialize)]
pub struct StarResponse {
    pub starred: bool,
    pub stars: usize,
}

/// Response for clone and pull: commits plus current files.
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub files: Vec<FileResponse>,
    pub commits: Vec<CommitResponse>,
}

fn branch_or_default(branch: Option<String>) -> String {
    match branch {
        Some(b) if !b.is_empty() => b,
        _ => DEFAULT_BRANCH.to_string(),
    }
}

// ==================== Repository Handlers ====================

/// Creates a repository owned by the caller.
async fn create_repo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateRepoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers)
        .ok_or(codexbase_auth::AuthError::Unauthenticated)?;

    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "repository name must not be empty".into(),
        ));
    }

    let mut repo = Repository::new(req.name, caller);
    if let Some(description) = req.description {
        repo = repo.with_description(description);
    }
    if req.private {
        repo = repo.with_visibility(Visibility::Private);
    }

    let created = state.repos.create(repo)?;
    tracing::info!(repo = %created.id, owner = %created.owner, "repository created");
    Ok((StatusCode::CREATED, Json(RepoResponse::from(created))))
}

/// Lists repositories visible to the caller: every public repository plus
/// private ones the caller collaborates on.
async fn list_repos(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers);

    let repos: Vec<RepoResponse> = state
        .repos
        .list()
        .into_iter()
        .filter(|repo| match repo.visibility {
            Visibility::Public => true,
            Visibility::Private => caller.as_ref().is_some_and(|u| repo.is_collaborator(u)),
        })
        .map(Into::into)
        .collect();

    Ok(Json(repos))
}

/// Gets repository metadata.
async fn get_repo(
    State(state): State<AppState>,
    Path(repo_id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers);
    let (repo, _) = guarded_repo(&state, &repo_id, caller.as_ref(), RepoAction::Read)?;
    Ok(Json(RepoResponse::from(repo)))
}

/// Grants collaborator access. Owner only.
async fn add_collaborator(
    State(state): State<AppState>,
    Path(repo_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<AddCollaboratorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers);
    let (repo, _) = guarded_repo(&state, &repo_id, caller.as_ref(), RepoAction::Admin)?;

    if req.user.trim().is_empty() {
        return Err(ApiError::BadRequest("user must not be empty".into()));
    }

    let updated = state.repos.update(&repo.id, |r| {
        r.add_collaborator(req.user.as_str().into());
        r.clone()
    })?;
    Ok(Json(RepoResponse::from(updated)))
}

/// Toggles the caller's star on a repository.
async fn toggle_star(
    State(state): State<AppState>,
    Path(repo_id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers)
        .ok_or(codexbase_auth::AuthError::Unauthenticated)?;
    let (repo, _) = guarded_repo(&state, &repo_id, Some(&caller), RepoAction::Read)?;

    let (starred, stars) = state.repos.update(&repo.id, |r| {
        let starred = r.toggle_star(caller.clone());
        (starred, r.starred_by.len())
    })?;
    Ok(Json(StarResponse { starred, stars }))
}

// ==================== File Handlers ====================

/// Lists files on a branch. Non-collaborators reading a public repository
/// receive a preview truncated to the guard's file limit.
async fn list_files(
    State(state): State<AppState>,
    Path(repo_id): Path<String>,
    Query(query): Query<BranchQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers);
    let (repo, access) = guarded_repo(&state, &repo_id, caller.as_ref(), RepoAction::Read)?;

    let branch = branch_or_default(query.branch);
    let mut files = state.vcs.list_files(&repo.id, &branch);
    if let Some(limit) = access.file_limit() {
        files.truncate(limit);
    }

    let files: Vec<FileResponse> = files.into_iter().map(Into::into).collect();
    Ok(Json(files))
}

/// Creates or overwrites one file. Collaborator only.
async fn create_file(
    State(state): State<AppState>,
    Path(repo_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<CreateFileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers);
    let (repo, _) = guarded_repo(&state, &repo_id, caller.as_ref(), RepoAction::Write)?;
    let author = caller.ok_or(codexbase_auth::AuthError::Unauthenticated)?;

    let branch = branch_or_default(req.branch);
    let file = state
        .vcs
        .upsert_file(repo.id, &branch, &req.name, &req.content, &author)?;
    Ok((StatusCode::CREATED, Json(FileResponse::from(file))))
}

/// Deletes one file. Collaborator only; deleting an absent file succeeds.
async fn delete_file(
    State(state): State<AppState>,
    Path(repo_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<DeleteFileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers);
    let (repo, _) = guarded_repo(&state, &repo_id, caller.as_ref(), RepoAction::Write)?;

    let branch = branch_or_default(req.branch);
    state.vcs.delete_file(&repo.id, &branch, &req.name);
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Commit Handlers ====================

/// Records a commit: upserts every file, then appends the snapshot.
async fn create_commit(
    State(state): State<AppState>,
    Path(repo_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<CommitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers);
    let (repo, _) = guarded_repo(&state, &repo_id, caller.as_ref(), RepoAction::Write)?;
    let author = caller.ok_or(codexbase_auth::AuthError::Unauthenticated)?;

    let branch = branch_or_default(req.branch);
    let files: Vec<CommitFile> = req
        .files
        .into_iter()
        .map(|f| CommitFile::new(f.name, f.content))
        .collect();

    let commit = state
        .vcs
        .commit(repo.id, &branch, &author, &req.message, files)?;
    tracing::info!(repo = %repo.id, branch, hash = %commit.hash, "commit recorded");
    Ok((StatusCode::CREATED, Json(CommitResponse::from(commit))))
}

/// Lists commits, newest first, capped at 50 (20 for truncated previews).
async fn list_commits(
    State(state): State<AppState>,
    Path(repo_id): Path<String>,
    Query(query): Query<BranchQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers);
    let (repo, access) = guarded_repo(&state, &repo_id, caller.as_ref(), RepoAction::Read)?;

    let limit = access.file_limit().unwrap_or(COMMIT_PAGE_LIMIT);
    let mut commits = state.vcs.list_commits(&repo.id, query.branch.as_deref());
    commits.truncate(limit);

    let commits: Vec<CommitResponse> = commits.into_iter().map(Into::into).collect();
    Ok(Json(commits))
}

// ==================== Branch Handlers ====================

/// Lists distinct branch names. The default branch is always present.
async fn list_branches(
    State(state): State<AppState>,
    Path(repo_id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers);
    let (repo, _) = guarded_repo(&state, &repo_id, caller.as_ref(), RepoAction::Read)?;

    let mut branches = state.vcs.list_branches(&repo.id);
    if !branches.iter().any(|b| b == DEFAULT_BRANCH) {
        branches.push(DEFAULT_BRANCH.to_string());
        branches.sort();
    }
    Ok(Json(branches))
}

/// Creates a branch, optionally forking an existing one. Collaborator only.
async fn create_branch(
    State(state): State<AppState>,
    Path(repo_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<CreateBranchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers);
    let (repo, _) = guarded_repo(&state, &repo_id, caller.as_ref(), RepoAction::Write)?;

    let files_copied =
        state
            .vcs
            .create_branch(repo.id, &req.branch_name, req.from_branch.as_deref())?;
    Ok((
        StatusCode::CREATED,
        Json(BranchCreatedResponse {
            branch: req.branch_name,
            files_copied,
        }),
    ))
}

// ==================== Clone / Pull Handlers ====================

/// Returns every file and commit of the repository. Collaborator only.
async fn clone_repo(
    State(state): State<AppState>,
    Path(repo_id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers);
    let (repo, _) = guarded_repo(&state, &repo_id, caller.as_ref(), RepoAction::Write)?;

    let files: Vec<FileResponse> = state
        .vcs
        .all_files(&repo.id)
        .into_iter()
        .map(Into::into)
        .collect();
    // Oldest first, so a client can replay the log.
    let mut commits = state.vcs.list_commits(&repo.id, None);
    commits.reverse();
    let commits: Vec<CommitResponse> = commits.into_iter().map(Into::into).collect();

    Ok(Json(SyncResponse { files, commits }))
}

/// Returns the commits recorded after `since` plus the current files.
/// Collaborator only; without `since`, the full log is returned.
async fn pull_repo(
    State(state): State<AppState>,
    Path(repo_id): Path<String>,
    Query(query): Query<PullQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers);
    let (repo, _) = guarded_repo(&state, &repo_id, caller.as_ref(), RepoAction::Write)?;

    let commits = match query.since.as_deref() {
        Some(raw) => {
            let hash = CommitHash::from_hex(raw)
                .map_err(|_| ApiError::BadRequest(format!("invalid commit hash: {raw}")))?;
            state.vcs.commits_since(&repo.id, &hash)?
        }
        None => {
            let mut all = state.vcs.list_commits(&repo.id, None);
            all.reverse();
            all
        }
    };

    let files: Vec<FileResponse> = state
        .vcs
        .all_files(&repo.id)
        .into_iter()
        .map(Into::into)
        .collect();
    let commits: Vec<CommitResponse> = commits.into_iter().map(Into::into).collect();

    Ok(Json(SyncResponse { files, commits }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::create_router;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use codexbase_types::UserId;
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let state = AppState::new();
        state.tokens.register("tok-owner", UserId::new("owner"));
        state.tokens.register("tok-collab", UserId::new("collab"));
        state.tokens.register("tok-stranger", UserId::new("stranger"));
        state
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(state: &AppState, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = create_router(state.clone()).oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn create_test_repo(state: &AppState, private: bool) -> String {
        let (status, body) = send(
            state,
            request(
                "POST",
                "/api/repos",
                Some("tok-owner"),
                Some(serde_json::json!({ "name": "project", "private": private })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    async fn commit_file(state: &AppState, repo: &str, token: &str, name: &str, content: &str) {
        let (status, _) = send(
            state,
            request(
                "POST",
                &format!("/api/repos/{repo}/commits"),
                Some(token),
                Some(serde_json::json!({
                    "message": format!("add {name}"),
                    "files": [{ "name": name, "content": content }],
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_create_repo_requires_auth() {
        let state = test_state();
        let (status, body) = send(
            &state,
            request(
                "POST",
                "/api/repos",
                None,
                Some(serde_json::json!({ "name": "project" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_duplicate_repo_conflicts() {
        let state = test_state();
        create_test_repo(&state, false).await;
        let (status, _) = send(
            &state,
            request(
                "POST",
                "/api/repos",
                Some("tok-owner"),
                Some(serde_json::json!({ "name": "project" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_commit_then_files_and_log() {
        let state = test_state();
        let repo = create_test_repo(&state, false).await;

        let (status, commit) = send(
            &state,
            request(
                "POST",
                &format!("/api/repos/{repo}/commits"),
                Some("tok-owner"),
                Some(serde_json::json!({
                    "message": "init",
                    "files": [{ "name": "a.txt", "content": "hi" }],
                    "branch": "main",
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(commit["hash"].as_str().is_some());
        assert_eq!(commit["files"][0]["name"], "a.txt");

        let (status, files) = send(
            &state,
            request(
                "GET",
                &format!("/api/repos/{repo}/files?branch=main"),
                Some("tok-owner"),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(files.as_array().unwrap().len(), 1);
        assert_eq!(files[0]["content"], "hi");

        let (status, commits) = send(
            &state,
            request(
                "GET",
                &format!("/api/repos/{repo}/commits"),
                Some("tok-owner"),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(commits.as_array().unwrap().len(), 1);
        assert_eq!(commits[0]["message"], "init");
    }

    #[tokio::test]
    async fn test_empty_commit_message_rejected() {
        let state = test_state();
        let repo = create_test_repo(&state, false).await;

        let (status, _) = send(
            &state,
            request(
                "POST",
                &format!("/api/repos/{repo}/commits"),
                Some("tok-owner"),
                Some(serde_json::json!({
                    "message": "",
                    "files": [{ "name": "a.txt", "content": "hi" }],
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Store untouched.
        let (_, files) = send(
            &state,
            request(
                "GET",
                &format!("/api/repos/{repo}/files"),
                Some("tok-owner"),
                None,
            ),
        )
        .await;
        assert!(files.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mutations_forbidden_for_non_collaborators() {
        let state = test_state();
        let repo = create_test_repo(&state, false).await;

        // Public repository: mutations still require collaborator status.
        let attempts = [
            request(
                "POST",
                &format!("/api/repos/{repo}/files"),
                Some("tok-stranger"),
                Some(serde_json::json!({ "name": "x.txt", "content": "x" })),
            ),
            request(
                "POST",
                &format!("/api/repos/{repo}/commits"),
                Some("tok-stranger"),
                Some(serde_json::json!({
                    "message": "sneaky",
                    "files": [{ "name": "x.txt", "content": "x" }],
                })),
            ),
            request(
                "POST",
                &format!("/api/repos/{repo}/branches"),
                Some("tok-stranger"),
                Some(serde_json::json!({ "branch_name": "evil" })),
            ),
            request(
                "DELETE",
                &format!("/api/repos/{repo}/files"),
                Some("tok-stranger"),
                Some(serde_json::json!({ "name": "x.txt" })),
            ),
            request(
                "GET",
                &format!("/api/repos/{repo}/clone"),
                Some("tok-stranger"),
                None,
            ),
        ];

        for req in attempts {
            let (status, _) = send(&state, req).await;
            assert_eq!(status, StatusCode::FORBIDDEN);
        }
    }

    #[tokio::test]
    async fn test_private_repo_read_then_invite() {
        let state = test_state();
        let repo = create_test_repo(&state, true).await;
        commit_file(&state, &repo, "tok-owner", "a.txt", "secret").await;

        // Non-collaborator: denied outright.
        let (status, _) = send(
            &state,
            request(
                "GET",
                &format!("/api/repos/{repo}/files"),
                Some("tok-collab"),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // Owner invites; the same read now returns the full list.
        let (status, _) = send(
            &state,
            request(
                "POST",
                &format!("/api/repos/{repo}/collaborators"),
                Some("tok-owner"),
                Some(serde_json::json!({ "user": "collab" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, files) = send(
            &state,
            request(
                "GET",
                &format!("/api/repos/{repo}/files"),
                Some("tok-collab"),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(files.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_public_file_listing_truncated_for_anonymous() {
        let state = test_state();
        let repo = create_test_repo(&state, false).await;

        for i in 0..25 {
            commit_file(
                &state,
                &repo,
                "tok-owner",
                &format!("file-{i:02}.txt"),
                "content",
            )
            .await;
        }

        // Anonymous preview is capped at 20.
        let (status, files) = send(
            &state,
            request("GET", &format!("/api/repos/{repo}/files"), None, None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(files.as_array().unwrap().len(), 20);

        // The owner sees everything.
        let (_, files) = send(
            &state,
            request(
                "GET",
                &format!("/api/repos/{repo}/files"),
                Some("tok-owner"),
                None,
            ),
        )
        .await;
        assert_eq!(files.as_array().unwrap().len(), 25);
    }

    #[tokio::test]
    async fn test_branches_always_include_main() {
        let state = test_state();
        let repo = create_test_repo(&state, false).await;

        let (status, branches) = send(
            &state,
            request(
                "GET",
                &format!("/api/repos/{repo}/branches"),
                Some("tok-owner"),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(branches, serde_json::json!(["main"]));

        commit_file(&state, &repo, "tok-owner", "a.txt", "x").await;
        let (status, _) = send(
            &state,
            request(
                "POST",
                &format!("/api/repos/{repo}/branches"),
                Some("tok-owner"),
                Some(serde_json::json!({ "branch_name": "dev", "from_branch": "main" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, branches) = send(
            &state,
            request(
                "GET",
                &format!("/api/repos/{repo}/branches"),
                Some("tok-owner"),
                None,
            ),
        )
        .await;
        assert_eq!(branches, serde_json::json!(["dev", "main"]));
    }

    #[tokio::test]
    async fn test_branch_fork_copies_files() {
        let state = test_state();
        let repo = create_test_repo(&state, false).await;
        commit_file(&state, &repo, "tok-owner", "a.txt", "v1").await;

        let (status, created) = send(
            &state,
            request(
                "POST",
                &format!("/api/repos/{repo}/branches"),
                Some("tok-owner"),
                Some(serde_json::json!({ "branch_name": "fork", "from_branch": "main" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["files_copied"], 1);

        let (_, files) = send(
            &state,
            request(
                "GET",
                &format!("/api/repos/{repo}/files?branch=fork"),
                Some("tok-owner"),
                None,
            ),
        )
        .await;
        assert_eq!(files.as_array().unwrap().len(), 1);
        assert_eq!(files[0]["content"], "v1");
    }

    #[tokio::test]
    async fn test_pull_since_hash() {
        let state = test_state();
        let repo = create_test_repo(&state, false).await;

        commit_file(&state, &repo, "tok-owner", "a.txt", "1").await;
        let (_, commits) = send(
            &state,
            request(
                "GET",
                &format!("/api/repos/{repo}/commits"),
                Some("tok-owner"),
                None,
            ),
        )
        .await;
        let first_hash = commits[0]["hash"].as_str().unwrap().to_string();

        commit_file(&state, &repo, "tok-owner", "b.txt", "2").await;

        let (status, sync) = send(
            &state,
            request(
                "GET",
                &format!("/api/repos/{repo}/pull?since={first_hash}"),
                Some("tok-owner"),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(sync["commits"].as_array().unwrap().len(), 1);
        assert_eq!(sync["commits"][0]["files"][0]["name"], "b.txt");
        assert_eq!(sync["files"].as_array().unwrap().len(), 2);

        // Unknown hash is 404.
        let bogus = "ab".repeat(32);
        let (status, _) = send(
            &state,
            request(
                "GET",
                &format!("/api/repos/{repo}/pull?since={bogus}"),
                Some("tok-owner"),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_clone_returns_files_and_commits() {
        let state = test_state();
        let repo = create_test_repo(&state, false).await;
        commit_file(&state, &repo, "tok-owner", "a.txt", "1").await;
        commit_file(&state, &repo, "tok-owner", "b.txt", "2").await;

        let (status, sync) = send(
            &state,
            request(
                "GET",
                &format!("/api/repos/{repo}/clone"),
                Some("tok-owner"),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(sync["files"].as_array().unwrap().len(), 2);
        assert_eq!(sync["commits"].as_array().unwrap().len(), 2);
        // Clone log replays oldest first.
        assert_eq!(sync["commits"][0]["files"][0]["name"], "a.txt");
    }

    #[tokio::test]
    async fn test_delete_file_noop_when_absent() {
        let state = test_state();
        let repo = create_test_repo(&state, false).await;

        let (status, _) = send(
            &state,
            request(
                "DELETE",
                &format!("/api/repos/{repo}/files"),
                Some("tok-owner"),
                Some(serde_json::json!({ "name": "ghost.txt" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_star_toggle() {
        let state = test_state();
        let repo = create_test_repo(&state, false).await;

        let (status, body) = send(
            &state,
            request(
                "POST",
                &format!("/api/repos/{repo}/star"),
                Some("tok-stranger"),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "starred": true, "stars": 1 }));

        let (_, body) = send(
            &state,
            request(
                "POST",
                &format!("/api/repos/{repo}/star"),
                Some("tok-stranger"),
                None,
            ),
        )
        .await;
        assert_eq!(body, serde_json::json!({ "starred": false, "stars": 0 }));
    }

    #[tokio::test]
    async fn test_private_repo_hidden_from_listing() {
        let state = test_state();
        create_test_repo(&state, true).await;

        let (_, repos) = send(&state, request("GET", "/api/repos", None, None)).await;
        assert!(repos.as_array().unwrap().is_empty());

        let (_, repos) = send(
            &state,
            request("GET", "/api/repos", Some("tok-owner"), None),
        )
        .await;
        assert_eq!(repos.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_repo_id_is_bad_request() {
        let state = test_state();
        let (status, _) = send(
            &state,
            request("GET", "/api/repos/not-hex/files", None, None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
