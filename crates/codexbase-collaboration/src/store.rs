//! In-memory storage for pull requests and comments.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use codexbase_types::{RepositoryId, UserId};

use crate::{CollaborationError, Comment, PullRequest, Result};

/// In-memory store for collaboration data.
///
/// Thread-safe storage for pull requests and their comments, with per-repo
/// pull request numbering.
#[derive(Default)]
pub struct CollaborationStore {
    /// Pull requests indexed by (repo, number).
    pull_requests: RwLock<HashMap<(RepositoryId, u32), PullRequest>>,
    /// Comments indexed by id.
    comments: RwLock<HashMap<u64, Comment>>,
    /// Counter for the next PR number per repository.
    pr_counters: RwLock<HashMap<RepositoryId, u32>>,
    /// Global ID counter for entities.
    next_id: AtomicU64,
}

impl CollaborationStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn next_pr_number(&self, repo: &RepositoryId) -> u32 {
        let mut counters = self.pr_counters.write();
        let counter = counters.entry(*repo).or_insert(0);
        *counter += 1;
        *counter
    }

    // ==================== Pull Requests ====================

    /// Stores a new pull request, assigning its id and per-repo number.
    pub fn create_pull_request(&self, mut pr: PullRequest) -> Result<PullRequest> {
        if pr.title.trim().is_empty() {
            return Err(CollaborationError::Validation(
                "pull request title must not be empty".into(),
            ));
        }
        if pr.source_branch.is_empty() || pr.target_branch.is_empty() {
            return Err(CollaborationError::Validation(
                "source and target branches must not be empty".into(),
            ));
        }
        if pr.source_branch == pr.target_branch {
            return Err(CollaborationError::Validation(
                "source and target branches must differ".into(),
            ));
        }

        pr.number = self.next_pr_number(&pr.repo);
        pr.id = self.next_id();

        let key = (pr.repo, pr.number);
        self.pull_requests.write().insert(key, pr.clone());
        Ok(pr)
    }

    /// Gets a pull request by repository and number.
    pub fn get_pull_request(&self, repo: &RepositoryId, number: u32) -> Result<PullRequest> {
        self.pull_requests
            .read()
            .get(&(*repo, number))
            .cloned()
            .ok_or(CollaborationError::PullRequestNotFound {
                repo: *repo,
                number,
            })
    }

    /// Lists pull requests for a repository, newest first.
    pub fn list_pull_requests(&self, repo: &RepositoryId) -> Vec<PullRequest> {
        let mut prs: Vec<PullRequest> = self
            .pull_requests
            .read()
            .values()
            .filter(|pr| pr.repo == *repo)
            .cloned()
            .collect();
        prs.sort_by(|a, b| b.number.cmp(&a.number));
        prs
    }

    /// Updates a pull request under the store's write lock.
    pub fn update_pull_request<F>(
        &self,
        repo: &RepositoryId,
        number: u32,
        f: F,
    ) -> Result<PullRequest>
    where
        F: FnOnce(&mut PullRequest) -> Result<()>,
    {
        let mut prs = self.pull_requests.write();
        let pr = prs.get_mut(&(*repo, number)).ok_or(
            CollaborationError::PullRequestNotFound {
                repo: *repo,
                number,
            },
        )?;

        f(pr)?;
        Ok(pr.clone())
    }

    /// Closes an open pull request.
    pub fn close_pull_request(&self, repo: &RepositoryId, number: u32) -> Result<PullRequest> {
        self.update_pull_request(repo, number, |pr| pr.close())
    }

    /// Marks an open pull request merged.
    pub fn merge_pull_request(
        &self,
        repo: &RepositoryId,
        number: u32,
        merged_by: UserId,
    ) -> Result<PullRequest> {
        self.update_pull_request(repo, number, |pr| pr.merge(merged_by))
    }

    /// Persists AI review feedback on a pull request.
    pub fn set_ai_feedback(
        &self,
        repo: &RepositoryId,
        number: u32,
        text: String,
    ) -> Result<PullRequest> {
        self.update_pull_request(repo, number, |pr| {
            pr.set_ai_feedback(text);
            Ok(())
        })
    }

    /// Persists an AI summary on a pull request.
    pub fn set_ai_summary(
        &self,
        repo: &RepositoryId,
        number: u32,
        text: String,
    ) -> Result<PullRequest> {
        self.update_pull_request(repo, number, |pr| {
            pr.set_ai_summary(text);
            Ok(())
        })
    }

    // ==================== Comments ====================

    /// Appends a comment to an existing pull request.
    pub fn create_comment(&self, mut comment: Comment) -> Result<Comment> {
        // The target pull request must exist; its state does not matter.
        self.get_pull_request(&comment.repo, comment.pr_number)?;

        if comment.body.trim().is_empty() {
            return Err(CollaborationError::Validation(
                "comment body must not be empty".into(),
            ));
        }

        comment.id = self.next_id();
        self.comments.write().insert(comment.id, comment.clone());
        Ok(comment)
    }

    /// Lists comments on a pull request, oldest first.
    pub fn list_comments(&self, repo: &RepositoryId, pr_number: u32) -> Vec<Comment> {
        let mut comments: Vec<Comment> = self
            .comments
            .read()
            .values()
            .filter(|c| c.repo == *repo && c.pr_number == pr_number)
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.id);
        comments
    }
}
