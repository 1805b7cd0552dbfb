//! Pull request types and state management.

use codexbase_types::{unix_now, RepositoryId, UserId};
use serde::{Deserialize, Serialize};

use crate::{CollaborationError, Result};

/// Status of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrStatus {
    /// Open: the only state transitions can leave.
    Open,
    /// Closed without merging. Terminal.
    Closed,
    /// Merged into the target branch. Terminal.
    Merged,
}

impl std::fmt::Display for PrStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrStatus::Open => write!(f, "open"),
            PrStatus::Closed => write!(f, "closed"),
            PrStatus::Merged => write!(f, "merged"),
        }
    }
}

/// A pull request: a proposal to merge one branch into another.
///
/// The diff is a point-in-time snapshot computed when the pull request is
/// opened; it is not recomputed at merge time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    /// Unique identifier within the store.
    pub id: u64,
    /// Repository this pull request belongs to.
    pub repo: RepositoryId,
    /// Pull request number within the repository (#1, #2, ...).
    pub number: u32,
    /// Branch whose files are proposed for merging.
    pub source_branch: String,
    /// Branch the files would be merged onto.
    pub target_branch: String,
    /// Author of the pull request.
    pub author: UserId,
    /// Title.
    pub title: String,
    /// Description (may be empty).
    pub description: String,
    /// Current status.
    pub status: PrStatus,
    /// Text diff between the branches, captured at creation time.
    pub diff: String,
    /// AI-generated review feedback, if requested.
    pub ai_feedback: Option<String>,
    /// AI-generated summary, if requested.
    pub ai_summary: Option<String>,
    /// Creation timestamp (unix seconds).
    pub created_at: u64,
    /// Last update timestamp (unix seconds).
    pub updated_at: u64,
    /// When the pull request was merged, if merged.
    pub merged_at: Option<u64>,
    /// Who merged the pull request, if merged.
    pub merged_by: Option<UserId>,
}

impl PullRequest {
    /// Creates a new open pull request.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo: RepositoryId,
        number: u32,
        source_branch: impl Into<String>,
        target_branch: impl Into<String>,
        author: UserId,
        title: impl Into<String>,
        description: impl Into<String>,
        diff: impl Into<String>,
    ) -> Self {
        let now = unix_now();
        Self {
            id: 0,
            repo,
            number,
            source_branch: source_branch.into(),
            target_branch: target_branch.into(),
            author,
            title: title.into(),
            description: description.into(),
            status: PrStatus::Open,
            diff: diff.into(),
            ai_feedback: None,
            ai_summary: None,
            created_at: now,
            updated_at: now,
            merged_at: None,
            merged_by: None,
        }
    }

    /// Returns true if the pull request is open.
    pub fn is_open(&self) -> bool {
        self.status == PrStatus::Open
    }

    fn require_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(CollaborationError::NotOpen {
                number: self.number,
            })
        }
    }

    /// Closes the pull request without merging. Terminal.
    pub fn close(&mut self) -> Result<()> {
        self.require_open()?;
        self.status = PrStatus::Closed;
        self.updated_at = unix_now();
        Ok(())
    }

    /// Marks the pull request merged. Terminal.
    ///
    /// The caller is responsible for executing the merge itself before
    /// recording the transition.
    pub fn merge(&mut self, merged_by: UserId) -> Result<()> {
        self.require_open()?;
        let now = unix_now();
        self.status = PrStatus::Merged;
        self.merged_at = Some(now);
        self.merged_by = Some(merged_by);
        self.updated_at = now;
        Ok(())
    }

    /// Persists AI review feedback. Side data only; no effect on status.
    pub fn set_ai_feedback(&mut self, text: impl Into<String>) {
        self.ai_feedback = Some(text.into());
        self.updated_at = unix_now();
    }

    /// Persists an AI summary. Side data only; no effect on status.
    pub fn set_ai_summary(&mut self, text: impl Into<String>) {
        self.ai_summary = Some(text.into());
        self.updated_at = unix_now();
    }
}
