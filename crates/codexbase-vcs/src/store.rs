//! In-memory store for file records and commit logs.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use codexbase_types::{unix_now, RepositoryId, UserId};

use crate::{Commit, CommitFile, CommitHash, FileRecord, Result, VcsError};

/// Per-repository file records, keyed by `(branch, name)`.
///
/// The BTreeMap keeps listings ordered by branch then name, which makes
/// branch ranges and file listings deterministic.
type FileMap = BTreeMap<(String, String), FileRecord>;

/// In-memory store for versioned files and commits.
///
/// Files are live records, at most one per `(repo, branch, name)`; commits
/// are an append-only per-repository log. Branches are not tracked
/// separately: a branch exists exactly when at least one file record carries
/// its tag. Multi-step operations (commit, merge, branch fork) run under a
/// single write lock, so they are observed either entirely or not at all.
#[derive(Default)]
pub struct VcsStore {
    /// File records per repository.
    files: RwLock<HashMap<RepositoryId, FileMap>>,
    /// Append-only commit log per repository, in insertion order.
    commits: RwLock<HashMap<RepositoryId, Vec<Commit>>>,
    /// Global commit ID counter.
    next_commit_id: AtomicU64,
}

impl VcsStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_commit_id(&self) -> u64 {
        self.next_commit_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    // ==================== File Store ====================

    /// Inserts or overwrites the file at `(repo, branch, name)`.
    ///
    /// Last write wins; there is no concurrency token. Returns the record
    /// as stored.
    pub fn upsert_file(
        &self,
        repo: RepositoryId,
        branch: &str,
        name: &str,
        content: &str,
        author: &UserId,
    ) -> Result<FileRecord> {
        validate_branch(branch)?;
        if name.is_empty() {
            return Err(VcsError::Validation("file name must not be empty".into()));
        }

        let mut files = self.files.write();
        let record = upsert_locked(
            files.entry(repo).or_default(),
            repo,
            branch,
            name,
            content,
            author,
        );
        Ok(record)
    }

    /// Returns the file at `(repo, branch, name)`, if present.
    pub fn get_file(&self, repo: &RepositoryId, branch: &str, name: &str) -> Option<FileRecord> {
        self.files
            .read()
            .get(repo)?
            .get(&(branch.to_string(), name.to_string()))
            .cloned()
    }

    /// Lists all file records for a branch, ordered by name.
    pub fn list_files(&self, repo: &RepositoryId, branch: &str) -> Vec<FileRecord> {
        self.files
            .read()
            .get(repo)
            .map(|map| branch_records(map, branch).cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the branch's files as commit-file snapshots, ordered by name.
    pub fn branch_snapshot(&self, repo: &RepositoryId, branch: &str) -> Vec<CommitFile> {
        self.list_files(repo, branch)
            .into_iter()
            .map(|f| CommitFile::new(f.name, f.content))
            .collect()
    }

    /// Lists every file record of the repository across all branches,
    /// ordered by branch then name.
    pub fn all_files(&self, repo: &RepositoryId) -> Vec<FileRecord> {
        self.files
            .read()
            .get(repo)
            .map(|map| map.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Removes the file at `(repo, branch, name)`. Removing an absent file
    /// is a no-op.
    pub fn delete_file(&self, repo: &RepositoryId, branch: &str, name: &str) {
        if let Some(map) = self.files.write().get_mut(repo) {
            map.remove(&(branch.to_string(), name.to_string()));
        }
    }

    // ==================== Branch Materializer ====================

    /// Lists the distinct branch tags present among the repository's files,
    /// in lexicographic order.
    ///
    /// An empty repository has no branches by this definition; callers that
    /// surface branch lists should treat the default branch as always
    /// available.
    pub fn list_branches(&self, repo: &RepositoryId) -> Vec<String> {
        let files = self.files.read();
        let Some(map) = files.get(repo) else {
            return Vec::new();
        };

        let mut branches: Vec<String> = Vec::new();
        for (branch, _) in map.keys() {
            // Keys are ordered by branch, so duplicates are adjacent.
            if branches.last().map(String::as_str) != Some(branch.as_str()) {
                branches.push(branch.clone());
            }
        }
        branches
    }

    /// Creates a branch.
    ///
    /// With a non-empty `from_branch`, every file record of the source
    /// branch is copied under the new tag (same name, content, and author),
    /// leaving the source untouched. Otherwise the branch starts empty and
    /// materializes once a file lands on it. Returns the number of files
    /// copied.
    pub fn create_branch(
        &self,
        repo: RepositoryId,
        new_name: &str,
        from_branch: Option<&str>,
    ) -> Result<usize> {
        validate_branch(new_name)?;

        let from = match from_branch {
            Some(b) if !b.is_empty() => b.to_string(),
            _ => return Ok(0),
        };

        let mut files = self.files.write();
        let map = files.entry(repo).or_default();

        let copies: Vec<FileRecord> = branch_records(map, &from)
            .map(|f| {
                let mut copy = f.clone();
                copy.branch = new_name.to_string();
                copy
            })
            .collect();

        let copied = copies.len();
        for file in copies {
            map.insert((file.branch.clone(), file.name.clone()), file);
        }
        Ok(copied)
    }

    // ==================== Commit Log ====================

    /// Records a commit: upserts every input file into the file store, then
    /// appends one immutable commit snapshot with a derived hash.
    ///
    /// The whole sequence runs under the store's write locks, so a commit
    /// is never partially visible. Validation failures reject the commit
    /// before any file is written.
    pub fn commit(
        &self,
        repo: RepositoryId,
        branch: &str,
        author: &UserId,
        message: &str,
        files: Vec<CommitFile>,
    ) -> Result<Commit> {
        validate_branch(branch)?;
        if message.trim().is_empty() {
            return Err(VcsError::Validation(
                "commit message must not be empty".into(),
            ));
        }
        if files.is_empty() {
            return Err(VcsError::Validation(
                "commit must touch at least one file".into(),
            ));
        }
        if files.iter().any(|f| f.name.is_empty()) {
            return Err(VcsError::Validation("file name must not be empty".into()));
        }

        // Lock order: files before commits, matching merge_branch.
        let mut file_store = self.files.write();
        let mut commit_log = self.commits.write();

        let created_at = unix_now();
        let hash = CommitHash::derive(&repo, author, message, &files, created_at);

        let log = commit_log.entry(repo).or_default();
        if log.iter().any(|c| c.hash == hash) {
            return Err(VcsError::CommitHashConflict {
                hash: hash.to_hex(),
            });
        }

        let map = file_store.entry(repo).or_default();
        for file in &files {
            upsert_locked(map, repo, branch, &file.name, &file.content, author);
        }

        let commit = Commit {
            id: self.next_commit_id(),
            repo,
            author: author.clone(),
            message: message.to_string(),
            files,
            hash,
            branch: branch.to_string(),
            created_at,
        };
        log.push(commit.clone());
        Ok(commit)
    }

    /// Lists commits for a repository, newest first. With a branch filter,
    /// only commits made on that branch are returned.
    pub fn list_commits(&self, repo: &RepositoryId, branch: Option<&str>) -> Vec<Commit> {
        self.commits
            .read()
            .get(repo)
            .map(|log| {
                log.iter()
                    .filter(|c| branch.is_none_or(|b| c.branch == b))
                    .rev()
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Finds a commit by hash.
    pub fn find_commit(&self, repo: &RepositoryId, hash: &CommitHash) -> Option<Commit> {
        self.commits
            .read()
            .get(repo)?
            .iter()
            .find(|c| c.hash == *hash)
            .cloned()
    }

    /// Returns the commits recorded strictly after the commit with the given
    /// hash, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::UnknownCommitHash`] if no commit with that hash
    /// exists in the repository.
    pub fn commits_since(&self, repo: &RepositoryId, hash: &CommitHash) -> Result<Vec<Commit>> {
        let commits = self.commits.read();
        let log = commits
            .get(repo)
            .ok_or_else(|| VcsError::UnknownCommitHash {
                hash: hash.to_hex(),
            })?;

        let anchor = log
            .iter()
            .position(|c| c.hash == *hash)
            .ok_or_else(|| VcsError::UnknownCommitHash {
                hash: hash.to_hex(),
            })?;

        Ok(log[anchor + 1..].to_vec())
    }

    // ==================== Merge Executor ====================

    /// Copies every file record from the source branch onto the target
    /// branch, overwriting on name collision and preserving each file's
    /// recorded author.
    ///
    /// The merge is additive: files present only on the target branch are
    /// never removed, and no commit is recorded for the merge itself.
    /// Returns the number of files copied.
    pub fn merge_branch(&self, repo: &RepositoryId, source: &str, target: &str) -> Result<usize> {
        validate_branch(source)?;
        validate_branch(target)?;

        let mut files = self.files.write();
        let Some(map) = files.get_mut(repo) else {
            return Ok(0);
        };

        let sources: Vec<FileRecord> = branch_records(map, source).cloned().collect();
        let copied = sources.len();

        for file in sources {
            let key = (target.to_string(), file.name.clone());
            match map.get_mut(&key) {
                Some(existing) => {
                    existing.content = file.content;
                    existing.author = file.author;
                    existing.updated_at = unix_now();
                }
                None => {
                    let mut copy = file;
                    copy.branch = target.to_string();
                    map.insert(key, copy);
                }
            }
        }
        Ok(copied)
    }
}

/// Upserts into an already-locked file map.
fn upsert_locked(
    map: &mut FileMap,
    repo: RepositoryId,
    branch: &str,
    name: &str,
    content: &str,
    author: &UserId,
) -> FileRecord {
    let key = (branch.to_string(), name.to_string());
    match map.get_mut(&key) {
        Some(existing) => {
            existing.overwrite(content, author.clone());
            existing.clone()
        }
        None => {
            let record = FileRecord::new(repo, branch, name, content, author.clone());
            map.insert(key, record.clone());
            record
        }
    }
}

/// Iterates the records of one branch within a file map.
fn branch_records<'a>(map: &'a FileMap, branch: &str) -> impl Iterator<Item = &'a FileRecord> {
    map.range((branch.to_string(), String::new())..)
        .take_while({
            let branch = branch.to_string();
            move |((b, _), _)| *b == branch
        })
        .map(|(_, record)| record)
}

fn validate_branch(branch: &str) -> Result<()> {
    if branch.is_empty() {
        return Err(VcsError::Validation("branch name must not be empty".into()));
    }
    Ok(())
}
