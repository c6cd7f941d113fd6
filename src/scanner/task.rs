//! Repository Scan Task
//!
//! Runs one full scan of a repository clone: pull-request extraction
//! through the provider API first, then the fetch/reset/branch-walk
//! phase against the local clone, with every source feeding the same
//! reconciler. Pull-request provenance is processed first so it wins
//! dedup ties.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::error::ScanResult;
use super::git_ops;
use super::history::{self, RawCommit};
use super::identity::IdentityResolver;
use super::reconcile::CommitReconciler;
use super::types::{CommitEvent, CommitEventKind, EventProvenance, ScanOptions};
use crate::github::GitHubApi;

/// Scans a single repository and yields the deduplicated event list.
pub struct RepositoryScanner {
    api: Arc<dyn GitHubApi>,
    identity: Arc<Mutex<IdentityResolver>>,
    organization: String,
    repository: String,
}

impl RepositoryScanner {
    pub fn new(
        api: Arc<dyn GitHubApi>,
        identity: Arc<Mutex<IdentityResolver>>,
        organization: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self {
            api,
            identity,
            organization: organization.into(),
            repository: repository.into(),
        }
    }

    /// Run the scan. The clone at `options.path` must already exist;
    /// git subprocess work runs on the blocking pool so concurrent
    /// scans of other repositories are not held up.
    pub async fn scan(&self, options: &ScanOptions) -> ScanResult<Vec<CommitEvent>> {
        let mut reconciler = CommitReconciler::new();
        self.collect_pull_request_events(&mut reconciler, options.reference_date)
            .await?;

        let options = options.clone();
        let identity = Arc::clone(&self.identity);
        let organization = self.organization.clone();
        let repository = self.repository.clone();
        let reconciler = tokio::task::spawn_blocking(move || -> ScanResult<CommitReconciler> {
            scan_local_history(
                &options,
                &organization,
                &repository,
                &identity,
                &mut reconciler,
            )?;
            Ok(reconciler)
        })
        .await??;

        Ok(reconciler.into_commits())
    }

    /// Pull requests updated since the reference date contribute their
    /// commit lists, their merge-commit hashes, and one review event
    /// per approval.
    async fn collect_pull_request_events(
        &self,
        reconciler: &mut CommitReconciler,
        reference_date: DateTime<Utc>,
    ) -> ScanResult<()> {
        let pulls = self
            .api
            .pull_requests(&self.organization, &self.repository, reference_date)
            .await?;
        log::debug!(
            "{}/{}: {} pull requests in range",
            self.organization,
            self.repository,
            pulls.len()
        );

        for pull in pulls {
            let commits = self
                .api
                .pull_request_commits(&self.organization, &self.repository, pull.number)
                .await?;

            let mut events = Vec::new();
            for commit in &commits {
                let Some(committer) = commit
                    .commit
                    .committer
                    .as_ref()
                    .or(commit.commit.author.as_ref())
                else {
                    continue;
                };
                // Identity resolves against the author's email even
                // though the event carries the committer's details
                let author_email = commit
                    .commit
                    .author
                    .as_ref()
                    .map(|author| author.email.clone())
                    .unwrap_or_default();
                let candidates = lock_identity(&self.identity)
                    .candidates(&author_email, &commit.commit.message);
                for username in candidates {
                    events.push(CommitEvent {
                        hash: commit.sha.clone(),
                        branch: pull.head.ref_name.clone(),
                        message: commit.commit.message.clone(),
                        username,
                        author_name: committer.name.clone(),
                        author_email: committer.email.clone(),
                        created_at: committer.date.fixed_offset(),
                        organization: self.organization.clone(),
                        repository: self.repository.clone(),
                        kind: CommitEventKind::Commit,
                        provenance: EventProvenance::PullRequest,
                        files_changed: 0,
                        added_lines: 0,
                        deleted_lines: 0,
                        diff: String::new(),
                    });
                }
            }
            reconciler.add_commits(events);

            // Unmerged pull requests have no merge commit to suppress
            // and their approvals attach to nothing
            let Some(merge_sha) = pull.merge_commit_sha.clone() else {
                continue;
            };
            reconciler.add_merge_commit(merge_sha.clone());

            let reviews = self
                .api
                .pull_request_reviews(&self.organization, &self.repository, pull.number)
                .await?;
            let review_events: Vec<CommitEvent> = reviews
                .into_iter()
                .filter_map(|review| {
                    if review.state != "APPROVED" {
                        return None;
                    }
                    let user = review.user?;
                    let submitted_at = review.submitted_at?;
                    Some(CommitEvent {
                        hash: merge_sha.clone(),
                        branch: pull.head.ref_name.clone(),
                        message: pull.title.clone(),
                        username: user.login.clone(),
                        author_name: user.login,
                        author_email: String::new(),
                        created_at: submitted_at.fixed_offset(),
                        organization: self.organization.clone(),
                        repository: self.repository.clone(),
                        kind: CommitEventKind::Review,
                        provenance: EventProvenance::PullRequest,
                        files_changed: 0,
                        added_lines: 0,
                        deleted_lines: 0,
                        diff: String::new(),
                    })
                })
                .collect();
            reconciler.add_commits(review_events);
        }
        Ok(())
    }
}

/// Fetch, reset, then walk every remote branch in order. Each branch
/// is checked out before its walk, so this must run one branch at a
/// time; the working tree is shared state.
fn scan_local_history(
    options: &ScanOptions,
    organization: &str,
    repository: &str,
    identity: &Mutex<IdentityResolver>,
    reconciler: &mut CommitReconciler,
) -> ScanResult<()> {
    git_ops::fetch_prune(&options.path, &options.ssh_key_path)?;
    git_ops::reset_hard(&options.path)?;
    git_ops::checkout(&options.path, &options.default_branch)?;

    for branch in history::remote_branches(&options.path)? {
        git_ops::checkout(&options.path, &branch)?;
        let label = branch.strip_prefix("origin/").unwrap_or(&branch);
        let commits = history::walk_head(&options.path, options.reference_date)?;
        log::debug!("{organization}/{repository}: {} commits on {label}", commits.len());

        let mut events = Vec::new();
        for commit in &commits {
            let candidates =
                lock_identity(identity).candidates(&commit.author_email, &commit.message);
            for username in candidates {
                events.push(branch_event(commit, username, label, organization, repository));
            }
        }
        reconciler.add_commits(events);
    }

    // Leave the clone on its default branch for the next run
    git_ops::checkout(&options.path, &options.default_branch)?;
    Ok(())
}

fn branch_event(
    commit: &RawCommit,
    username: String,
    branch: &str,
    organization: &str,
    repository: &str,
) -> CommitEvent {
    CommitEvent {
        hash: commit.hash.clone(),
        branch: branch.to_string(),
        message: commit.message.clone(),
        username,
        author_name: commit.author_name.clone(),
        author_email: commit.author_email.clone(),
        created_at: commit.created_at,
        organization: organization.to_string(),
        repository: repository.to_string(),
        kind: CommitEventKind::Commit,
        provenance: EventProvenance::BranchWalk,
        files_changed: commit.files_changed,
        added_lines: commit.added_lines,
        deleted_lines: commit.deleted_lines,
        diff: commit.diff.clone(),
    }
}

fn lock_identity(identity: &Mutex<IdentityResolver>) -> MutexGuard<'_, IdentityResolver> {
    identity.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
