//! Repository Synchronization Orchestrator
//!
//! Ties the per-repository pipeline together: deploy key, local clone,
//! scan, persistence, analysis enqueue. One `sync_repository` call is
//! one self-contained run; the app layer fans repositories out under a
//! bounded task set.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::core::error_handling::ContextualError;
use crate::github::types::OrgRepository;
use crate::github::GitHubApi;
use crate::keys::{DeployKeyManager, KeyError};
use crate::queue::{AnalysisJob, AnalysisQueue};
use crate::scanner::{
    clone_repository, CommitEvent, IdentityResolver, RepositoryScanner, ScanError, ScanOptions,
};
use crate::store::{CommitStore, NewCommit, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("Deploy key error: {0}")]
    Key(#[from] KeyError),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sync task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ContextualError for OrchestratorError {
    fn is_user_actionable(&self) -> bool {
        match self {
            Self::Key(error) => error.is_user_actionable(),
            Self::Scan(error) => error.is_user_actionable(),
            _ => false,
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            Self::Key(error) => error.user_message(),
            Self::Scan(error) => error.user_message(),
            _ => None,
        }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// Outcome counts for one repository synchronization run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanSummary {
    /// Events the scanner retained after reconciliation
    pub discovered: usize,
    /// Commit records created this run
    pub created: usize,
    /// Analysis jobs queued this run
    pub enqueued: usize,
}

/// Runs the synchronization pipeline for individual repositories.
///
/// All collaborators are injected; the orchestrator itself holds no
/// per-organization state, so one instance serves every repository the
/// app discovers.
pub struct ScanOrchestrator {
    api: Arc<dyn GitHubApi>,
    store: Arc<dyn CommitStore>,
    queue: AnalysisQueue,
    keys: DeployKeyManager,
    clone_root: PathBuf,
    reference_date: DateTime<Utc>,
}

impl ScanOrchestrator {
    pub fn new(
        api: Arc<dyn GitHubApi>,
        store: Arc<dyn CommitStore>,
        queue: AnalysisQueue,
        keys: DeployKeyManager,
        clone_root: impl Into<PathBuf>,
        reference_date: DateTime<Utc>,
    ) -> Self {
        Self {
            api,
            store,
            queue,
            keys,
            clone_root: clone_root.into(),
            reference_date,
        }
    }

    /// Synchronize one repository end to end.
    ///
    /// Provisions the deploy key, ensures a local clone, scans history,
    /// persists events whose hash is not yet stored and queues one
    /// analysis job per newly created record. Events already persisted
    /// by an earlier run are left untouched, which is what makes
    /// repeated runs over the same window idempotent.
    pub async fn sync_repository(
        &self,
        organization: &str,
        repository: &OrgRepository,
        identity: Arc<Mutex<IdentityResolver>>,
    ) -> OrchestratorResult<ScanSummary> {
        let key_path = self
            .keys
            .find_or_create(organization, &repository.name)
            .await?;
        let clone_path = self.ensure_clone(organization, repository, &key_path).await?;

        let scanner = RepositoryScanner::new(
            Arc::clone(&self.api),
            identity,
            organization,
            &repository.name,
        );
        let options = ScanOptions {
            path: clone_path,
            default_branch: repository.default_branch.clone(),
            ssh_key_path: key_path,
            reference_date: self.reference_date,
        };
        let events = scanner.scan(&options).await?;

        let mut summary = ScanSummary {
            discovered: events.len(),
            ..ScanSummary::default()
        };
        for event in events {
            if self.store.commit_by_hash(&event.hash).await?.is_some() {
                continue;
            }
            let record = new_commit(repository, &event);
            let id = self.store.create_commit(record).await?;
            summary.created += 1;
            self.queue.add(AnalysisJob::new(id, event.hash, event.diff));
            summary.enqueued += 1;
        }
        log::info!(
            "{}/{}: {} events retained, {} commits created, {} jobs queued",
            organization,
            repository.name,
            summary.discovered,
            summary.created,
            summary.enqueued
        );
        Ok(summary)
    }

    /// Path of the working clone for this repository.
    pub fn clone_path(&self, organization: &str, repository: &str) -> PathBuf {
        self.clone_root.join(organization).join(repository)
    }

    async fn ensure_clone(
        &self,
        organization: &str,
        repository: &OrgRepository,
        key_path: &Path,
    ) -> OrchestratorResult<PathBuf> {
        let path = self.clone_path(organization, &repository.name);
        // A bare existence check would treat an interrupted clone's
        // leftovers as a working repository.
        if path.join(".git").exists() {
            log::debug!("reusing clone at {}", path.display());
            return Ok(path);
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        log::info!("cloning {} into {}", repository.ssh_url, path.display());
        let url = repository.ssh_url.clone();
        let dest = path.clone();
        let key = key_path.to_path_buf();
        tokio::task::spawn_blocking(move || clone_repository(&url, &dest, &key)).await??;
        Ok(path)
    }
}

fn new_commit(repository: &OrgRepository, event: &CommitEvent) -> NewCommit {
    NewCommit {
        commit_hash: event.hash.clone(),
        user_name: event.username.clone(),
        project: event.repository.clone(),
        organization: event.organization.clone(),
        repository_id: repository.id,
        commit_message: event.message.clone(),
        timestamp: event.created_at,
        timezone_offset: event.timezone_offset(),
        file_changes: event.files_changed,
        lines_added: event.added_lines,
        lines_deleted: event.deleted_lines,
    }
}
