//! Commit persistence contract
//!
//! Durable storage is a deployment concern; the engine only needs hash
//! lookups, inserts and the two analysis write-backs. The bundled
//! [`memory::MemoryStore`] satisfies the contract in-process.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;

use crate::analyzer::ScoreAggregate;

pub mod memory;

pub use memory::MemoryStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("commit store operation failed: {message}")]
    OperationFailed { message: String },

    #[error("no commit with id {id}")]
    MissingCommit { id: i64 },
}

/// Analysis lifecycle of a stored commit
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    #[default]
    Pending,
    Queued,
    Done,
    Error,
}

/// A commit event ready to be persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCommit {
    pub commit_hash: String,
    /// Resolved username; empty when attribution failed
    pub user_name: String,
    pub project: String,
    pub organization: String,
    pub repository_id: u64,
    pub commit_message: String,
    pub timestamp: DateTime<FixedOffset>,
    /// Author UTC offset rendered as "+HH:MM"
    pub timezone_offset: String,
    pub file_changes: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
}

/// A persisted commit with its analysis state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub id: i64,
    pub commit_hash: String,
    pub user_name: String,
    pub project: String,
    pub organization: String,
    pub repository_id: u64,
    pub commit_message: String,
    pub timestamp: DateTime<FixedOffset>,
    pub timezone_offset: String,
    pub file_changes: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub analyze_status: AnalysisStatus,
    pub scores: Option<ScoreAggregate>,
}

impl CommitRecord {
    pub fn from_new(id: i64, commit: NewCommit) -> Self {
        Self {
            id,
            commit_hash: commit.commit_hash,
            user_name: commit.user_name,
            project: commit.project,
            organization: commit.organization,
            repository_id: commit.repository_id,
            commit_message: commit.commit_message,
            timestamp: commit.timestamp,
            timezone_offset: commit.timezone_offset,
            file_changes: commit.file_changes,
            lines_added: commit.lines_added,
            lines_deleted: commit.lines_deleted,
            analyze_status: AnalysisStatus::Pending,
            scores: None,
        }
    }
}

/// Commit persistence as the orchestrator and the queue worker see it.
///
/// Commits are unique by hash; `create_commit` is only called after a
/// `commit_by_hash` miss, so a second identity candidate for an already
/// persisted hash leaves the first record in place.
#[async_trait]
pub trait CommitStore: Send + Sync {
    async fn commit_by_hash(&self, hash: &str) -> StoreResult<Option<CommitRecord>>;

    async fn commit_by_id(&self, id: i64) -> StoreResult<Option<CommitRecord>>;

    /// Persist a new commit and return its id.
    async fn create_commit(&self, commit: NewCommit) -> StoreResult<i64>;

    async fn update_commit_scores(&self, id: i64, scores: &ScoreAggregate) -> StoreResult<()>;

    async fn update_analyze_status(&self, id: i64, status: AnalysisStatus) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_round_trips_as_lowercase() {
        assert_eq!(AnalysisStatus::Queued.to_string(), "queued");
        assert_eq!(AnalysisStatus::Done.to_string(), "done");
        assert_eq!(
            AnalysisStatus::from_str("error").unwrap(),
            AnalysisStatus::Error
        );
        assert!(AnalysisStatus::from_str("finished").is_err());
    }

    #[test]
    fn test_new_record_starts_pending_and_unscored() {
        let commit = NewCommit {
            commit_hash: "abc".to_string(),
            user_name: "dev".to_string(),
            project: "engine".to_string(),
            organization: "acme".to_string(),
            repository_id: 7,
            commit_message: "initial".to_string(),
            timestamp: DateTime::parse_from_rfc3339("2025-06-02T10:00:00+02:00").unwrap(),
            timezone_offset: "+02:00".to_string(),
            file_changes: 1,
            lines_added: 3,
            lines_deleted: 0,
        };

        let record = CommitRecord::from_new(42, commit);
        assert_eq!(record.id, 42);
        assert_eq!(record.analyze_status, AnalysisStatus::Pending);
        assert!(record.scores.is_none());
        assert_eq!(record.timezone_offset, "+02:00");
    }
}
