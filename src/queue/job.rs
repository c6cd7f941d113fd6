//! Analysis Jobs
//!
//! One job per newly persisted commit. Jobs are transient: they carry
//! only the record id, the hash for logging, and the diff text the
//! analyzer needs - everything else is re-read from the store by the
//! worker.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisJob {
    /// Store id of the commit record
    pub id: i64,
    pub hash: String,
    /// Unified diff captured at scan time
    pub diff: String,
}

impl AnalysisJob {
    pub fn new(id: i64, hash: impl Into<String>, diff: impl Into<String>) -> Self {
        Self {
            id,
            hash: hash.into(),
            diff: diff.into(),
        }
    }

    /// Display name used in logs and metrics
    pub fn name(&self) -> String {
        format!("commit-#{}", self.id)
    }
}
