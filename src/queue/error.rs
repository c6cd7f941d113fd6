//! Queue Error Types

use crate::analyzer::AnalyzerError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Commit {id} is not in the store")]
    MissingCommit { id: i64 },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Analyzer error: {0}")]
    Analyzer(#[from] AnalyzerError),
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;
