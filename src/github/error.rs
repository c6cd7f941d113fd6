//! GitHub API error types

use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors from the remote API layer. Transient-failure retry and rate-limit
/// handling are deliberately not done here; callers decide what is fatal.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("GitHub API error: {0}")]
    Request(#[from] octocrab::Error),

    #[error("unexpected status {status} from {operation}")]
    UnexpectedStatus { operation: String, status: u16 },
}
