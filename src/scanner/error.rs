//! Scanner Error Types

use crate::github::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("`{command}` failed ({status}): {stderr}")]
    Subprocess {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GitHub API error: {0}")]
    Api(#[from] ApiError),

    #[error("Scan task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl crate::core::error_handling::ContextualError for ScanError {
    fn is_user_actionable(&self) -> bool {
        // Scanner failures are system/Git issues, not config mistakes
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

pub type ScanResult<T> = Result<T, ScanError>;
