//! Commit analysis contract
//!
//! The scoring engine itself lives outside this process; the queue worker
//! only needs a call that turns a diff plus commit context into per-model
//! scores, and the arithmetic that folds those into one aggregate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod command;

pub use command::CommandAnalyzer;

pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("analyzer invocation failed: {message}")]
    Invocation { message: String },

    #[error("analyzer produced unusable output: {message}")]
    Output { message: String },

    #[error("analyzer returned no model scores")]
    EmptyScores,
}

/// Context handed to the analyzer along with the diff text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitContext {
    pub message: String,
    pub author: String,
    pub files_changed: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
}

/// One model's verdict on a commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelScore {
    pub model_name: String,
    pub provider: String,
    /// Code quality, 1-5
    pub code_quality: f64,
    /// Developer level, 1-3
    pub dev_level: f64,
    /// Change complexity, 1-5
    pub complexity: f64,
    pub estimated_hours: f64,
    pub estimated_hours_with_ai: f64,
    pub ai_percentage: f64,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub tokens_used: u64,
    #[serde(default)]
    pub cost: f64,
}

/// Averages plus cost/token totals across every model that scored a commit,
/// with the raw per-model scores kept alongside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreAggregate {
    pub avg_quality: f64,
    pub avg_dev_level: f64,
    pub avg_complexity: f64,
    pub avg_hours: f64,
    pub avg_hours_with_ai: f64,
    pub avg_ai_percentage: f64,
    pub total_cost: f64,
    pub total_tokens: u64,
    pub scores: Vec<ModelScore>,
}

impl ScoreAggregate {
    /// None when no model produced a score; averaging nothing is not a result.
    pub fn from_scores(scores: Vec<ModelScore>) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }
        let count = scores.len() as f64;

        Some(Self {
            avg_quality: scores.iter().map(|s| s.code_quality).sum::<f64>() / count,
            avg_dev_level: scores.iter().map(|s| s.dev_level).sum::<f64>() / count,
            avg_complexity: scores.iter().map(|s| s.complexity).sum::<f64>() / count,
            avg_hours: scores.iter().map(|s| s.estimated_hours).sum::<f64>() / count,
            avg_hours_with_ai: scores.iter().map(|s| s.estimated_hours_with_ai).sum::<f64>()
                / count,
            avg_ai_percentage: scores.iter().map(|s| s.ai_percentage).sum::<f64>() / count,
            total_cost: scores.iter().map(|s| s.cost).sum::<f64>(),
            total_tokens: scores.iter().map(|s| s.tokens_used).sum::<u64>(),
            scores,
        })
    }
}

/// External analyzer reached by the queue worker.
#[async_trait]
pub trait CommitAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        diff: &str,
        context: &CommitContext,
    ) -> AnalyzerResult<Vec<ModelScore>>;
}
