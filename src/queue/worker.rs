//! Job Processing
//!
//! A worker run loads the commit record, invokes the analyzer with the
//! job's diff, and writes the aggregated scores back. Every step is
//! idempotent, so at-least-once delivery (a job re-run after a crash)
//! converges on the same stored state.

use crate::analyzer::{AnalyzerError, CommitAnalyzer, CommitContext, ScoreAggregate};
use crate::store::{AnalysisStatus, CommitStore};

use super::error::{QueueError, QueueResult};
use super::job::AnalysisJob;

pub(super) async fn process_job(
    job: &AnalysisJob,
    store: &dyn CommitStore,
    analyzer: &dyn CommitAnalyzer,
) -> QueueResult<()> {
    let record = store
        .commit_by_id(job.id)
        .await?
        .ok_or(QueueError::MissingCommit { id: job.id })?;
    store
        .update_analyze_status(job.id, AnalysisStatus::Queued)
        .await?;

    let context = CommitContext {
        message: record.commit_message.clone(),
        author: record.user_name.clone(),
        files_changed: record.file_changes,
        lines_added: record.lines_added,
        lines_deleted: record.lines_deleted,
    };
    let scores = analyzer.analyze(&job.diff, &context).await?;
    // A model set that scored nothing is a failure, not a zero average
    let aggregate = ScoreAggregate::from_scores(scores).ok_or(AnalyzerError::EmptyScores)?;

    store.update_commit_scores(job.id, &aggregate).await?;
    store
        .update_analyze_status(job.id, AnalysisStatus::Done)
        .await?;
    Ok(())
}
