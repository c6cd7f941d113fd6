//! AnalysisQueue - bounded-concurrency job dispatch
//!
//! The queue holds pending analysis jobs and a dispatcher task feeds
//! them to workers under a global concurrency ceiling, protecting the
//! external analyzer from unbounded parallel fan-out. Pausing gates
//! dispatch of new jobs; jobs already running finish normally.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{broadcast, watch, Notify, Semaphore};
use tokio::task::JoinHandle;

use crate::analyzer::CommitAnalyzer;
use crate::store::{AnalysisStatus, CommitStore};

use super::job::AnalysisJob;
use super::worker;

/// Queue name used in logs and metrics
pub const QUEUE_NAME: &str = "analysis";

/// Point-in-time queue counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMetrics {
    /// Jobs waiting for dispatch
    pub waiting: usize,
    /// Jobs currently running
    pub active: usize,
    pub completed: usize,
    pub failed: usize,
    pub paused: bool,
}

/// Shared analysis job queue.
///
/// `add` is cheap and synchronous; workers run on the task spawned by
/// [`AnalysisQueue::start`]. Clone-by-`Arc`: every handle sees the same
/// queue.
pub struct AnalysisQueue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    jobs: Mutex<VecDeque<AnalysisJob>>,
    wakeup: Notify,
    paused: AtomicBool,
    concurrency: usize,
    active: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
    /// Jobs added but not yet finished, watched by `drain`
    outstanding: watch::Sender<usize>,
}

impl AnalysisQueue {
    pub fn new(concurrency: usize) -> Self {
        let (outstanding, _) = watch::channel(0);
        Self {
            inner: Arc::new(QueueInner {
                jobs: Mutex::new(VecDeque::new()),
                wakeup: Notify::new(),
                paused: AtomicBool::new(false),
                concurrency: concurrency.max(1),
                active: AtomicUsize::new(0),
                completed: AtomicUsize::new(0),
                failed: AtomicUsize::new(0),
                outstanding,
            }),
        }
    }

    /// Enqueue one job.
    pub fn add(&self, job: AnalysisJob) {
        log::debug!("{QUEUE_NAME}: queued {}", job.name());
        self.inner.outstanding.send_modify(|count| *count += 1);
        self.inner.lock_jobs().push_back(job);
        self.inner.wakeup.notify_one();
    }

    /// Stop dispatching new jobs. Running jobs are unaffected.
    pub fn pause(&self) {
        self.inner.paused.store(true, Ordering::SeqCst);
        log::info!("{QUEUE_NAME}: paused");
    }

    /// Resume dispatch.
    pub fn resume(&self) {
        self.inner.paused.store(false, Ordering::SeqCst);
        log::info!("{QUEUE_NAME}: resumed");
        self.inner.wakeup.notify_one();
    }

    pub fn metrics(&self) -> QueueMetrics {
        QueueMetrics {
            waiting: self.inner.lock_jobs().len(),
            active: self.inner.active.load(Ordering::SeqCst),
            completed: self.inner.completed.load(Ordering::SeqCst),
            failed: self.inner.failed.load(Ordering::SeqCst),
            paused: self.inner.paused.load(Ordering::SeqCst),
        }
    }

    /// Wait until every job added so far has finished. Callers that
    /// must not wait forever race this against shutdown.
    pub async fn drain(&self) {
        let mut outstanding = self.inner.outstanding.subscribe();
        loop {
            if *outstanding.borrow_and_update() == 0 {
                return;
            }
            if outstanding.changed().await.is_err() {
                return;
            }
        }
    }

    /// Spawn the dispatcher task. It pulls pending jobs whenever
    /// capacity is free and stops when `shutdown_rx` fires; jobs
    /// already handed to workers run to completion.
    pub fn start(
        &self,
        store: Arc<dyn CommitStore>,
        analyzer: Arc<dyn CommitAnalyzer>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let capacity = Arc::new(Semaphore::new(inner.concurrency));
            log::info!(
                "{QUEUE_NAME}: dispatcher started (concurrency {})",
                inner.concurrency
            );
            loop {
                while let Some(job) = inner.take_job() {
                    let permit = match Arc::clone(&capacity).acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => return,
                    };
                    let inner = Arc::clone(&inner);
                    let store = Arc::clone(&store);
                    let analyzer = Arc::clone(&analyzer);
                    tokio::spawn(async move {
                        let _permit = permit;
                        run_job(&inner, store, analyzer, job).await;
                    });
                }

                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        log::info!("{QUEUE_NAME}: dispatcher stopping");
                        return;
                    }
                    _ = inner.wakeup.notified() => {}
                }
            }
        })
    }
}

impl Clone for AnalysisQueue {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl QueueInner {
    fn lock_jobs(&self) -> MutexGuard<'_, VecDeque<AnalysisJob>> {
        self.jobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn take_job(&self) -> Option<AnalysisJob> {
        if self.paused.load(Ordering::SeqCst) {
            return None;
        }
        self.lock_jobs().pop_front()
    }
}

async fn run_job(
    inner: &QueueInner,
    store: Arc<dyn CommitStore>,
    analyzer: Arc<dyn CommitAnalyzer>,
    job: AnalysisJob,
) {
    let name = job.name();
    inner.active.fetch_add(1, Ordering::SeqCst);
    let result = worker::process_job(&job, store.as_ref(), analyzer.as_ref()).await;
    inner.active.fetch_sub(1, Ordering::SeqCst);

    match result {
        Ok(()) => {
            inner.completed.fetch_add(1, Ordering::SeqCst);
            log::debug!("{QUEUE_NAME}: {name} done");
        }
        Err(error) => {
            inner.failed.fetch_add(1, Ordering::SeqCst);
            log::error!("{QUEUE_NAME}: {name} failed: {error}");
            if let Err(status_error) = store
                .update_analyze_status(job.id, AnalysisStatus::Error)
                .await
            {
                log::error!("{QUEUE_NAME}: {name}: could not record failure: {status_error}");
            }
        }
    }
    inner.outstanding.send_modify(|count| *count = count.saturating_sub(1));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{AnalyzerError, AnalyzerResult, CommitContext, ModelScore};
    use crate::core::shutdown::ShutdownCoordinator;
    use crate::store::{CommitStore, MemoryStore, NewCommit};
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::time::Duration;

    struct FixedAnalyzer {
        scores: Vec<ModelScore>,
        fail: bool,
    }

    #[async_trait]
    impl CommitAnalyzer for FixedAnalyzer {
        async fn analyze(
            &self,
            _diff: &str,
            _context: &CommitContext,
        ) -> AnalyzerResult<Vec<ModelScore>> {
            if self.fail {
                return Err(AnalyzerError::Invocation {
                    message: "analyzer exploded".to_string(),
                });
            }
            Ok(self.scores.clone())
        }
    }

    fn score(quality: f64) -> ModelScore {
        ModelScore {
            model_name: "test-model".to_string(),
            provider: "test".to_string(),
            code_quality: quality,
            dev_level: 2.0,
            complexity: 1.0,
            estimated_hours: 1.0,
            estimated_hours_with_ai: 0.5,
            ai_percentage: 10.0,
            reasoning: String::new(),
            tokens_used: 100,
            cost: 0.02,
        }
    }

    fn commit(hash: &str) -> NewCommit {
        NewCommit {
            commit_hash: hash.to_string(),
            user_name: "casey".to_string(),
            project: "widgets".to_string(),
            organization: "acme".to_string(),
            repository_id: 1,
            commit_message: "add login".to_string(),
            timestamp: DateTime::parse_from_rfc3339("2025-06-10T09:00:00+02:00").unwrap(),
            timezone_offset: "+02:00".to_string(),
            file_changes: 1,
            lines_added: 3,
            lines_deleted: 1,
        }
    }

    async fn drain_with_timeout(queue: &AnalysisQueue) {
        tokio::time::timeout(Duration::from_secs(5), queue.drain())
            .await
            .expect("queue did not drain in time");
    }

    #[tokio::test]
    async fn successful_job_stores_scores_and_marks_done() {
        let store = Arc::new(MemoryStore::new());
        let id = store.create_commit(commit("aaa")).await.unwrap();

        let queue = AnalysisQueue::new(2);
        let (shutdown, _shutdown_rx) = ShutdownCoordinator::new();
        let handle = queue.start(
            store.clone(),
            Arc::new(FixedAnalyzer {
                scores: vec![score(4.0), score(2.0)],
                fail: false,
            }),
            shutdown.subscribe(),
        );

        queue.add(AnalysisJob::new(id, "aaa", "diff"));
        drain_with_timeout(&queue).await;

        let record = store.commit_by_id(id).await.unwrap().unwrap();
        assert_eq!(record.analyze_status, AnalysisStatus::Done);
        let aggregate = record.scores.unwrap();
        assert!((aggregate.avg_quality - 3.0).abs() < f64::EPSILON);
        assert_eq!(aggregate.total_tokens, 200);

        let metrics = queue.metrics();
        assert_eq!(metrics.completed, 1);
        assert_eq!(metrics.failed, 0);
        assert_eq!(metrics.waiting, 0);

        shutdown.trigger_shutdown();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn analyzer_failure_marks_the_commit_errored() {
        let store = Arc::new(MemoryStore::new());
        let id = store.create_commit(commit("bbb")).await.unwrap();

        let queue = AnalysisQueue::new(1);
        let (shutdown, _shutdown_rx) = ShutdownCoordinator::new();
        let handle = queue.start(
            store.clone(),
            Arc::new(FixedAnalyzer {
                scores: Vec::new(),
                fail: true,
            }),
            shutdown.subscribe(),
        );

        queue.add(AnalysisJob::new(id, "bbb", "diff"));
        drain_with_timeout(&queue).await;

        let record = store.commit_by_id(id).await.unwrap().unwrap();
        assert_eq!(record.analyze_status, AnalysisStatus::Error);
        assert!(record.scores.is_none());
        assert_eq!(queue.metrics().failed, 1);

        shutdown.trigger_shutdown();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn empty_score_set_is_a_failure() {
        let store = Arc::new(MemoryStore::new());
        let id = store.create_commit(commit("ccc")).await.unwrap();

        let queue = AnalysisQueue::new(1);
        let (shutdown, _shutdown_rx) = ShutdownCoordinator::new();
        let handle = queue.start(
            store.clone(),
            Arc::new(FixedAnalyzer {
                scores: Vec::new(),
                fail: false,
            }),
            shutdown.subscribe(),
        );

        queue.add(AnalysisJob::new(id, "ccc", "diff"));
        drain_with_timeout(&queue).await;

        let record = store.commit_by_id(id).await.unwrap().unwrap();
        assert_eq!(record.analyze_status, AnalysisStatus::Error);
        assert_eq!(queue.metrics().failed, 1);

        shutdown.trigger_shutdown();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn job_for_unknown_commit_fails() {
        let store = Arc::new(MemoryStore::new());
        let queue = AnalysisQueue::new(1);
        let (shutdown, _shutdown_rx) = ShutdownCoordinator::new();
        let handle = queue.start(
            store.clone(),
            Arc::new(FixedAnalyzer {
                scores: vec![score(3.0)],
                fail: false,
            }),
            shutdown.subscribe(),
        );

        queue.add(AnalysisJob::new(999, "zzz", "diff"));
        drain_with_timeout(&queue).await;

        assert_eq!(queue.metrics().failed, 1);
        assert_eq!(queue.metrics().completed, 0);

        shutdown.trigger_shutdown();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn pause_gates_dispatch_until_resume() {
        let store = Arc::new(MemoryStore::new());
        let id = store.create_commit(commit("ddd")).await.unwrap();

        let queue = AnalysisQueue::new(1);
        let (shutdown, _shutdown_rx) = ShutdownCoordinator::new();
        let handle = queue.start(
            store.clone(),
            Arc::new(FixedAnalyzer {
                scores: vec![score(3.0)],
                fail: false,
            }),
            shutdown.subscribe(),
        );

        queue.pause();
        queue.add(AnalysisJob::new(id, "ddd", "diff"));
        tokio::time::sleep(Duration::from_millis(100)).await;

        let record = store.commit_by_id(id).await.unwrap().unwrap();
        assert_eq!(record.analyze_status, AnalysisStatus::Pending);
        let metrics = queue.metrics();
        assert_eq!(metrics.waiting, 1);
        assert!(metrics.paused);

        queue.resume();
        drain_with_timeout(&queue).await;
        let record = store.commit_by_id(id).await.unwrap().unwrap();
        assert_eq!(record.analyze_status, AnalysisStatus::Done);

        shutdown.trigger_shutdown();
        let _ = handle.await;
    }
}
