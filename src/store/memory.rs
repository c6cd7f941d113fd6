//! In-process commit store

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{AnalysisStatus, CommitRecord, CommitStore, NewCommit, StoreError, StoreResult};
use crate::analyzer::ScoreAggregate;

/// Hash-unique commit storage backed by plain maps. Useful for single runs
/// and tests; a durable deployment implements [`CommitStore`] instead.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    next_id: AtomicI64,
}

struct Inner {
    commits: BTreeMap<i64, CommitRecord>,
    by_hash: HashMap<String, i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                commits: BTreeMap::new(),
                by_hash: HashMap::new(),
            }),
            next_id: AtomicI64::new(1),
        }
    }

    /// Snapshot of every stored record, in id order.
    pub fn records(&self) -> Vec<CommitRecord> {
        self.lock().commits.values().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommitStore for MemoryStore {
    async fn commit_by_hash(&self, hash: &str) -> StoreResult<Option<CommitRecord>> {
        let inner = self.lock();
        Ok(inner
            .by_hash
            .get(hash)
            .and_then(|id| inner.commits.get(id))
            .cloned())
    }

    async fn commit_by_id(&self, id: i64) -> StoreResult<Option<CommitRecord>> {
        Ok(self.lock().commits.get(&id).cloned())
    }

    async fn create_commit(&self, commit: NewCommit) -> StoreResult<i64> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.lock();
        inner.by_hash.insert(commit.commit_hash.clone(), id);
        inner.commits.insert(id, CommitRecord::from_new(id, commit));
        Ok(id)
    }

    async fn update_commit_scores(&self, id: i64, scores: &ScoreAggregate) -> StoreResult<()> {
        let mut inner = self.lock();
        let record = inner
            .commits
            .get_mut(&id)
            .ok_or(StoreError::MissingCommit { id })?;
        record.scores = Some(scores.clone());
        Ok(())
    }

    async fn update_analyze_status(&self, id: i64, status: AnalysisStatus) -> StoreResult<()> {
        let mut inner = self.lock();
        let record = inner
            .commits
            .get_mut(&id)
            .ok_or(StoreError::MissingCommit { id })?;
        record.analyze_status = status;
        Ok(())
    }
}
