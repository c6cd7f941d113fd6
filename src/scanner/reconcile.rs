//! Commit Reconciliation
//!
//! Deduplicates commit events collected from independent sources: the
//! branch walk, pull-request commit lists, and pull-request approval
//! reviews. Hash equality alone is not enough because squashed or
//! rebased pull requests re-surface the same logical change under new
//! hashes, so duplicates are detected by a compound message + hash +
//! username check.

use std::collections::HashSet;

use super::types::{CommitEvent, CommitEventKind};

/// Accumulates commit events in source order and drops duplicates.
///
/// Callers feed pull-request-derived events before the raw branch walk
/// so pull-request provenance wins ties.
#[derive(Debug, Default)]
pub struct CommitReconciler {
    seen_hashes: HashSet<String>,
    seen_messages: HashSet<String>,
    merge_hashes: HashSet<String>,
    retained: Vec<CommitEvent>,
}

impl CommitReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pull request's merge-commit hash. Raw commits with a
    /// registered hash are dropped unconditionally; the pull request's
    /// own commit list already represents them.
    pub fn add_merge_commit(&mut self, hash: impl Into<String>) {
        self.merge_hashes.insert(hash.into());
    }

    /// Feed a batch of events, retaining those that survive the
    /// duplicate rules.
    pub fn add_commits(&mut self, events: Vec<CommitEvent>) {
        for event in events {
            self.add_commit(event);
        }
    }

    fn add_commit(&mut self, event: CommitEvent) {
        // Reviews are synthetic and never collide with real commits
        if event.kind == CommitEventKind::Review {
            self.seen_hashes.insert(event.hash.clone());
            self.retained.push(event);
            return;
        }

        if self.merge_hashes.contains(&event.hash) {
            return;
        }

        if self.is_duplicate(&event) {
            return;
        }

        self.seen_messages.insert(event.message.clone());
        self.seen_hashes.insert(event.hash.clone());
        self.retained.push(event);
    }

    /// Compound duplicate rule: a known message must contain this
    /// event's message, the hash must already be seen, and the first
    /// retained event with that hash must carry the same resolved
    /// username. Unresolved (empty) usernames never match each other,
    /// so unattributed commits are not deduplicated against one
    /// another.
    fn is_duplicate(&self, event: &CommitEvent) -> bool {
        if !self.seen_hashes.contains(&event.hash) {
            return false;
        }
        if !self
            .seen_messages
            .iter()
            .any(|known| known.contains(&event.message))
        {
            return false;
        }
        self.retained
            .iter()
            .find(|prior| prior.hash == event.hash)
            .is_some_and(|prior| same_username(&prior.username, &event.username))
    }

    /// Retained events in insertion order
    pub fn commits(&self) -> &[CommitEvent] {
        &self.retained
    }

    /// Consume the reconciler and yield the deduplicated list
    pub fn into_commits(self) -> Vec<CommitEvent> {
        self.retained
    }
}

fn same_username(a: &str, b: &str) -> bool {
    !a.is_empty() && a == b
}
