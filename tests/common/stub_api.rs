//! In-process hosting provider stand-in
//!
//! Pull-request data and membership are configured up front; deploy
//! keys and webhooks are mutable state, so tests can assert not just
//! what the engine read but how often it wrote to the host.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use repopulse::github::types::{
    DeployKey, GitIdentity, OrgRepository, OrgWebhook, Organization, PrBranch, PrCommit,
    PrCommitDetail, PrReview, PullRequest, ReviewUser, WebhookSpec,
};
use repopulse::github::{ApiResult, GitHubApi};

#[derive(Default)]
pub struct StubHost {
    pub organizations: Vec<Organization>,
    pub repositories: Vec<OrgRepository>,
    pub members: Vec<String>,
    pub pulls: Vec<PullRequest>,
    pub pull_commits: HashMap<u64, Vec<PrCommit>>,
    pub pull_reviews: HashMap<u64, Vec<PrReview>>,
    pub deploy_keys: Mutex<Vec<DeployKey>>,
    /// (title, key material) pairs, one per `create_deploy_key` call
    pub created_keys: Mutex<Vec<(String, String)>>,
    pub deleted_keys: Mutex<Vec<u64>>,
    pub webhooks: Mutex<Vec<OrgWebhook>>,
    pub created_webhooks: Mutex<Vec<WebhookSpec>>,
    pub next_id: AtomicU64,
}

impl StubHost {
    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// A merged pull request whose merge commit is `merge_sha`.
pub fn merged_pull(
    number: u64,
    title: &str,
    branch: &str,
    merge_sha: &str,
    updated_at: DateTime<Utc>,
) -> PullRequest {
    PullRequest {
        number,
        title: title.to_string(),
        state: "closed".to_string(),
        updated_at,
        merge_commit_sha: Some(merge_sha.to_string()),
        head: PrBranch {
            ref_name: branch.to_string(),
        },
    }
}

/// A pull request commit authored by `email`.
pub fn pull_commit(sha: &str, message: &str, email: &str, date: DateTime<Utc>) -> PrCommit {
    PrCommit {
        sha: sha.to_string(),
        commit: PrCommitDetail {
            message: message.to_string(),
            author: Some(GitIdentity {
                name: "Casey Doe".to_string(),
                email: email.to_string(),
                date,
            }),
            committer: Some(GitIdentity {
                name: "GitHub".to_string(),
                email: "noreply@github.com".to_string(),
                date,
            }),
        },
    }
}

pub fn approved_review(login: &str, submitted_at: DateTime<Utc>) -> PrReview {
    PrReview {
        state: "APPROVED".to_string(),
        submitted_at: Some(submitted_at),
        user: Some(ReviewUser {
            login: login.to_string(),
        }),
    }
}

#[async_trait]
impl GitHubApi for StubHost {
    async fn organizations(&self) -> ApiResult<Vec<Organization>> {
        Ok(self.organizations.clone())
    }

    async fn repositories(
        &self,
        _org: &str,
        pushed_since: DateTime<Utc>,
    ) -> ApiResult<Vec<OrgRepository>> {
        Ok(self
            .repositories
            .iter()
            .filter(|repo| repo.pushed_at.is_some_and(|pushed| pushed >= pushed_since))
            .cloned()
            .collect())
    }

    async fn repository(&self, _org: &str, name: &str) -> ApiResult<OrgRepository> {
        Ok(self
            .repositories
            .iter()
            .find(|repo| repo.name == name)
            .cloned()
            .expect("repository not configured on StubHost"))
    }

    async fn pull_requests(
        &self,
        _org: &str,
        _repo: &str,
        updated_since: DateTime<Utc>,
    ) -> ApiResult<Vec<PullRequest>> {
        Ok(self
            .pulls
            .iter()
            .filter(|pull| pull.updated_at >= updated_since)
            .cloned()
            .collect())
    }

    async fn pull_request_commits(
        &self,
        _org: &str,
        _repo: &str,
        number: u64,
    ) -> ApiResult<Vec<PrCommit>> {
        Ok(self.pull_commits.get(&number).cloned().unwrap_or_default())
    }

    async fn pull_request_reviews(
        &self,
        _org: &str,
        _repo: &str,
        number: u64,
    ) -> ApiResult<Vec<PrReview>> {
        Ok(self.pull_reviews.get(&number).cloned().unwrap_or_default())
    }

    async fn members(&self, _org: &str) -> ApiResult<Vec<String>> {
        Ok(self.members.clone())
    }

    async fn deploy_keys(&self, _org: &str, _repo: &str) -> ApiResult<Vec<DeployKey>> {
        Ok(self.deploy_keys.lock().unwrap().clone())
    }

    async fn create_deploy_key(
        &self,
        _org: &str,
        _repo: &str,
        title: &str,
        key: &str,
    ) -> ApiResult<DeployKey> {
        self.created_keys
            .lock()
            .unwrap()
            .push((title.to_string(), key.to_string()));
        let created = DeployKey {
            id: self.next_id(),
            title: title.to_string(),
        };
        self.deploy_keys.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn delete_deploy_key(&self, _org: &str, _repo: &str, key_id: u64) -> ApiResult<()> {
        self.deleted_keys.lock().unwrap().push(key_id);
        self.deploy_keys.lock().unwrap().retain(|key| key.id != key_id);
        Ok(())
    }

    async fn org_webhooks(&self, _org: &str) -> ApiResult<Vec<OrgWebhook>> {
        Ok(self.webhooks.lock().unwrap().clone())
    }

    async fn create_org_webhook(&self, _org: &str, spec: WebhookSpec) -> ApiResult<OrgWebhook> {
        let created = OrgWebhook {
            id: self.next_id(),
            name: spec.name.clone(),
            events: spec.events.clone(),
            active: true,
        };
        self.created_webhooks.lock().unwrap().push(spec);
        self.webhooks.lock().unwrap().push(created.clone());
        Ok(created)
    }
}
