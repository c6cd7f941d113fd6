//! Remote host API trait
//!
//! Everything the engine asks of the hosting provider goes through this
//! trait; components receive it at construction time, which keeps scans,
//! key management and webhook provisioning testable against stub hosts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::ApiResult;
use super::types::{
    DeployKey, Organization, OrgRepository, OrgWebhook, PrCommit, PrReview, PullRequest,
    WebhookSpec,
};

#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Organizations visible to the authenticated token.
    async fn organizations(&self) -> ApiResult<Vec<Organization>>;

    /// Repositories of an organization pushed to since `pushed_since`,
    /// newest push first.
    async fn repositories(
        &self,
        org: &str,
        pushed_since: DateTime<Utc>,
    ) -> ApiResult<Vec<OrgRepository>>;

    /// Single repository lookup.
    async fn repository(&self, org: &str, name: &str) -> ApiResult<OrgRepository>;

    /// Pull requests (any state) updated since `updated_since`, most recently
    /// updated first.
    async fn pull_requests(
        &self,
        org: &str,
        repo: &str,
        updated_since: DateTime<Utc>,
    ) -> ApiResult<Vec<PullRequest>>;

    /// All commits on a pull request.
    async fn pull_request_commits(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> ApiResult<Vec<PrCommit>>;

    /// Reviews of a pull request.
    async fn pull_request_reviews(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> ApiResult<Vec<PrReview>>;

    /// Usernames of an organization's members.
    async fn members(&self, org: &str) -> ApiResult<Vec<String>>;

    /// Deploy keys registered on a repository.
    async fn deploy_keys(&self, org: &str, repo: &str) -> ApiResult<Vec<DeployKey>>;

    /// Register a read-only deploy key; Ok means the host created it.
    async fn create_deploy_key(
        &self,
        org: &str,
        repo: &str,
        title: &str,
        key: &str,
    ) -> ApiResult<DeployKey>;

    /// Remove a deploy key by id.
    async fn delete_deploy_key(&self, org: &str, repo: &str, key_id: u64) -> ApiResult<()>;

    /// Webhooks configured on an organization.
    async fn org_webhooks(&self, org: &str) -> ApiResult<Vec<OrgWebhook>>;

    /// Create an organization webhook; Ok means the host created it.
    async fn create_org_webhook(&self, org: &str, spec: WebhookSpec) -> ApiResult<OrgWebhook>;
}
