//! octocrab-backed host client
//!
//! Thin wrapper over the REST endpoints the engine needs. The date-bounded
//! listings lean on the host sorting descending and are cut off by
//! [`super::pagination::fetch_pages`]; everything else is a one-page read or
//! a single mutation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use serde_json::json;

use super::api::GitHubApi;
use super::error::{ApiError, ApiResult};
use super::pagination::{fetch_pages, PER_PAGE};
use super::types::{
    DeployKey, Organization, OrgMember, OrgRepository, OrgWebhook, PrCommit, PrReview,
    PullRequest, WebhookSpec,
};

pub struct GitHubClient {
    client: Octocrab,
}

impl GitHubClient {
    /// Build a client authenticated with a personal access token.
    pub fn new(token: &str) -> ApiResult<Self> {
        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an already-configured octocrab instance.
    pub fn from_octocrab(client: Octocrab) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn organizations(&self) -> ApiResult<Vec<Organization>> {
        let orgs: Vec<Organization> = self
            .client
            .get("/user/orgs", Some(&[("per_page", PER_PAGE.to_string())]))
            .await?;
        Ok(orgs)
    }

    async fn repositories(
        &self,
        org: &str,
        pushed_since: DateTime<Utc>,
    ) -> ApiResult<Vec<OrgRepository>> {
        let route = format!("/orgs/{}/repos", org);
        fetch_pages(
            |page| {
                let route = route.clone();
                let params = [
                    ("type", "all".to_string()),
                    ("sort", "pushed".to_string()),
                    ("direction", "desc".to_string()),
                    ("per_page", PER_PAGE.to_string()),
                    ("page", page.to_string()),
                ];
                async move {
                    let batch: Vec<OrgRepository> = self.client.get(route, Some(&params)).await?;
                    Ok(batch)
                }
            },
            |repo: &OrgRepository| repo.pushed_at.is_some_and(|pushed| pushed >= pushed_since),
        )
        .await
    }

    async fn repository(&self, org: &str, name: &str) -> ApiResult<OrgRepository> {
        let repo: OrgRepository = self
            .client
            .get(format!("/repos/{}/{}", org, name), None::<&()>)
            .await?;
        Ok(repo)
    }

    async fn pull_requests(
        &self,
        org: &str,
        repo: &str,
        updated_since: DateTime<Utc>,
    ) -> ApiResult<Vec<PullRequest>> {
        let route = format!("/repos/{}/{}/pulls", org, repo);
        fetch_pages(
            |page| {
                let route = route.clone();
                let params = [
                    ("state", "all".to_string()),
                    ("sort", "updated".to_string()),
                    ("direction", "desc".to_string()),
                    ("per_page", PER_PAGE.to_string()),
                    ("page", page.to_string()),
                ];
                async move {
                    let batch: Vec<PullRequest> = self.client.get(route, Some(&params)).await?;
                    Ok(batch)
                }
            },
            |pr: &PullRequest| pr.updated_at >= updated_since,
        )
        .await
    }

    async fn pull_request_commits(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> ApiResult<Vec<PrCommit>> {
        let route = format!("/repos/{}/{}/pulls/{}/commits", org, repo, number);
        fetch_pages(
            |page| {
                let route = route.clone();
                let params = [
                    ("per_page", PER_PAGE.to_string()),
                    ("page", page.to_string()),
                ];
                async move {
                    let batch: Vec<PrCommit> = self.client.get(route, Some(&params)).await?;
                    Ok(batch)
                }
            },
            |_| true,
        )
        .await
    }

    async fn pull_request_reviews(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> ApiResult<Vec<PrReview>> {
        let reviews: Vec<PrReview> = self
            .client
            .get(
                format!("/repos/{}/{}/pulls/{}/reviews", org, repo, number),
                None::<&()>,
            )
            .await?;
        Ok(reviews)
    }

    async fn members(&self, org: &str) -> ApiResult<Vec<String>> {
        let members: Vec<OrgMember> = self
            .client
            .get(
                format!("/orgs/{}/members", org),
                Some(&[("per_page", PER_PAGE.to_string())]),
            )
            .await?;
        Ok(members.into_iter().map(|member| member.login).collect())
    }

    async fn deploy_keys(&self, org: &str, repo: &str) -> ApiResult<Vec<DeployKey>> {
        let keys: Vec<DeployKey> = self
            .client
            .get(
                format!("/repos/{}/{}/keys", org, repo),
                Some(&[("per_page", PER_PAGE.to_string())]),
            )
            .await?;
        Ok(keys)
    }

    async fn create_deploy_key(
        &self,
        org: &str,
        repo: &str,
        title: &str,
        key: &str,
    ) -> ApiResult<DeployKey> {
        let body = json!({
            "title": title,
            "key": key,
            "read_only": true,
        });
        let created: DeployKey = self
            .client
            .post(format!("/repos/{}/{}/keys", org, repo), Some(&body))
            .await?;
        Ok(created)
    }

    async fn delete_deploy_key(&self, org: &str, repo: &str, key_id: u64) -> ApiResult<()> {
        let route = format!("/repos/{}/{}/keys/{}", org, repo, key_id);
        let response = self.client._delete(route, None::<&()>).await?;
        if !response.status().is_success() {
            return Err(ApiError::UnexpectedStatus {
                operation: format!("deleting deploy key {} from {}/{}", key_id, org, repo),
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }

    async fn org_webhooks(&self, org: &str) -> ApiResult<Vec<OrgWebhook>> {
        let hooks: Vec<OrgWebhook> = self
            .client
            .get(format!("/orgs/{}/hooks", org), None::<&()>)
            .await?;
        Ok(hooks)
    }

    async fn create_org_webhook(&self, org: &str, spec: WebhookSpec) -> ApiResult<OrgWebhook> {
        let body = json!({
            "name": spec.name,
            "active": true,
            "events": spec.events,
            "config": {
                "url": spec.url,
                "content_type": "json",
                "secret": spec.secret,
            },
        });
        let created: OrgWebhook = self
            .client
            .post(format!("/orgs/{}/hooks", org), Some(&body))
            .await?;
        Ok(created)
    }
}
