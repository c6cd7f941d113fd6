//! GitHub API payload types
//!
//! Only the fields the synchronization engine reads are modelled; everything
//! else in the responses is ignored during deserialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An organization visible to the authenticated token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub login: String,
}

/// An organization member from the membership listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgMember {
    pub login: String,
}

/// A repository as returned by the org listing or the single-repo lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgRepository {
    pub id: u64,
    pub name: String,
    pub ssh_url: String,
    pub default_branch: String,
    /// Absent for repositories that have never been pushed to
    pub pushed_at: Option<DateTime<Utc>>,
}

/// Pull request summary from the list endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub updated_at: DateTime<Utc>,
    /// Null until the host has computed a merge commit for the PR
    pub merge_commit_sha: Option<String>,
    pub head: PrBranch,
}

/// The source branch side of a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrBranch {
    #[serde(rename = "ref")]
    pub ref_name: String,
}

/// A commit as listed on a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrCommit {
    pub sha: String,
    pub commit: PrCommitDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrCommitDetail {
    pub message: String,
    pub author: Option<GitIdentity>,
    pub committer: Option<GitIdentity>,
}

/// Name/email/date triple recorded in a git commit object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitIdentity {
    pub name: String,
    pub email: String,
    pub date: DateTime<Utc>,
}

/// A pull request review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrReview {
    pub state: String,
    /// Absent for reviews that were never submitted
    pub submitted_at: Option<DateTime<Utc>>,
    /// Null when the reviewing account has been deleted
    pub user: Option<ReviewUser>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewUser {
    pub login: String,
}

/// A repository deploy key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployKey {
    pub id: u64,
    pub title: String,
}

/// An organization webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgWebhook {
    pub id: u64,
    pub name: String,
    pub events: Vec<String>,
    pub active: bool,
}

/// Request payload for creating an organization webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookSpec {
    pub name: String,
    pub url: String,
    pub events: Vec<String>,
    pub secret: String,
}
