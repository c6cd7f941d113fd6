//! Organization Webhook Management
//!
//! Outbound: keeps exactly one webhook named [`WEBHOOK_NAME`] registered
//! per organization, created lazily with a fixed event set and the
//! shared secret. Inbound: verifies delivery signatures against that
//! secret and routes deliveries by event name, treating unknown event
//! types as forward-compatible no-ops.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use strum_macros::{Display, EnumString};

use crate::core::error_handling::ContextualError;
use crate::github::types::{OrgWebhook, WebhookSpec};
use crate::github::{ApiError, GitHubApi};

/// Name the host knows the hook by; lookups key on it
pub const WEBHOOK_NAME: &str = "web";

/// Events subscribed at creation
pub const WEBHOOK_EVENTS: [&str; 2] = ["push", "pull_request"];

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("GitHub API error: {0}")]
    Api(#[from] ApiError),

    #[error("Delivery signature did not verify")]
    InvalidSignature,
}

impl ContextualError for WebhookError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

pub type WebhookResult<T> = Result<T, WebhookError>;

/// Event types this engine subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum WebhookEventKind {
    Push,
    PullRequest,
}

/// What became of an inbound delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Recognized event type, routed
    Processed(WebhookEventKind),
    /// Unknown event type; accepted and dropped
    Ignored,
}

/// Provisions organization webhooks and handles their deliveries.
pub struct WebhookManager {
    api: Arc<dyn GitHubApi>,
    secret: String,
}

impl WebhookManager {
    pub fn new(api: Arc<dyn GitHubApi>, secret: impl Into<String>) -> Self {
        Self {
            api,
            secret: secret.into(),
        }
    }

    /// Return the organization's hook, creating it on first call.
    /// Lookup is by name, so repeated runs never register duplicates.
    pub async fn get_or_create(&self, org: &str, url: &str) -> WebhookResult<OrgWebhook> {
        let hooks = self.api.org_webhooks(org).await?;
        if let Some(hook) = hooks.into_iter().find(|hook| hook.name == WEBHOOK_NAME) {
            return Ok(hook);
        }

        log::info!("Registering {WEBHOOK_NAME} webhook for {org} at {url}");
        let spec = WebhookSpec {
            name: WEBHOOK_NAME.to_string(),
            url: url.to_string(),
            events: WEBHOOK_EVENTS.iter().map(|event| event.to_string()).collect(),
            secret: self.secret.clone(),
        };
        let created = self.api.create_org_webhook(org, spec).await?;
        Ok(created)
    }

    /// Check a delivery's `X-Hub-Signature-256` header against the
    /// shared secret. Comparison is constant-time.
    pub fn verify_signature(&self, payload: &[u8], signature_header: &str) -> bool {
        let Some(hex_digest) = signature_header.strip_prefix("sha256=") else {
            return false;
        };
        let Ok(digest) = hex::decode(hex_digest) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(self.secret.as_bytes()) else {
            return false;
        };
        mac.update(payload);
        mac.verify_slice(&digest).is_ok()
    }

    /// Verify and route one delivery.
    pub fn handle_delivery(
        &self,
        event_name: &str,
        payload: &[u8],
        signature_header: &str,
    ) -> WebhookResult<Disposition> {
        if !self.verify_signature(payload, signature_header) {
            log::warn!("Rejected {event_name} delivery with a bad signature");
            return Err(WebhookError::InvalidSignature);
        }
        Ok(self.route(event_name))
    }

    fn route(&self, event_name: &str) -> Disposition {
        match event_name.parse::<WebhookEventKind>() {
            Ok(kind) => {
                log::info!("Received {kind} delivery");
                Disposition::Processed(kind)
            }
            Err(_) => {
                log::debug!("Ignoring unrecognized {event_name} delivery");
                Disposition::Ignored
            }
        }
    }
}
