//! Configuration loading and validation
//!
//! Settings come from three layers applied in order: the TOML file
//! (explicit `--config-file` or `<config_dir>/repopulse/config.toml`),
//! environment variables for secrets, then CLI flags. Validation turns
//! the merged picture into an [`AppConfig`] whose fields are ready to
//! use; every rejection is a user-actionable [`ConfigError`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Deserialize;

use crate::core::error_handling::ContextualError;

use super::cli::Args;

/// Environment variable consulted for the API token
pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";
/// Environment variable consulted for the webhook secret
pub const WEBHOOK_SECRET_VAR: &str = "REPOPULSE_WEBHOOK_SECRET";

const DEFAULT_MAX_PARALLEL_REPOS: usize = 4;
const DEFAULT_QUEUE_CONCURRENCY: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be found, read or parsed
    #[error("{message}")]
    File { message: String },

    /// A required setting is missing or a value is unusable
    #[error("{message}")]
    Setting { message: String },
}

impl ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            Self::File { message } | Self::Setting { message } => Some(message),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Raw TOML file shape; every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub github: GithubSection,
    #[serde(default)]
    pub scan: ScanSection,
    #[serde(default)]
    pub keys: KeysSection,
    #[serde(default)]
    pub webhook: WebhookSection,
    #[serde(default)]
    pub queue: QueueSection,
    #[serde(default)]
    pub identity: IdentitySection,
    #[serde(default)]
    pub analyzer: AnalyzerSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubSection {
    pub token: Option<String>,
    #[serde(default)]
    pub organizations: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanSection {
    pub reference_date: Option<String>,
    pub clone_root: Option<PathBuf>,
    pub max_parallel_repos: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeysSection {
    pub storage_root: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookSection {
    pub secret: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueSection {
    pub concurrency: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentitySection {
    /// email address -> member username
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzerSection {
    /// Program followed by its fixed arguments
    #[serde(default)]
    pub command: Vec<String>,
}

impl FileConfig {
    /// Load the file at `explicit`, or the default location when it
    /// exists. No file at the default location is not an error; a
    /// missing explicit path is.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::File {
                        message: format!(
                            "configuration file does not exist: {}",
                            path.display()
                        ),
                    });
                }
                Some(path.to_path_buf())
            }
            None => dirs::config_dir()
                .map(|dir| dir.join("repopulse").join("config.toml"))
                .filter(|path| path.exists()),
        };
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = std::fs::read_to_string(&path).map_err(|error| ConfigError::File {
            message: format!("cannot read configuration file {}: {error}", path.display()),
        })?;
        toml::from_str(&contents).map_err(|error| ConfigError::File {
            message: format!(
                "configuration file {} is not valid TOML: {error}",
                path.display()
            ),
        })
    }
}

/// Webhook provisioning settings; present only when a URL is configured.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: String,
    pub secret: String,
}

/// Validated, merged configuration the rest of the app runs on.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub token: String,
    /// Explicit organization list; empty means discover via the API
    pub organizations: Vec<String>,
    /// Restricts the run to a single repository
    pub repository: Option<String>,
    pub reference_date: DateTime<Utc>,
    pub clone_root: PathBuf,
    pub max_parallel_repos: usize,
    pub key_storage_root: PathBuf,
    pub webhook: Option<WebhookConfig>,
    pub queue_concurrency: usize,
    pub aliases: BTreeMap<String, String>,
    pub analyzer_command: Vec<String>,
}

impl AppConfig {
    /// Load the configuration file, apply environment variables and CLI
    /// overrides, and validate the result.
    pub fn load(args: &Args) -> ConfigResult<Self> {
        let file = FileConfig::load(args.config_file.as_deref())?;
        Self::assemble(
            args,
            file,
            std::env::var(GITHUB_TOKEN_VAR).ok(),
            std::env::var(WEBHOOK_SECRET_VAR).ok(),
        )
    }

    fn assemble(
        args: &Args,
        file: FileConfig,
        env_token: Option<String>,
        env_secret: Option<String>,
    ) -> ConfigResult<Self> {
        let organizations = if args.organizations.is_empty() {
            file.github.organizations
        } else {
            args.organizations.clone()
        };

        if args.repository.is_some() && organizations.len() != 1 {
            return Err(ConfigError::Setting {
                message: "--repo requires exactly one --org".to_string(),
            });
        }

        let token = env_token
            .filter(|token| !token.is_empty())
            .or(file.github.token)
            .ok_or_else(|| ConfigError::Setting {
                message: format!(
                    "GitHub token missing: set the {GITHUB_TOKEN_VAR} environment variable \
                     or [github] token"
                ),
            })?;

        let reference_date = args
            .since
            .as_deref()
            .or(file.scan.reference_date.as_deref())
            .ok_or_else(|| ConfigError::Setting {
                message: "reference date missing: pass --since or set [scan] reference_date"
                    .to_string(),
            })?;
        let reference_date = parse_reference_date(reference_date)?;

        let clone_root = match file.scan.clone_root {
            Some(root) => root,
            None => dirs::cache_dir()
                .map(|dir| dir.join("repopulse").join("clones"))
                .ok_or_else(|| ConfigError::Setting {
                    message: "no cache directory on this system: set [scan] clone_root"
                        .to_string(),
                })?,
        };

        let key_storage_root = match file.keys.storage_root {
            Some(root) => root,
            None => dirs::data_local_dir()
                .map(|dir| dir.join("repopulse").join("keys"))
                .ok_or_else(|| ConfigError::Setting {
                    message: "no local data directory on this system: set [keys] storage_root"
                        .to_string(),
                })?,
        };

        let secret = env_secret
            .filter(|secret| !secret.is_empty())
            .or(file.webhook.secret);
        let webhook = match (file.webhook.url, secret) {
            (Some(url), Some(secret)) => Some(WebhookConfig { url, secret }),
            (Some(_), None) => {
                return Err(ConfigError::Setting {
                    message: format!(
                        "webhook url configured without a secret: set the \
                         {WEBHOOK_SECRET_VAR} environment variable or [webhook] secret"
                    ),
                })
            }
            (None, _) => None,
        };

        if file.analyzer.command.is_empty() {
            return Err(ConfigError::Setting {
                message: "analyzer command missing: set [analyzer] command".to_string(),
            });
        }

        Ok(Self {
            token,
            organizations,
            repository: args.repository.clone(),
            reference_date,
            clone_root,
            max_parallel_repos: file
                .scan
                .max_parallel_repos
                .unwrap_or(DEFAULT_MAX_PARALLEL_REPOS)
                .max(1),
            key_storage_root,
            webhook,
            queue_concurrency: args
                .queue_concurrency
                .or(file.queue.concurrency)
                .unwrap_or(DEFAULT_QUEUE_CONCURRENCY)
                .max(1),
            aliases: file.identity.aliases,
            analyzer_command: file.analyzer.command,
        })
    }
}

fn parse_reference_date(value: &str) -> ConfigResult<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Ok(date.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        // Midnight UTC; chrono guarantees 00:00:00 exists for any date
        if let Some(start) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&start));
        }
    }
    Err(ConfigError::Setting {
        message: format!(
            "cannot parse reference date '{value}': expected RFC 3339 or YYYY-MM-DD"
        ),
    })
}
