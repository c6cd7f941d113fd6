//! Deploy Key Management
//!
//! One read-only deploy key per (organization, repository), with the
//! remote API as the source of truth. Local key files live under a
//! configured storage root; if the two sides ever disagree the remote
//! copy is deleted and both are recreated together.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use crate::core::error_handling::ContextualError;
use crate::github::{ApiError, GitHubApi};

/// Title registered with the host, and the keypair comment
pub const DEPLOY_KEY_TITLE: &str = "repopulse-agent";

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("GitHub API error: {0}")]
    Api(#[from] ApiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Key generation failed ({status}): {stderr}")]
    Keygen { status: String, stderr: String },

    #[error("Key task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ContextualError for KeyError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

pub type KeyResult<T> = Result<T, KeyError>;

/// Provisions and repairs per-repository deploy keys.
pub struct DeployKeyManager {
    api: Arc<dyn GitHubApi>,
    storage_root: PathBuf,
    keygen_program: PathBuf,
}

impl DeployKeyManager {
    pub fn new(api: Arc<dyn GitHubApi>, storage_root: impl Into<PathBuf>) -> Self {
        Self {
            api,
            storage_root: storage_root.into(),
            keygen_program: PathBuf::from("ssh-keygen"),
        }
    }

    /// Substitute the key generation binary (tests use a script).
    pub fn with_keygen_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.keygen_program = program.into();
        self
    }

    /// Local path of the private key for this repository.
    pub fn key_path(&self, org: &str, repo: &str) -> PathBuf {
        self.storage_root.join(format!("repopulse-{org}-{repo}"))
    }

    /// Return a usable private-key path, creating or repairing the
    /// keypair as needed.
    ///
    /// Absent remotely: generate and register a fresh keypair. Present
    /// remotely with the local file intact: return the path untouched.
    /// Present remotely but missing locally: delete the remote key
    /// first, then recreate both sides, so the repository never ends up
    /// with two keys registered for the same purpose.
    pub async fn find_or_create(&self, org: &str, repo: &str) -> KeyResult<PathBuf> {
        let keys = self.api.deploy_keys(org, repo).await?;
        let existing = keys.iter().find(|key| key.title == DEPLOY_KEY_TITLE);
        let path = self.key_path(org, repo);

        match existing {
            None => {
                log::info!("Registering new deploy key for {org}/{repo}");
                self.create_key(org, repo, &path).await?;
            }
            Some(key) => {
                if tokio::fs::try_exists(&path).await? {
                    return Ok(path);
                }
                log::warn!(
                    "Deploy key for {org}/{repo} is registered remotely but {} is missing; recreating",
                    path.display()
                );
                self.api.delete_deploy_key(org, repo, key.id).await?;
                self.create_key(org, repo, &path).await?;
            }
        }
        Ok(path)
    }

    async fn create_key(&self, org: &str, repo: &str, path: &Path) -> KeyResult<()> {
        tokio::fs::create_dir_all(&self.storage_root).await?;
        self.generate_keypair(path).await?;
        let public_key = tokio::fs::read_to_string(public_key_path(path)).await?;
        self.api
            .create_deploy_key(org, repo, DEPLOY_KEY_TITLE, public_key.trim())
            .await?;
        Ok(())
    }

    async fn generate_keypair(&self, path: &Path) -> KeyResult<()> {
        // ssh-keygen refuses to overwrite, so clear any stale pair left
        // behind by an earlier inconsistency
        remove_if_present(path).await?;
        remove_if_present(&public_key_path(path)).await?;

        let program = self.keygen_program.clone();
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || -> KeyResult<()> {
            let output = Command::new(&program)
                .args(["-t", "ed25519", "-f"])
                .arg(&path)
                .args(["-C", DEPLOY_KEY_TITLE, "-N", ""])
                .output()?;
            if !output.status.success() {
                return Err(KeyError::Keygen {
                    status: output.status.to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                });
            }
            Ok(())
        })
        .await?
    }
}

fn public_key_path(path: &Path) -> PathBuf {
    let mut with_suffix = path.as_os_str().to_owned();
    with_suffix.push(".pub");
    PathBuf::from(with_suffix)
}

async fn remove_if_present(path: &Path) -> KeyResult<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}
