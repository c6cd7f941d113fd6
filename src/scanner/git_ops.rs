//! Git Subprocess Operations
//!
//! Clone/fetch/checkout run through the `git` binary so the deploy key
//! can be injected via `GIT_SSH_COMMAND`. A nonzero exit aborts the
//! scan; a half-updated clone must never produce partial history.

use std::path::Path;
use std::process::Command;

use super::error::{ScanError, ScanResult};

/// SSH invocation pinned to a single deploy key, ignoring user ssh
/// config and host-key state. The key is single-purpose automation
/// material, not a user credential.
pub fn ssh_command(key_path: &Path) -> String {
    format!(
        "ssh -i {} -o IdentitiesOnly=yes -o UserKnownHostsFile=/dev/null -o StrictHostKeyChecking=no -F /dev/null",
        key_path.display()
    )
}

/// Clone `url` into `dest` using the deploy key.
pub fn clone_repository(url: &str, dest: &Path, key_path: &Path) -> ScanResult<()> {
    let dest = dest.to_string_lossy();
    run_git(None, &["clone", url, dest.as_ref()], Some(key_path))
}

/// Fetch the origin remote with pruning.
pub fn fetch_prune(repo_path: &Path, key_path: &Path) -> ScanResult<()> {
    run_git(
        Some(repo_path),
        &["fetch", "origin", "--prune"],
        Some(key_path),
    )
}

/// Discard local modifications in the working tree.
pub fn reset_hard(repo_path: &Path) -> ScanResult<()> {
    run_git(Some(repo_path), &["reset", "--hard"], None)
}

/// Check out a branch or remote ref.
pub fn checkout(repo_path: &Path, reference: &str) -> ScanResult<()> {
    run_git(Some(repo_path), &["checkout", reference], None)
}

fn run_git(current_dir: Option<&Path>, args: &[&str], key_path: Option<&Path>) -> ScanResult<()> {
    let mut command = Command::new("git");
    command.args(args);
    if let Some(dir) = current_dir {
        command.current_dir(dir);
    }
    if let Some(key) = key_path {
        command.env("GIT_SSH_COMMAND", ssh_command(key));
    }

    let output = command.output()?;
    if !output.status.success() {
        return Err(ScanError::Subprocess {
            command: format!("git {}", args.join(" ")),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}
