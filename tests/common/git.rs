//! Git CLI helpers for building fixture repositories
//!
//! Commit and merge helpers pin both `GIT_AUTHOR_DATE` and
//! `GIT_COMMITTER_DATE`, so fixture history has stable timestamps and
//! date-window assertions do not depend on when the test runs.

use std::path::Path;
use std::process::Command;

/// Run git in `repo_path`, panicking on a nonzero exit. Returns trimmed
/// stdout.
pub fn git(repo_path: &Path, args: &[&str]) -> String {
    git_with_dates(repo_path, args, None)
}

pub fn git_with_dates(repo_path: &Path, args: &[&str], date: Option<&str>) -> String {
    let mut command = Command::new("git");
    command.args(args).current_dir(repo_path);
    if let Some(date) = date {
        command
            .env("GIT_AUTHOR_DATE", date)
            .env("GIT_COMMITTER_DATE", date);
    }
    let output = command.output().expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Initialize a repository on `main` with a fixed committer identity.
pub fn init_repo(repo_path: &Path, user_name: &str, user_email: &str) {
    git(repo_path, &["init", "--initial-branch=main"]);
    git(repo_path, &["config", "user.name", user_name]);
    git(repo_path, &["config", "user.email", user_email]);
}

/// Write `content` to `name`, commit it at `date`, and return the new
/// commit hash.
pub fn commit_file(
    repo_path: &Path,
    name: &str,
    content: &str,
    message: &str,
    date: &str,
) -> String {
    std::fs::write(repo_path.join(name), content).expect("Failed to write fixture file");
    git(repo_path, &["add", "."]);
    git_with_dates(repo_path, &["commit", "-m", message], Some(date));
    rev_parse(repo_path, "HEAD")
}

/// Merge `branch` into the current branch with a real merge commit and
/// return its hash.
pub fn merge_no_ff(repo_path: &Path, branch: &str, message: &str, date: &str) -> String {
    git_with_dates(
        repo_path,
        &["merge", branch, "--no-ff", "-m", message],
        Some(date),
    );
    rev_parse(repo_path, "HEAD")
}

pub fn rev_parse(repo_path: &Path, reference: &str) -> String {
    git(repo_path, &["rev-parse", reference])
}
