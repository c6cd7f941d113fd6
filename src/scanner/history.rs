//! Commit History Extraction
//!
//! Walks a checked-out branch newest-first with git2 and reconstructs
//! unified diff text directly from the object model, so no external
//! diff tool runs per commit.

use std::path::Path;

use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};
use git2::{BranchType, DiffFormat, DiffOptions, Repository, Sort};

use super::error::ScanResult;

/// One commit pulled out of the branch walk, before identity
/// resolution and reconciliation.
#[derive(Debug, Clone)]
pub struct RawCommit {
    pub hash: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub created_at: DateTime<FixedOffset>,
    pub files_changed: u64,
    pub added_lines: u64,
    pub deleted_lines: u64,
    pub diff: String,
}

/// Remote branch names (`origin/...`), skipping the `HEAD` symref.
pub fn remote_branches(repo_path: &Path) -> ScanResult<Vec<String>> {
    let repo = Repository::open(repo_path)?;
    let mut names = Vec::new();
    for entry in repo.branches(Some(BranchType::Remote))? {
        let (branch, _) = entry?;
        if let Some(name) = branch.name()? {
            if name.ends_with("/HEAD") {
                continue;
            }
            names.push(name.to_string());
        }
    }
    Ok(names)
}

/// Walk history backward from HEAD, stopping at the first commit older
/// than `reference_date`. History is time-sorted, so everything past
/// the first out-of-range commit is out of range too.
pub fn walk_head(repo_path: &Path, reference_date: DateTime<Utc>) -> ScanResult<Vec<RawCommit>> {
    let repo = Repository::open(repo_path)?;
    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(Sort::TIME)?;
    revwalk.push_head()?;

    let since = reference_date.timestamp();
    let mut commits = Vec::new();
    for oid in revwalk {
        let commit = repo.find_commit(oid?)?;
        if commit.time().seconds() < since {
            break;
        }
        commits.push(extract_commit(&repo, &commit)?);
    }
    Ok(commits)
}

fn extract_commit(repo: &Repository, commit: &git2::Commit) -> ScanResult<RawCommit> {
    let tree = commit.tree()?;
    // Root commits diff against the empty tree
    let parent_tree = if commit.parent_count() > 0 {
        Some(commit.parent(0)?.tree()?)
    } else {
        None
    };

    let mut diff_opts = DiffOptions::new();
    diff_opts.context_lines(3).interhunk_lines(0);
    let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut diff_opts))?;
    let stats = diff.stats()?;

    let author = commit.author();
    Ok(RawCommit {
        hash: commit.id().to_string(),
        // Trailing newline is trimmed so messages compare equal with
        // the provider API's rendering of the same commit
        message: commit.message().unwrap_or("").trim_end().to_string(),
        author_name: author.name().unwrap_or("").to_string(),
        author_email: author.email().unwrap_or("").to_string(),
        created_at: commit_timestamp(commit.time()),
        files_changed: stats.files_changed() as u64,
        added_lines: stats.insertions() as u64,
        deleted_lines: stats.deletions() as u64,
        diff: render_patch(&diff)?,
    })
}

/// Unified patch text: file and hunk headers verbatim, body lines
/// prefixed with their origin character, binary deltas skipped.
fn render_patch(diff: &git2::Diff) -> ScanResult<String> {
    let mut text = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        if line.origin() == 'B' {
            return true;
        }
        let content = String::from_utf8_lossy(line.content());
        match line.origin() {
            '+' | '-' | ' ' => {
                text.push(line.origin());
                text.push_str(&content);
            }
            'F' | 'H' => text.push_str(&content),
            _ => {}
        }
        true
    })?;
    Ok(text)
}

/// Commit time as a timezone-aware timestamp, preserving the author's
/// local offset.
fn commit_timestamp(time: git2::Time) -> DateTime<FixedOffset> {
    let offset =
        FixedOffset::east_opt(time.offset_minutes() * 60).unwrap_or_else(|| Utc.fix());
    offset
        .timestamp_opt(time.seconds(), 0)
        .single()
        .unwrap_or_else(|| DateTime::UNIX_EPOCH.with_timezone(&offset))
}
