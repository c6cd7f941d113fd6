//! Scanner Types
//!
//! Shared types produced by the repository scan.

use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, Utc};

/// Kind of activity a scanned event represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitEventKind {
    Commit,
    Review,
}

/// Which source an event was extracted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventProvenance {
    /// Derived from a pull request's commit list or its approval reviews
    PullRequest,
    /// Found by walking a branch's history directly
    BranchWalk,
}

/// One unit of repository activity discovered by a scan.
///
/// `username` holds a single resolved candidate; ambiguous identity
/// resolution fans out into one event per candidate before
/// reconciliation. An empty `username` means resolution failed.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CommitEvent {
    pub hash: String,
    pub branch: String,
    pub message: String,
    pub username: String,
    pub author_name: String,
    pub author_email: String,
    /// Author-local timestamp; the offset is preserved so downstream
    /// work-hour attribution sees the author's wall clock.
    pub created_at: DateTime<FixedOffset>,
    pub organization: String,
    pub repository: String,
    pub kind: CommitEventKind,
    pub provenance: EventProvenance,
    pub files_changed: u64,
    pub added_lines: u64,
    pub deleted_lines: u64,
    /// Full unified diff text; empty for review events and PR-derived
    /// commits (their diffs surface again through the branch walk).
    pub diff: String,
}

impl CommitEvent {
    /// Timezone offset of `created_at` formatted as `+HH:MM` / `-HH:MM`.
    pub fn timezone_offset(&self) -> String {
        format_utc_offset(self.created_at.offset().local_minus_utc() / 60)
    }
}

/// Inputs for scanning one repository clone
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Local clone path
    pub path: PathBuf,
    /// Branch checked out after the scan completes
    pub default_branch: String,
    /// Private deploy key used for fetch over SSH
    pub ssh_key_path: PathBuf,
    /// Commits strictly older than this are out of scope
    pub reference_date: DateTime<Utc>,
}

/// Format an offset in minutes east of UTC as `+HH:MM` / `-HH:MM`
pub fn format_utc_offset(offset_minutes: i32) -> String {
    let sign = if offset_minutes < 0 { '-' } else { '+' };
    let magnitude = offset_minutes.unsigned_abs();
    format!("{}{:02}:{:02}", sign, magnitude / 60, magnitude % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn positive_offset_formats_with_plus_sign() {
        assert_eq!(format_utc_offset(120), "+02:00");
        assert_eq!(format_utc_offset(330), "+05:30");
    }

    #[test]
    fn negative_offset_formats_with_minus_sign() {
        assert_eq!(format_utc_offset(-480), "-08:00");
        assert_eq!(format_utc_offset(-90), "-01:30");
    }

    #[test]
    fn zero_offset_is_utc() {
        assert_eq!(format_utc_offset(0), "+00:00");
    }

    #[test]
    fn timezone_offset_reads_the_event_timestamp() {
        let tz = FixedOffset::east_opt(10 * 3600).unwrap();
        let event = CommitEvent {
            hash: "abc123".to_string(),
            branch: "main".to_string(),
            message: "initial".to_string(),
            username: "casey".to_string(),
            author_name: "Casey".to_string(),
            author_email: "casey@example.com".to_string(),
            created_at: tz.with_ymd_and_hms(2025, 6, 2, 9, 30, 0).unwrap(),
            organization: "acme".to_string(),
            repository: "widgets".to_string(),
            kind: CommitEventKind::Commit,
            provenance: EventProvenance::BranchWalk,
            files_changed: 1,
            added_lines: 3,
            deleted_lines: 0,
            diff: String::new(),
        };
        assert_eq!(event.timezone_offset(), "+10:00");
    }
}
