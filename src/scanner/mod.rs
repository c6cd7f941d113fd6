//! Repository Scanner Component
//!
//! Turns one repository clone plus the provider API into a clean,
//! deduplicated stream of commit events.
//!
//! ## Core Features
//!
//! - **Three sources, one stream**: branch walks, pull-request commit
//!   lists and approval reviews all funnel through the reconciler
//! - **Date-bounded walks**: each branch is walked newest-first and cut
//!   at the reference date
//! - **Diff reconstruction**: unified diff text comes straight from the
//!   object database, no diff tool subprocess per commit
//! - **Identity resolution**: author emails map onto organization
//!   members, with alias-table fan-out for bot-authored commits
//! - **Deploy-key transport**: all remote git traffic runs over a
//!   single-purpose SSH deploy key

mod git_ops;
mod history;

pub mod error;
pub mod identity;
pub mod reconcile;
pub mod task;
pub mod types;

pub use error::{ScanError, ScanResult};
pub use git_ops::clone_repository;
pub use identity::IdentityResolver;
pub use reconcile::CommitReconciler;
pub use task::RepositoryScanner;
pub use types::{CommitEvent, CommitEventKind, EventProvenance, ScanOptions};
