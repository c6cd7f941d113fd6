//! repopulse - Git hosting organization synchronization engine
//!
//! Discovers repositories across GitHub organizations, provisions
//! per-repository deploy keys, walks branch and pull-request history
//! into a deduplicated commit store, and feeds new commits to an
//! external analyzer under bounded concurrency.

pub mod analyzer;
pub mod app;
pub mod core;
pub mod github;
pub mod keys;
pub mod orchestrator;
pub mod queue;
pub mod scanner;
pub mod store;
pub mod webhook;
