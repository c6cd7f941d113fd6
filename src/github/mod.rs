//! Remote Hosting Provider API
//!
//! octocrab-backed client for everything the engine asks of GitHub,
//! behind the [`GitHubApi`] trait so components can run against stub
//! hosts in tests.
//!
//! ## Core Features
//!
//! - **Date-bounded pagination**: descending listings stop at the first
//!   page that falls below the requested lower bound
//! - **Fixed page size**: every listing requests 100 items per page
//! - **Narrow payload types**: only the fields the engine reads are
//!   deserialized

pub mod api;
pub mod client;
pub mod error;
pub mod pagination;
pub mod types;

pub use api::GitHubApi;
pub use client::GitHubClient;
pub use error::{ApiError, ApiResult};
