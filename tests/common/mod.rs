//! Shared integration test utilities
//!
//! Git repository builders driven through the `git` CLI, plus a
//! configurable in-process stand-in for the hosting provider API.

pub mod git;
pub mod stub_api;
