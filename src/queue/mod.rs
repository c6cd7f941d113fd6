//! Analysis Queue Component
//!
//! In-process job queue that feeds discovered commits to the external
//! analyzer under a bounded concurrency ceiling.
//!
//! ## Core Features
//!
//! - **Bounded Concurrency**: a semaphore caps simultaneous analyzer runs
//! - **Pause/Resume**: dispatch can be gated without dropping queued work
//! - **Failure Accounting**: failed jobs mark the commit record errored
//! - **Drain**: callers can await completion of everything queued so far
//!
//! Delivery is at-least-once: every worker step is idempotent, so a job
//! re-run after a partial failure converges on the same stored state.
//! Jobs live only in memory; work abandoned at shutdown shows up as
//! commit records still marked pending.

mod error;
mod job;
mod manager;
mod worker;

pub use error::{QueueError, QueueResult};
pub use job::AnalysisJob;
pub use manager::{AnalysisQueue, QueueMetrics, QUEUE_NAME};
