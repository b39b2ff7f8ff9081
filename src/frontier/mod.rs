//! Crawl frontier
//!
//! This module contains the crawl scheduler: the prioritized, deduplicated
//! queue of URLs, per-job constraints and status tracking, and the
//! coordinator loop that drives fetch/normalize/store round trips through a
//! bounded worker pool with per-host politeness limits.

mod coordinator;
mod job;
mod queue;

pub use coordinator::Coordinator;
pub use job::{CrawlConstraints, CrawlCounters, CrawlJob, JobRegistry, JobSnapshot, JobStatus};
pub use queue::{FrontierEntry, FrontierQueue};

use std::time::Duration;

/// Final statistics for a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    /// The crawl's opaque identifier
    pub crawl_id: String,

    /// The seed URL the crawl started from
    pub seed: String,

    /// Terminal status of the job
    pub status: JobStatus,

    /// Pages fetched, normalized, and stored
    pub pages_fetched: usize,

    /// Pages that failed after retries were exhausted
    pub pages_failed: usize,

    /// Wall-clock duration of the crawl
    pub duration: Duration,
}

impl CrawlSummary {
    /// Renders the one-line summary reported to callers
    pub fn status_line(&self) -> String {
        format!(
            "{}: {} pages fetched, {} failed in {:.1}s",
            self.status,
            self.pages_fetched,
            self.pages_failed,
            self.duration.as_secs_f64()
        )
    }
}
