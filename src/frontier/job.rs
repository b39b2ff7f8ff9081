//! Crawl job identity, constraints, and status tracking

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;
use uuid::Uuid;

/// Lifecycle of a crawl job
///
/// Pending → Running → {Completed, Failed, Cancelled}. Running transitions
/// to Completed when the queue drains or the page budget is reached, to
/// Failed only on an internal error (store unavailable), and to Cancelled
/// on an external cancel request. Individual page failures never change the
/// status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Returns true once the job can no longer make progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Limits applied to a single crawl
#[derive(Debug, Clone)]
pub struct CrawlConstraints {
    /// Maximum pages fetched before the job completes
    pub max_pages: usize,

    /// Maximum link depth from the seed (seed is depth 0)
    pub max_depth: u32,

    /// Glob patterns a URL must match to be fetched (empty = match all)
    pub include_patterns: Vec<String>,

    /// Glob patterns that reject a URL; exclude wins over include
    pub exclude_patterns: Vec<String>,
}

impl Default for CrawlConstraints {
    fn default() -> Self {
        Self {
            max_pages: 10,
            max_depth: 2,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }
}

/// Per-job progress counters
#[derive(Debug, Clone, Copy, Default)]
pub struct CrawlCounters {
    pub pages_fetched: usize,
    pub pages_failed: usize,
}

/// One crawl's identity, constraints, and live state
#[derive(Debug, Clone)]
pub struct CrawlJob {
    /// Opaque identifier, unique per crawl
    pub id: String,

    /// Normalized seed URL
    pub seed: Url,

    pub constraints: CrawlConstraints,
    pub status: JobStatus,
    pub counters: CrawlCounters,
}

impl CrawlJob {
    /// Creates a new pending job with a fresh identifier
    pub fn new(seed: Url, constraints: CrawlConstraints) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            seed,
            constraints,
            status: JobStatus::Pending,
            counters: CrawlCounters::default(),
        }
    }
}

/// Point-in-time view of a job for external observers
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub crawl_id: String,
    pub seed: String,
    pub status: JobStatus,
    pub pages_fetched: usize,
    pub pages_failed: usize,
}

struct JobState {
    seed: String,
    status: JobStatus,
    pages_fetched: usize,
    pages_failed: usize,
    cancel: Arc<AtomicBool>,
}

/// Shared registry of crawl jobs
///
/// The coordinator publishes progress here; callers observe status mid-crawl
/// and request cooperative cancellation. Cheap to clone.
#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<Mutex<HashMap<String, JobState>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a job and returns its cancellation flag
    ///
    /// Idempotent: registering an already-known job returns the existing
    /// flag without resetting its state, so a caller can register a job
    /// before handing it to the coordinator.
    pub fn register(&self, job: &CrawlJob) -> Arc<AtomicBool> {
        let mut jobs = self.jobs.lock().unwrap();
        let state = jobs.entry(job.id.clone()).or_insert_with(|| JobState {
            seed: job.seed.to_string(),
            status: job.status,
            pages_fetched: job.counters.pages_fetched,
            pages_failed: job.counters.pages_failed,
            cancel: Arc::new(AtomicBool::new(false)),
        });
        Arc::clone(&state.cancel)
    }

    pub fn set_status(&self, crawl_id: &str, status: JobStatus) {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(state) = jobs.get_mut(crawl_id) {
            state.status = status;
        }
    }

    pub fn record_progress(&self, crawl_id: &str, counters: CrawlCounters) {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(state) = jobs.get_mut(crawl_id) {
            state.pages_fetched = counters.pages_fetched;
            state.pages_failed = counters.pages_failed;
        }
    }

    /// Requests cooperative cancellation of a running job
    ///
    /// Returns false if the job is unknown. The flag is polled between
    /// entries; in-flight fetches finish normally first.
    pub fn cancel(&self, crawl_id: &str) -> bool {
        let jobs = self.jobs.lock().unwrap();
        match jobs.get(crawl_id) {
            Some(state) => {
                state.cancel.store(true, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self, crawl_id: &str) -> Option<JobSnapshot> {
        let jobs = self.jobs.lock().unwrap();
        jobs.get(crawl_id).map(|state| JobSnapshot {
            crawl_id: crawl_id.to_string(),
            seed: state.seed.clone(),
            status: state.status,
            pages_fetched: state.pages_fetched,
            pages_failed: state.pages_failed,
        })
    }
}
