//! Crawl coordinator - main crawl orchestration logic
//!
//! The coordinator drains the frontier queue through a bounded worker pool.
//! Each worker's unit of work is one fetch → normalize → store round trip.
//! The queue, dedup set, and per-host counters live on the coordinator's own
//! task (single-writer discipline), so no two workers can ever receive the
//! same URL.

use crate::config::FrontierConfig;
use crate::fetch::{FetchError, FetchOptions, Fetcher};
use crate::frontier::{
    CrawlJob, CrawlSummary, FrontierEntry, FrontierQueue, JobRegistry, JobStatus,
};
use crate::normalize::{normalize, NormalizedDocument};
use crate::store::{PageStore, StoredPage};
use crate::url::{host_of, normalize_url, same_scope, UrlFilter};
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// Result of one worker round trip
struct FetchOutcome {
    entry: FrontierEntry,
    result: Result<NormalizedDocument, FetchError>,
}

/// Per-host in-flight caps and dispatch delays
///
/// Mirrors the per-domain request accounting of the scheduler: a host never
/// has more than `max_per_host` requests open, and consecutive dispatches to
/// the same host are spaced by at least `delay`.
struct HostLimiter {
    max_per_host: usize,
    delay: Duration,
    in_flight: HashMap<String, usize>,
    last_dispatch: HashMap<String, Instant>,
}

impl HostLimiter {
    fn new(max_per_host: usize, delay: Duration) -> Self {
        Self {
            max_per_host: max_per_host.max(1),
            delay,
            in_flight: HashMap::new(),
            last_dispatch: HashMap::new(),
        }
    }

    /// Claims a dispatch slot for the host, if one is available now
    fn try_acquire(&mut self, host: &str) -> bool {
        let count = self.in_flight.get(host).copied().unwrap_or(0);
        if count >= self.max_per_host {
            return false;
        }

        if !self.delay.is_zero() {
            if let Some(last) = self.last_dispatch.get(host) {
                if last.elapsed() < self.delay {
                    return false;
                }
            }
        }

        *self.in_flight.entry(host.to_string()).or_insert(0) += 1;
        self.last_dispatch.insert(host.to_string(), Instant::now());
        true
    }

    fn release(&mut self, host: &str) {
        if let Some(count) = self.in_flight.get_mut(host) {
            *count = count.saturating_sub(1);
        }
    }

    /// Minimum time until some host's dispatch delay elapses
    fn min_wait(&self) -> Option<Duration> {
        if self.delay.is_zero() {
            return None;
        }

        self.last_dispatch
            .values()
            .map(|last| self.delay.saturating_sub(last.elapsed()))
            .min()
            .map(|wait| wait.max(Duration::from_millis(10)))
    }
}

/// Drives crawl jobs from seed to terminal status
pub struct Coordinator {
    fetcher: Arc<Fetcher>,
    store: Arc<dyn PageStore>,
    config: FrontierConfig,
}

impl Coordinator {
    pub fn new(fetcher: Arc<Fetcher>, store: Arc<dyn PageStore>, config: FrontierConfig) -> Self {
        Self {
            fetcher,
            store,
            config,
        }
    }

    /// Runs a crawl job to a terminal status
    ///
    /// The loop dispatches frontier entries to workers while the page budget
    /// and per-host limits allow, then awaits completions one at a time:
    ///
    /// 1. Poll the cancel flag (between entries, never mid-fetch).
    /// 2. Stop if `pages_fetched` reached `max_pages` or the queue drained.
    /// 3. Dispatch ready entries, skipping any that fail the
    ///    include/exclude test (exclude wins) or exceed `max_depth`.
    /// 4. On success: persist the page, bump `pages_fetched`, enqueue
    ///    same-scope links at depth+1.
    /// 5. On fetch failure: bump `pages_failed` and continue - broken links
    ///    never fail the crawl.
    ///
    /// A store failure is the only path to `Failed`.
    pub async fn run(&self, mut job: CrawlJob, registry: &JobRegistry) -> CrawlSummary {
        let started = Instant::now();
        let cancel = registry.register(&job);

        job.status = JobStatus::Running;
        registry.set_status(&job.id, JobStatus::Running);
        tracing::info!("starting crawl {} from {}", job.id, job.seed);

        let filter = UrlFilter::new(
            job.constraints.include_patterns.clone(),
            job.constraints.exclude_patterns.clone(),
        );
        let mut queue = FrontierQueue::new();
        queue.push(job.seed.clone(), 0, None);

        let mut in_flight: JoinSet<FetchOutcome> = JoinSet::new();
        let mut hosts = HostLimiter::new(self.config.per_host_concurrency, self.config.per_host_delay);
        let mut stalled: Vec<FrontierEntry> = Vec::new();
        let mut store_failed = false;
        let mut cancelled = false;

        loop {
            if cancel.load(Ordering::Relaxed) {
                tracing::info!("crawl {} cancelled", job.id);
                cancelled = true;
                break;
            }

            if job.counters.pages_fetched >= job.constraints.max_pages {
                tracing::info!("crawl {} reached max pages", job.id);
                break;
            }

            // Dispatch while worker slots and page budget remain
            let budget = job.constraints.max_pages - job.counters.pages_fetched;
            while in_flight.len() < self.config.workers && in_flight.len() < budget {
                let entry = match queue.pop() {
                    Some(entry) => entry,
                    None => break,
                };

                if entry.depth > job.constraints.max_depth {
                    tracing::debug!("skipping {} - max depth exceeded", entry.url);
                    continue;
                }

                if !filter.allows(entry.url.as_str()) {
                    tracing::debug!("skipping {} - filtered by patterns", entry.url);
                    continue;
                }

                let host = host_of(&entry.url).unwrap_or_default();
                if !hosts.try_acquire(&host) {
                    stalled.push(entry);
                    continue;
                }

                let fetcher = Arc::clone(&self.fetcher);
                in_flight.spawn(async move {
                    let options = FetchOptions::default();
                    let result = fetcher
                        .fetch(&entry.url, &options)
                        .await
                        .map(|raw| normalize(&raw, &entry.url));
                    FetchOutcome { entry, result }
                });
            }

            // Host-saturated entries go back in their original order
            for entry in stalled.drain(..) {
                queue.requeue(entry);
            }

            if in_flight.is_empty() {
                if queue.is_empty() {
                    break;
                }
                // Everything queued is waiting on a per-host delay
                match hosts.min_wait() {
                    Some(wait) => {
                        tokio::time::sleep(wait).await;
                        continue;
                    }
                    None => break,
                }
            }

            let outcome = match in_flight.join_next().await {
                Some(Ok(outcome)) => outcome,
                Some(Err(join_error)) => {
                    tracing::warn!("crawl worker panicked: {}", join_error);
                    job.counters.pages_failed += 1;
                    continue;
                }
                None => continue,
            };

            let host = host_of(&outcome.entry.url).unwrap_or_default();
            hosts.release(&host);

            match outcome.result {
                Ok(document) => {
                    let links = document.links.clone();
                    let page = StoredPage::new(job.id.clone(), document);

                    if let Err(error) = self.store.put(page) {
                        tracing::error!("store unavailable, failing crawl {}: {}", job.id, error);
                        store_failed = true;
                        break;
                    }

                    job.counters.pages_fetched += 1;

                    let child_depth = outcome.entry.depth + 1;
                    if child_depth <= job.constraints.max_depth {
                        for link in links {
                            if !same_scope(&job.seed, &link) {
                                continue;
                            }
                            let normalized = match normalize_url(link.as_str()) {
                                Ok(url) => url,
                                Err(_) => continue,
                            };
                            queue.push(normalized, child_depth, Some(outcome.entry.url.clone()));
                        }
                    }
                }
                Err(error) => {
                    tracing::warn!("page fetch failed for {}: {}", outcome.entry.url, error);
                    job.counters.pages_failed += 1;
                }
            }

            registry.record_progress(&job.id, job.counters);
        }

        // Let in-flight fetches finish normally; their results still count
        // but no further links are enqueued
        while let Some(joined) = in_flight.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    tracing::warn!("crawl worker panicked: {}", join_error);
                    job.counters.pages_failed += 1;
                    continue;
                }
            };

            match outcome.result {
                Ok(document)
                    if !store_failed
                        && job.counters.pages_fetched < job.constraints.max_pages =>
                {
                    let page = StoredPage::new(job.id.clone(), document);
                    match self.store.put(page) {
                        Ok(()) => job.counters.pages_fetched += 1,
                        Err(error) => {
                            tracing::error!("store unavailable during drain: {}", error);
                            store_failed = true;
                        }
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    tracing::warn!("page fetch failed for {}: {}", outcome.entry.url, error);
                    job.counters.pages_failed += 1;
                }
            }
        }

        job.status = if store_failed {
            JobStatus::Failed
        } else if cancelled {
            JobStatus::Cancelled
        } else {
            JobStatus::Completed
        };

        registry.record_progress(&job.id, job.counters);
        registry.set_status(&job.id, job.status);

        tracing::info!(
            "crawl {} {}: {} fetched, {} failed in {:?}",
            job.id,
            job.status,
            job.counters.pages_fetched,
            job.counters.pages_failed,
            started.elapsed()
        );

        CrawlSummary {
            crawl_id: job.id,
            seed: job.seed.to_string(),
            status: job.status,
            pages_fetched: job.counters.pages_fetched,
            pages_failed: job.counters.pages_failed,
            duration: started.elapsed(),
        }
    }
}
