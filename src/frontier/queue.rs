//! Frontier queue: breadth-first, deduplicated

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use url::Url;

/// A URL queued for fetching
#[derive(Debug, Clone)]
pub struct FrontierEntry {
    /// Normalized URL to fetch
    pub url: Url,

    /// Link depth from the seed (seed is 0)
    pub depth: u32,

    /// The page that linked here, for provenance
    pub discovered_from: Option<Url>,

    /// Monotonic enqueue sequence number, breaks ties within a depth
    pub seq: u64,

    /// When the entry was enqueued
    pub enqueued_at: DateTime<Utc>,
}

// Breadth-first ordering: shallower entries first, FIFO within a depth.
// BinaryHeap is a max-heap, so the comparison is reversed.
impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .depth
            .cmp(&self.depth)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.depth == other.depth && self.seq == other.seq
    }
}

impl Eq for FrontierEntry {}

/// The crawl work queue plus its dedup logic
///
/// A URL is admitted at most once for the queue's lifetime: pushes of an
/// already-seen normalized URL are rejected, which guarantees each page is
/// fetched at most once per crawl.
#[derive(Debug, Default)]
pub struct FrontierQueue {
    heap: BinaryHeap<FrontierEntry>,
    seen: HashSet<String>,
    next_seq: u64,
}

impl FrontierQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a URL unless it was already admitted
    ///
    /// Returns true if the entry was added.
    pub fn push(&mut self, url: Url, depth: u32, discovered_from: Option<Url>) -> bool {
        if !self.seen.insert(url.as_str().to_string()) {
            return false;
        }

        let seq = self.next_seq;
        self.next_seq += 1;

        self.heap.push(FrontierEntry {
            url,
            depth,
            discovered_from,
            seq,
            enqueued_at: Utc::now(),
        });
        true
    }

    /// Puts back an entry that was popped but could not be dispatched
    ///
    /// Bypasses the dedup check; the entry keeps its original ordering.
    pub fn requeue(&mut self, entry: FrontierEntry) {
        self.heap.push(entry);
    }

    /// Removes and returns the next entry in breadth-first order
    pub fn pop(&mut self) -> Option<FrontierEntry> {
        self.heap.pop()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
