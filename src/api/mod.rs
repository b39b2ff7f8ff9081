//! Engine facade
//!
//! Wires the fetch, normalize, frontier, extract, and store components into
//! the four operations a host layer binds to its own transport: `scrape`,
//! `crawl`, `extract`, and `search`. Argument validation happens here,
//! before any network or store access.

mod args;

pub use args::{
    CrawlArgs, CrawlResult, ExtractArgs, ExtractResult, ScrapeArgs, ScrapeFormat, ScrapeResult,
    SearchArgs, SearchResult, SearchResultEntry,
};

use crate::config::EngineConfig;
use crate::extract::{Extractor, Inference};
use crate::fetch::{FetchOptions, Fetcher};
use crate::frontier::{
    Coordinator, CrawlConstraints, CrawlJob, CrawlSummary, JobRegistry, JobSnapshot,
};
use crate::normalize::normalize;
use crate::store::{make_snippet, MemoryStore, PageStore};
use crate::url::normalize_url;
use crate::{Result, ValidationError};
use std::sync::Arc;
use url::Url;

/// Snippet length for search results, in characters
const SNIPPET_CHARS: usize = 160;

/// The crawling and content-extraction engine
///
/// Cheap to share behind an `Arc`; all operations take `&self`.
pub struct Engine {
    fetcher: Arc<Fetcher>,
    extractor: Extractor,
    store: Arc<dyn PageStore>,
    registry: JobRegistry,
    config: EngineConfig,
}

impl Engine {
    /// Creates an engine with the default in-memory store
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    /// Creates an engine over a caller-provided store backend
    pub fn with_store(config: EngineConfig, store: Arc<dyn PageStore>) -> Result<Self> {
        let fetcher = Arc::new(Fetcher::new(config.fetch.clone())?);

        Ok(Self {
            fetcher,
            extractor: Extractor::new(),
            store,
            registry: JobRegistry::new(),
            config,
        })
    }

    /// Attaches a prompt-guided inference provider for `extract`
    pub fn with_inference(mut self, provider: Arc<dyn Inference>) -> Self {
        self.extractor = Extractor::with_inference(provider);
        self
    }

    /// Fetches and normalizes a single URL, returning the requested rendering
    pub async fn scrape(&self, args: ScrapeArgs) -> Result<ScrapeResult> {
        args.validate()?;
        let url = parse_url(&args.url)?;

        let options = FetchOptions {
            wait_for_selector: args.wait_for.clone(),
            ..Default::default()
        };

        let raw = self.fetcher.fetch(&url, &options).await?;
        let document = normalize(&raw, &url);

        let text = match args.format {
            ScrapeFormat::Markdown => document.markdown.clone(),
            ScrapeFormat::Html => document.html.clone(),
            ScrapeFormat::Text => document.text.clone(),
        };

        let links = if args.include_links {
            document.links.iter().map(|u| u.to_string()).collect()
        } else {
            Vec::new()
        };

        Ok(ScrapeResult {
            url: document.url.to_string(),
            text,
            links,
            dynamic_content_unsupported: document.dynamic_content_unsupported,
        })
    }

    /// Crawls from a seed URL to a terminal status
    ///
    /// Always returns a crawl identifier, even when zero pages succeed; the
    /// summary string carries the terminal status and counters. Cancel a
    /// running crawl with [`Engine::cancel`] from another task, or use
    /// [`Engine::start_crawl`] to obtain the identifier before completion.
    pub async fn crawl(&self, args: CrawlArgs) -> Result<CrawlResult> {
        let handle = self.start_crawl(args)?;
        let crawl_id = handle.crawl_id.clone();
        let summary = handle.wait().await;

        Ok(CrawlResult {
            crawl_id,
            status_summary: summary.status_line(),
        })
    }

    /// Starts a crawl in the background and returns immediately
    ///
    /// The job is registered before this returns, so its identifier can be
    /// used at once for [`Engine::status`], [`Engine::cancel`], or a
    /// mid-crawl [`Engine::search`].
    pub fn start_crawl(&self, args: CrawlArgs) -> Result<CrawlHandle> {
        args.validate()?;
        let seed = normalize_url(&args.url).map_err(|e| ValidationError::InvalidUrl {
            url: args.url.clone(),
            message: e.to_string(),
        })?;

        let job = CrawlJob::new(
            seed,
            CrawlConstraints {
                max_pages: args.max_pages,
                max_depth: args.max_depth,
                include_patterns: args.include_patterns.clone(),
                exclude_patterns: args.exclude_patterns.clone(),
            },
        );

        let crawl_id = job.id.clone();
        self.registry.register(&job);

        let coordinator = Coordinator::new(
            Arc::clone(&self.fetcher),
            Arc::clone(&self.store),
            self.config.frontier.clone(),
        );
        let registry = self.registry.clone();
        let task = tokio::spawn(async move { coordinator.run(job, &registry).await });

        Ok(CrawlHandle { crawl_id, task })
    }

    /// Fetches a URL and applies a schema-driven extraction to it
    pub async fn extract(&self, args: ExtractArgs) -> Result<ExtractResult> {
        args.validate()?;
        let url = parse_url(&args.url)?;

        // A malformed schema fails fast, before any network access
        crate::extract::Schema::parse(&args.schema)?;

        let raw = self.fetcher.fetch(&url, &FetchOptions::default()).await?;
        let document = normalize(&raw, &url);

        let extraction =
            self.extractor
                .extract(&document, &args.schema, args.prompt.as_deref())?;

        Ok(ExtractResult {
            url: extraction.url,
            fields: extraction.fields,
            warnings: extraction.warnings,
        })
    }

    /// Searches stored pages of a crawl
    ///
    /// An unknown crawl identifier yields empty results; a crawl still in
    /// progress returns whatever pages are stored so far.
    pub fn search(&self, args: SearchArgs) -> Result<SearchResult> {
        args.validate()?;

        let hits = self
            .store
            .search(&args.crawl_id, &args.query, args.limit)?;

        let results = hits
            .into_iter()
            .map(|hit| SearchResultEntry {
                url: hit.page.document.url.to_string(),
                snippet: make_snippet(&hit.page.document.text, &args.query, SNIPPET_CHARS),
                score: hit.score,
            })
            .collect();

        Ok(SearchResult { results })
    }

    /// Requests cooperative cancellation of a running crawl
    ///
    /// Returns false when the crawl identifier is unknown. The flag is
    /// polled between entries; in-flight fetches complete normally first.
    pub fn cancel(&self, crawl_id: &str) -> bool {
        self.registry.cancel(crawl_id)
    }

    /// Point-in-time status of a crawl, observable mid-run
    pub fn status(&self, crawl_id: &str) -> Option<JobSnapshot> {
        self.registry.snapshot(crawl_id)
    }

    /// Direct access to a stored page
    pub fn stored_page(&self, crawl_id: &str, url: &str) -> Result<Option<crate::store::StoredPage>> {
        Ok(self.store.get(crawl_id, url)?)
    }
}

/// A crawl running in the background
///
/// Dropped handles do not stop the crawl; it runs to a terminal status
/// either way.
pub struct CrawlHandle {
    /// Identifier of the running crawl
    pub crawl_id: String,

    task: tokio::task::JoinHandle<CrawlSummary>,
}

impl CrawlHandle {
    /// Waits for the crawl to reach a terminal status
    pub async fn wait(self) -> CrawlSummary {
        match self.task.await {
            Ok(summary) => summary,
            Err(join_error) => {
                tracing::error!("crawl task failed: {}", join_error);
                CrawlSummary {
                    crawl_id: self.crawl_id,
                    seed: String::new(),
                    status: crate::frontier::JobStatus::Failed,
                    pages_fetched: 0,
                    pages_failed: 0,
                    duration: std::time::Duration::ZERO,
                }
            }
        }
    }
}

/// Parses a caller-supplied URL, mapping failures to a validation error
fn parse_url(input: &str) -> std::result::Result<Url, ValidationError> {
    Url::parse(input).map_err(|e| ValidationError::InvalidUrl {
        url: input.to_string(),
        message: e.to_string(),
    })
}
