//! Seine main entry point
//!
//! A thin command-line host over the engine: each subcommand binds one of
//! the four core operations and prints its structured result as JSON. Real
//! deployments would bind the same operations to their own transport.

use anyhow::Context;
use clap::{Parser, Subcommand};
use seine::store::SqliteStore;
use seine::{CrawlArgs, Engine, EngineConfig, ExtractArgs, ScrapeArgs, SearchArgs};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Seine: a web crawling and content-extraction engine
#[derive(Parser, Debug)]
#[command(name = "seine")]
#[command(version)]
#[command(about = "Scrape, crawl, extract, and search web content", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    /// SQLite database for crawl results (defaults to in-memory storage)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape a single URL for content
    Scrape {
        /// URL to scrape
        url: String,

        /// Output format: markdown, html, or text
        #[arg(long, default_value = "markdown")]
        format: String,

        /// Include extracted links in the output
        #[arg(long)]
        include_links: bool,

        /// CSS selector to wait for before scraping
        #[arg(long, value_name = "SELECTOR")]
        wait_for: Option<String>,
    },

    /// Crawl a website starting from a URL
    Crawl {
        /// Starting URL for the crawl
        url: String,

        /// Maximum number of pages to crawl
        #[arg(long, default_value_t = 10)]
        max_pages: usize,

        /// Maximum crawl depth
        #[arg(long, default_value_t = 2)]
        max_depth: u32,

        /// URL patterns to include (repeatable)
        #[arg(long = "include", value_name = "PATTERN")]
        include_patterns: Vec<String>,

        /// URL patterns to exclude (repeatable)
        #[arg(long = "exclude", value_name = "PATTERN")]
        exclude_patterns: Vec<String>,
    },

    /// Extract structured data from a URL
    Extract {
        /// URL to extract from
        url: String,

        /// Extraction schema as JSON, e.g. '{"title": "string"}'
        #[arg(long)]
        schema: String,

        /// Natural-language extraction instructions
        #[arg(long)]
        prompt: Option<String>,
    },

    /// Search previously crawled content
    Search {
        /// Search query
        query: String,

        /// Identifier of the crawl to search
        #[arg(long)]
        crawl_id: String,

        /// Maximum results
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = EngineConfig::default();
    let engine = match &cli.db {
        Some(path) => {
            let store = SqliteStore::open(path)
                .with_context(|| format!("failed to open database at {}", path.display()))?;
            Engine::with_store(config, Arc::new(store))?
        }
        None => Engine::new(config)?,
    };

    match cli.command {
        Command::Scrape {
            url,
            format,
            include_links,
            wait_for,
        } => {
            let args = ScrapeArgs {
                url,
                format: format.parse()?,
                include_links,
                wait_for,
            };
            let result = engine.scrape(args).await?;
            print_json(&result)?;
        }

        Command::Crawl {
            url,
            max_pages,
            max_depth,
            include_patterns,
            exclude_patterns,
        } => {
            let args = CrawlArgs {
                url,
                max_pages,
                max_depth,
                include_patterns,
                exclude_patterns,
            };
            let result = engine.crawl(args).await?;
            print_json(&result)?;
        }

        Command::Extract { url, schema, prompt } => {
            let schema: serde_json::Value =
                serde_json::from_str(&schema).context("schema is not valid JSON")?;
            let mut args = ExtractArgs::new(url, schema);
            args.prompt = prompt;
            let result = engine.extract(args).await?;
            print_json(&result)?;
        }

        Command::Search {
            query,
            crawl_id,
            limit,
        } => {
            let mut args = SearchArgs::new(query, crawl_id);
            args.limit = limit;
            let result = engine.search(args)?;
            print_json(&result)?;
        }
    }

    Ok(())
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("seine=info,warn"),
            1 => EnvFilter::new("seine=debug,info"),
            2 => EnvFilter::new("seine=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
