//! Integration tests for the crawl operation
//!
//! These tests use wiremock to create mock HTTP servers and exercise the
//! full frontier loop end-to-end: constraints, dedup, pattern filtering,
//! partial failure tolerance, and cancellation.

use seine::config::{EngineConfig, FetchConfig, FrontierConfig};
use seine::{CrawlArgs, Engine, JobStatus};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Engine tuned for fast tests: one quick retry, small backoff
fn test_engine() -> Engine {
    let config = EngineConfig {
        fetch: FetchConfig::default()
            .with_max_retries(1)
            .with_retry_base_delay(Duration::from_millis(5)),
        frontier: FrontierConfig::default(),
    };
    Engine::new(config).expect("failed to build engine")
}

/// Engine with a serial worker pool, for order-sensitive assertions
fn serial_engine() -> Engine {
    let config = EngineConfig {
        fetch: FetchConfig::default()
            .with_max_retries(0)
            .with_retry_base_delay(Duration::from_millis(5)),
        frontier: FrontierConfig::default()
            .with_workers(1)
            .with_per_host_concurrency(1),
    };
    Engine::new(config).expect("failed to build engine")
}

fn html_page(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body>{}</body></html>",
        title, body
    )
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body.into_bytes(), "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_stores_pages() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        html_page(
            "Home",
            &format!(
                r#"<a href="{0}/page1">Page 1</a> <a href="{0}/page2">Page 2</a>"#,
                base
            ),
        ),
    )
    .await;
    mount_page(&server, "/page1", html_page("Page 1", "<p>First content</p>")).await;
    mount_page(&server, "/page2", html_page("Page 2", "<p>Second content</p>")).await;

    let engine = test_engine();
    let result = engine
        .crawl(CrawlArgs::new(format!("{}/", base)))
        .await
        .expect("crawl failed");

    assert!(!result.crawl_id.is_empty());
    assert!(result.status_summary.starts_with("completed"));

    let status = engine.status(&result.crawl_id).expect("job not registered");
    assert_eq!(status.status, JobStatus::Completed);
    assert_eq!(status.pages_fetched, 3);
    assert_eq!(status.pages_failed, 0);

    // Stored pages are retrievable by crawl id + normalized URL
    let home = engine
        .stored_page(&result.crawl_id, &format!("{}/", base))
        .unwrap();
    assert!(home.is_some());
    assert_eq!(home.unwrap().document.title.as_deref(), Some("Home"));
}

#[tokio::test]
async fn test_partial_failure_still_completes() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        html_page(
            "Home",
            &format!(
                r#"<a href="{0}/ok">Good</a> <a href="{0}/broken">Bad</a>"#,
                base
            ),
        ),
    )
    .await;
    mount_page(&server, "/ok", html_page("Ok", "<p>fine</p>")).await;

    // The broken page always errors; retries are exhausted and the crawl
    // continues
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let engine = test_engine();
    let result = engine
        .crawl(CrawlArgs::new(format!("{}/", base)))
        .await
        .expect("crawl failed");

    let status = engine.status(&result.crawl_id).unwrap();
    assert_eq!(status.status, JobStatus::Completed, "partial failure must not fail the job");
    assert_eq!(status.pages_fetched, 2);
    assert_eq!(status.pages_failed, 1);

    // Only the seed and the reachable page were stored
    assert!(engine
        .stored_page(&result.crawl_id, &format!("{}/ok", base))
        .unwrap()
        .is_some());
    assert!(engine
        .stored_page(&result.crawl_id, &format!("{}/broken", base))
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_duplicate_links_fetch_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    // Two plain duplicates plus a tracking-parameter variant that
    // normalizes to the same URL
    mount_page(
        &server,
        "/",
        html_page(
            "Home",
            &format!(
                r#"<a href="{0}/target">One</a>
                   <a href="{0}/target">Two</a>
                   <a href="{0}/target?utm_source=feed">Three</a>"#,
                base
            ),
        ),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/target"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(html_page("Target", "<p>once</p>").into_bytes(), "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let engine = test_engine();
    let result = engine
        .crawl(CrawlArgs::new(format!("{}/", base)))
        .await
        .expect("crawl failed");

    let status = engine.status(&result.crawl_id).unwrap();
    assert_eq!(status.pages_fetched, 2);
    assert_eq!(status.pages_failed, 0);
}

#[tokio::test]
async fn test_depth_limit_enforced() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        html_page("Root", &format!(r#"<a href="{}/level1">L1</a>"#, base)),
    )
    .await;
    mount_page(
        &server,
        "/level1",
        html_page("L1", &format!(r#"<a href="{}/level2">L2</a>"#, base)),
    )
    .await;
    mount_page(
        &server,
        "/level2",
        html_page("L2", &format!(r#"<a href="{}/level3">L3</a>"#, base)),
    )
    .await;

    // Depth 3 must never be fetched with max_depth = 2
    Mock::given(method("GET"))
        .and(path("/level3"))
        .respond_with(ResponseTemplate::new(200).set_body_string("too deep"))
        .expect(0)
        .mount(&server)
        .await;

    let engine = test_engine();
    let mut args = CrawlArgs::new(format!("{}/", base));
    args.max_depth = 2;
    let result = engine.crawl(args).await.expect("crawl failed");

    let status = engine.status(&result.crawl_id).unwrap();
    assert_eq!(status.status, JobStatus::Completed);
    assert_eq!(status.pages_fetched, 3);
}

#[tokio::test]
async fn test_max_pages_enforced() {
    let server = MockServer::start().await;
    let base = server.uri();

    let links: String = (1..=6)
        .map(|i| format!(r#"<a href="{}/p{}">P{}</a>"#, base, i, i))
        .collect();
    mount_page(&server, "/", html_page("Home", &links)).await;
    for i in 1..=6 {
        mount_page(&server, &format!("/p{}", i), html_page("P", "<p>page</p>")).await;
    }

    let engine = serial_engine();
    let mut args = CrawlArgs::new(format!("{}/", base));
    args.max_pages = 3;
    let result = engine.crawl(args).await.expect("crawl failed");

    let status = engine.status(&result.crawl_id).unwrap();
    assert_eq!(status.status, JobStatus::Completed);
    assert_eq!(status.pages_fetched, 3, "page budget is a hard cap");
}

#[tokio::test]
async fn test_exclude_takes_precedence_over_include() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        html_page(
            "Home",
            &format!(
                r#"<a href="{0}/keep">Keep</a> <a href="{0}/secret/page">Secret</a>"#,
                base
            ),
        ),
    )
    .await;
    mount_page(&server, "/keep", html_page("Keep", "<p>kept</p>")).await;

    // Matches the include pattern too, but exclude wins
    Mock::given(method("GET"))
        .and(path("/secret/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("secret"))
        .expect(0)
        .mount(&server)
        .await;

    let engine = test_engine();
    let mut args = CrawlArgs::new(format!("{}/", base));
    args.include_patterns = vec![format!("{}/*", base)];
    args.exclude_patterns = vec!["*secret*".to_string()];
    let result = engine.crawl(args).await.expect("crawl failed");

    let status = engine.status(&result.crawl_id).unwrap();
    assert_eq!(status.pages_fetched, 2);
    assert!(engine
        .stored_page(&result.crawl_id, &format!("{}/secret/page", base))
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_cross_host_links_not_followed() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        html_page(
            "Home",
            &format!(
                r#"<a href="{}/local">Local</a>
                   <a href="https://elsewhere.invalid/page">External</a>"#,
                base
            ),
        ),
    )
    .await;
    mount_page(&server, "/local", html_page("Local", "<p>here</p>")).await;

    let engine = test_engine();
    let result = engine
        .crawl(CrawlArgs::new(format!("{}/", base)))
        .await
        .expect("crawl failed");

    let status = engine.status(&result.crawl_id).unwrap();
    // The external link is never enqueued: no fetch attempt, no failure
    assert_eq!(status.pages_fetched, 2);
    assert_eq!(status.pages_failed, 0);

    // The document still records the external link
    let home = engine
        .stored_page(&result.crawl_id, &format!("{}/", base))
        .unwrap()
        .unwrap();
    assert!(home
        .document
        .links
        .iter()
        .any(|l| l.as_str().starts_with("https://elsewhere.invalid/")));
}

#[tokio::test]
async fn test_timed_out_page_counts_as_failure() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        html_page(
            "Home",
            &format!(r#"<a href="{0}/a">A</a> <a href="{0}/b">B</a>"#, base),
        ),
    )
    .await;
    mount_page(&server, "/a", html_page("A", "<p>reachable</p>")).await;

    // /b answers far slower than the configured request timeout
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html_page("B", "<p>never seen</p>"))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let config = EngineConfig {
        fetch: FetchConfig::default()
            .with_timeout(Duration::from_millis(200))
            .with_max_retries(0),
        frontier: FrontierConfig::default(),
    };
    let engine = Engine::new(config).unwrap();

    let mut args = CrawlArgs::new(format!("{}/", base));
    args.max_pages = 5;
    args.max_depth = 1;
    let result = engine.crawl(args).await.expect("crawl failed");

    let status = engine.status(&result.crawl_id).unwrap();
    assert_eq!(status.status, JobStatus::Completed);
    assert_eq!(status.pages_fetched, 2);
    assert_eq!(status.pages_failed, 1);

    // The store holds the seed and /a only
    assert!(engine.stored_page(&result.crawl_id, &format!("{}/", base)).unwrap().is_some());
    assert!(engine.stored_page(&result.crawl_id, &format!("{}/a", base)).unwrap().is_some());
    assert!(engine.stored_page(&result.crawl_id, &format!("{}/b", base)).unwrap().is_none());
}

#[tokio::test]
async fn test_failing_seed_still_returns_crawl_id() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let engine = test_engine();
    let result = engine
        .crawl(CrawlArgs::new(format!("{}/", base)))
        .await
        .expect("crawl call must not fail");

    assert!(!result.crawl_id.is_empty());

    let status = engine.status(&result.crawl_id).unwrap();
    assert_eq!(status.status, JobStatus::Completed);
    assert_eq!(status.pages_fetched, 0);
    assert_eq!(status.pages_failed, 1);
}

#[tokio::test]
async fn test_cancellation_is_cooperative() {
    let server = MockServer::start().await;
    let base = server.uri();

    let links: String = (1..=8)
        .map(|i| format!(r#"<a href="{}/slow{}">S{}</a>"#, base, i, i))
        .collect();
    mount_page(&server, "/", html_page("Home", &links)).await;

    for i in 1..=8 {
        Mock::given(method("GET"))
            .and(path(format!("/slow{}", i)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(html_page("Slow", "<p>slow page</p>").into_bytes(), "text/html")
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;
    }

    let engine = serial_engine();
    let handle = engine
        .start_crawl(CrawlArgs::new(format!("{}/", base)))
        .expect("failed to start crawl");

    // The job is registered before start_crawl returns
    let status = engine.status(&handle.crawl_id).unwrap();
    assert!(!status.status.is_terminal());

    // Let the seed and the first slow page get underway, then cancel. The
    // in-flight fetch finishes normally; nothing new is dispatched.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(engine.cancel(&handle.crawl_id));

    let summary = handle.wait().await;
    assert_eq!(summary.status, JobStatus::Cancelled);
    assert!(
        summary.pages_fetched < 9,
        "cancellation must stop the crawl early, fetched {}",
        summary.pages_fetched
    );

    let status = engine.status(&summary.crawl_id).unwrap();
    assert_eq!(status.status, JobStatus::Cancelled);
}
