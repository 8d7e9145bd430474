//! Integration tests for the crawl-job client
//!
//! These tests use wiremock to stand in for the crawl service and check
//! the submit and polling protocol end-to-end.

use crawl_pilot::client::{CrawlClient, NoopObserver, PollProgress};
use crawl_pilot::config::{ApiKey, Config};
use crawl_pilot::job::{CrawlJobHandle, CrawlOutcome, CrawlRequest, PollPolicy};
use crawl_pilot::{CrawlError, PollError, SubmitError};
use serde_json::json;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "fc-test-key";
const JOB_ID: &str = "job-123";

/// Creates a client pointed at the mock server
fn create_client(server: &MockServer) -> CrawlClient {
    let mut config = Config::default();
    config.api.base_url = server.uri();
    config.api.request_timeout_secs = 5;
    CrawlClient::new(&config, ApiKey::new(API_KEY)).expect("Failed to build client")
}

/// A short policy so tests finish quickly
fn fast_policy(max_attempts: u32) -> PollPolicy {
    PollPolicy::new(Duration::from_millis(20), max_attempts)
}

/// Mounts a status response that is served exactly once, in mount order
async fn mount_status_once(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/v2/crawl/{}", JOB_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

async fn status_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .expect("Request recording is enabled")
        .iter()
        .filter(|r| r.method.to_string() == "GET")
        .count()
}

#[tokio::test]
async fn test_submit_sends_exact_payload_with_bearer_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/crawl"))
        .and(header("authorization", "Bearer fc-test-key"))
        .and(body_json(json!({
            "url": "https://docs.example.com",
            "sitemap": "include",
            "crawlEntireDomain": true,
            "limit": 25,
            "scrapeOptions": {
                "onlyMainContent": false,
                "maxAge": 172800000u64,
                "parsers": ["pdf"],
                "formats": ["markdown"]
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "id": JOB_ID,
            "url": "https://api.example.com/v2/crawl/job-123"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let request = CrawlRequest::new("https://docs.example.com", 25)
        .crawl_entire_domain(true)
        .include_sitemap(true)
        .only_main_content(false);

    let handle = client.submit(&request).await.expect("Submit failed");
    assert_eq!(handle.id(), JOB_ID);
}

#[tokio::test]
async fn test_submit_without_credential_makes_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": JOB_ID})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = Config::default();
    config.api.base_url = mock_server.uri();
    let client = CrawlClient::new(&config, None).unwrap();

    let result = client
        .submit(&CrawlRequest::new("https://example.com", 1))
        .await;

    assert!(matches!(result, Err(SubmitError::Config(_))));
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_submit_invalid_request_makes_no_request() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server);

    let empty_url = client.submit(&CrawlRequest::new("", 5)).await;
    assert!(matches!(empty_url, Err(SubmitError::InvalidRequest(_))));

    let over_limit = client
        .submit(&CrawlRequest::new("https://example.com", 51))
        .await;
    assert!(matches!(over_limit, Err(SubmitError::InvalidRequest(_))));

    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_submit_remote_error_carries_status_and_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/crawl"))
        .respond_with(ResponseTemplate::new(402).set_body_string("Payment required"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let result = client
        .submit(&CrawlRequest::new("https://example.com", 1))
        .await;

    match result {
        Err(SubmitError::Remote { status_code, body }) => {
            assert_eq!(status_code, 402);
            assert_eq!(body, "Payment required");
        }
        other => panic!("Expected remote error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_submit_without_job_id_is_protocol_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/crawl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let result = client
        .submit(&CrawlRequest::new("https://example.com", 1))
        .await;

    assert!(matches!(result, Err(SubmitError::Protocol { .. })));
}

#[tokio::test]
async fn test_submit_transport_error() {
    // Nothing listens on the reserved port 9 on localhost
    let mut config = Config::default();
    config.api.base_url = "http://127.0.0.1:9".to_string();
    config.api.request_timeout_secs = 2;
    let client = CrawlClient::new(&config, ApiKey::new(API_KEY)).unwrap();

    let result = client
        .submit(&CrawlRequest::new("https://example.com", 1))
        .await;

    assert!(matches!(result, Err(SubmitError::Transport { .. })));
}

/// Creates a client whose requests give up after one second
fn create_impatient_client(server: &MockServer) -> CrawlClient {
    let mut config = Config::default();
    config.api.base_url = server.uri();
    config.api.request_timeout_secs = 1;
    CrawlClient::new(&config, ApiKey::new(API_KEY)).expect("Failed to build client")
}

#[tokio::test]
async fn test_submit_times_out_on_slow_service() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/crawl"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": JOB_ID}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let client = create_impatient_client(&mock_server);
    let started = Instant::now();
    let result = client
        .submit(&CrawlRequest::new("https://example.com", 1))
        .await;

    match result {
        Err(SubmitError::Transport { source, .. }) => assert!(source.is_timeout()),
        other => panic!("Expected a transport timeout, got {:?}", other),
    }
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_status_query_times_out_on_slow_service() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/v2/crawl/{}", JOB_ID)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "completed"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let client = create_impatient_client(&mock_server);
    let result = client
        .poll_until_terminal(&CrawlJobHandle::new(JOB_ID), fast_policy(3), &NoopObserver)
        .await;

    match result {
        Err(PollError::Transport { source, .. }) => assert!(source.is_timeout()),
        other => panic!("Expected a transport timeout, got {:?}", other),
    }
    // A transport failure ends polling; there is no retry
    assert_eq!(status_requests(&mock_server).await, 1);
}

#[tokio::test]
async fn test_poll_encodes_job_id_as_one_path_segment() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/crawl/a%2Fb%3Fc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "completed"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let outcome = client
        .poll_until_terminal(&CrawlJobHandle::new("a/b?c"), fast_policy(1), &NoopObserver)
        .await
        .expect("Encoded id should reach the status endpoint");

    assert!(matches!(outcome, CrawlOutcome::Success { .. }));

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.query(), None);
}

#[tokio::test]
async fn test_poll_rejects_dot_job_id_without_request() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server);

    let result = client
        .poll_until_terminal(&CrawlJobHandle::new(".."), fast_policy(2), &NoopObserver)
        .await;

    assert!(matches!(result, Err(PollError::InvalidJobId { .. })));
    assert_eq!(status_requests(&mock_server).await, 0);
}

#[tokio::test]
async fn test_poll_stops_at_completed() {
    let mock_server = MockServer::start().await;

    mount_status_once(&mock_server, json!({"status": "queued"})).await;
    mount_status_once(&mock_server, json!({"status": "scraping"})).await;
    mount_status_once(
        &mock_server,
        json!({
            "status": "completed",
            "data": [{"url": "https://example.com", "markdown": "# Home"}]
        }),
    )
    .await;

    let client = create_client(&mock_server);
    let handle = CrawlJobHandle::new(JOB_ID);

    let outcome = client
        .poll_until_terminal(&handle, fast_policy(10), &NoopObserver)
        .await
        .expect("Polling failed");

    match outcome {
        CrawlOutcome::Success { pages, raw } => {
            assert_eq!(pages.len(), 1);
            assert_eq!(pages[0].markdown.as_deref(), Some("# Home"));
            assert_eq!(raw["status"], "completed");
        }
        other => panic!("Expected success, got {:?}", other),
    }

    // No fourth poll after the terminal status
    assert_eq!(status_requests(&mock_server).await, 3);
}

#[tokio::test]
async fn test_poll_sends_bearer_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/v2/crawl/{}", JOB_ID)))
        .and(header("authorization", "Bearer fc-test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "completed"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let outcome = client
        .poll_until_terminal(&CrawlJobHandle::new(JOB_ID), fast_policy(3), &NoopObserver)
        .await
        .unwrap();

    // A completed body without data is a success with no pages
    assert!(matches!(outcome, CrawlOutcome::Success { ref pages, .. } if pages.is_empty()));
}

#[tokio::test]
async fn test_poll_times_out_after_max_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/v2/crawl/{}", JOB_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "scraping"})))
        .expect(4)
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let handle = CrawlJobHandle::new(JOB_ID);

    let outcome = client
        .poll_until_terminal(&handle, fast_policy(4), &NoopObserver)
        .await
        .expect("Timing out is not an error");

    match outcome {
        CrawlOutcome::TimedOut {
            handle: timed_out,
            attempts,
            budget,
            last_status,
            raw,
        } => {
            assert_eq!(timed_out.id(), JOB_ID);
            assert_eq!(attempts, 4);
            assert_eq!(budget, fast_policy(4).budget());
            assert_eq!(last_status.as_deref(), Some("scraping"));
            assert!(raw.is_some());
        }
        other => panic!("Expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_poll_waits_between_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/v2/crawl/{}", JOB_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "queued"})))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let interval = Duration::from_millis(100);
    let policy = PollPolicy::new(interval, 3);

    let started = Instant::now();
    let outcome = client
        .poll_until_terminal(&CrawlJobHandle::new(JOB_ID), policy, &NoopObserver)
        .await
        .unwrap();

    assert!(matches!(outcome, CrawlOutcome::TimedOut { .. }));
    // Three polls, two waits in between
    assert!(started.elapsed() >= interval * 2);
    assert_eq!(status_requests(&mock_server).await, 3);
}

#[tokio::test]
async fn test_poll_failed_with_message() {
    let mock_server = MockServer::start().await;
    mount_status_once(
        &mock_server,
        json!({"status": "failed", "error": "robots.txt disallowed"}),
    )
    .await;

    let client = create_client(&mock_server);
    let outcome = client
        .poll_until_terminal(&CrawlJobHandle::new(JOB_ID), fast_policy(5), &NoopObserver)
        .await
        .unwrap();

    match outcome {
        CrawlOutcome::Failure { message, .. } => assert_eq!(message, "robots.txt disallowed"),
        other => panic!("Expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_poll_failed_without_message() {
    let mock_server = MockServer::start().await;
    mount_status_once(&mock_server, json!({"status": "failed"})).await;

    let client = create_client(&mock_server);
    let outcome = client
        .poll_until_terminal(&CrawlJobHandle::new(JOB_ID), fast_policy(5), &NoopObserver)
        .await
        .unwrap();

    match outcome {
        CrawlOutcome::Failure { message, .. } => assert_eq!(message, "Unknown error"),
        other => panic!("Expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_completed_pages_keep_their_own_content_field() {
    let mock_server = MockServer::start().await;
    mount_status_once(
        &mock_server,
        json!({
            "status": "completed",
            "data": [
                {"url": "https://a", "markdown": "# A"},
                {"url": "https://b", "content": "plain B"}
            ]
        }),
    )
    .await;

    let client = create_client(&mock_server);
    let outcome = client
        .poll_until_terminal(&CrawlJobHandle::new(JOB_ID), fast_policy(5), &NoopObserver)
        .await
        .unwrap();

    let pages = outcome.pages();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].source_url(), Some("https://a"));
    assert_eq!(pages[0].markdown.as_deref(), Some("# A"));
    assert_eq!(pages[0].content, None);
    assert_eq!(pages[1].source_url(), Some("https://b"));
    assert_eq!(pages[1].markdown, None);
    assert_eq!(pages[1].content.as_deref(), Some("plain B"));
}

#[tokio::test]
async fn test_status_query_failure_stops_immediately() {
    let mock_server = MockServer::start().await;

    mount_status_once(&mock_server, json!({"status": "scraping"})).await;
    Mock::given(method("GET"))
        .and(path(format!("/v2/crawl/{}", JOB_ID)))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    // A long interval would make this test slow if the failure waited
    let policy = PollPolicy::new(Duration::from_millis(50), 10);

    let started = Instant::now();
    let result = client
        .poll_until_terminal(&CrawlJobHandle::new(JOB_ID), policy, &NoopObserver)
        .await;

    match result {
        Err(PollError::StatusQueryFailed {
            job_id,
            status_code,
            body,
        }) => {
            assert_eq!(job_id, JOB_ID);
            assert_eq!(status_code, 503);
            assert_eq!(body, "upstream down");
        }
        other => panic!("Expected status query failure, got {:?}", other),
    }

    assert_eq!(status_requests(&mock_server).await, 2);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_malformed_status_is_protocol_error() {
    let mock_server = MockServer::start().await;
    mount_status_once(&mock_server, json!({"data": []})).await;

    let client = create_client(&mock_server);
    let result = client
        .poll_until_terminal(&CrawlJobHandle::new(JOB_ID), fast_policy(5), &NoopObserver)
        .await;

    assert!(matches!(result, Err(PollError::Protocol { .. })));
}

#[tokio::test]
async fn test_observer_sees_each_non_terminal_label() {
    let mock_server = MockServer::start().await;

    mount_status_once(&mock_server, json!({"status": "queued"})).await;
    mount_status_once(&mock_server, json!({"status": "scraping"})).await;
    mount_status_once(&mock_server, json!({"status": "completed", "data": []})).await;

    let client = create_client(&mock_server);
    let seen = Mutex::new(Vec::new());
    let observer = |progress: &PollProgress| {
        seen.lock()
            .unwrap()
            .push((progress.attempt, progress.label.clone()));
    };

    client
        .poll_until_terminal(&CrawlJobHandle::new(JOB_ID), fast_policy(5), &observer)
        .await
        .unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![(1, "queued".to_string()), (2, "scraping".to_string())]
    );
}

#[tokio::test]
async fn test_channel_observer_receives_progress() {
    let mock_server = MockServer::start().await;

    mount_status_once(&mock_server, json!({"status": "scraping"})).await;
    mount_status_once(&mock_server, json!({"status": "completed"})).await;

    let client = create_client(&mock_server);
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<PollProgress>();

    client
        .poll_until_terminal(&CrawlJobHandle::new(JOB_ID), fast_policy(5), &tx)
        .await
        .unwrap();
    drop(tx);

    let progress = rx.recv().await.expect("One progress update");
    assert_eq!(progress.job_id, JOB_ID);
    assert_eq!(progress.label, "scraping");
    assert_eq!(progress.max_attempts, 5);
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_crawl_submits_then_polls() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/crawl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": JOB_ID})))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_status_once(&mock_server, json!({"status": "scraping"})).await;
    mount_status_once(
        &mock_server,
        json!({"status": "completed", "data": [{"url": "https://example.com", "content": "hi"}]}),
    )
    .await;

    let client = create_client(&mock_server);
    let outcome = client
        .crawl(
            &CrawlRequest::new("https://example.com", 3),
            fast_policy(5),
            &NoopObserver,
        )
        .await
        .expect("Crawl failed");

    assert_eq!(outcome.pages().len(), 1);
}

#[tokio::test]
async fn test_crawl_surfaces_submit_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/crawl"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let result = client
        .crawl(
            &CrawlRequest::new("https://example.com", 3),
            fast_policy(5),
            &NoopObserver,
        )
        .await;

    assert!(matches!(
        result,
        Err(CrawlError::Submit(SubmitError::Remote {
            status_code: 401,
            ..
        }))
    ));
    assert_eq!(status_requests(&mock_server).await, 0);
}

#[tokio::test]
async fn test_scrape_single_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/scrape"))
        .and(header("authorization", "Bearer fc-test-key"))
        .and(body_json(json!({
            "url": "https://example.com/about",
            "onlyMainContent": true,
            "maxAge": 172800000u64,
            "parsers": ["pdf"],
            "formats": ["markdown"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "markdown": "# About",
                "metadata": {"title": "About us", "sourceURL": "https://example.com/about"}
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let scraped = client
        .scrape("https://example.com/about", true)
        .await
        .expect("Scrape failed");

    assert_eq!(scraped.page.markdown.as_deref(), Some("# About"));
    assert_eq!(scraped.page.title(), Some("About us"));
    assert_eq!(scraped.page.source_url(), Some("https://example.com/about"));
    assert_eq!(scraped.raw["success"], true);
}

#[tokio::test]
async fn test_scrape_reported_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/scrape"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "Site not supported"
        })))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let result = client.scrape("https://example.com", true).await;

    match result {
        Err(SubmitError::Protocol { message, .. }) => assert_eq!(message, "Site not supported"),
        other => panic!("Expected protocol error, got {:?}", other),
    }
}
