//! HTTP-level tests for the Seoul listing provider against a mock server.

use std::io::Read as _;
use std::net::TcpListener;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use yeyak_core::{ListingPort, ListingService, PageRange, PortError, RetryPolicy, Retryable};
use yeyak_provider_seoul::{SeoulListingPort, client};

const KEY: &str = "test-key";

fn page_path(start: u64, end: u64) -> String {
    format!("/{KEY}/json/ListPublicReservationEducation/{start}/{end}/")
}

fn listing_body(total: Value, ids: &[&str]) -> Value {
    let rows: Vec<Value> = ids
        .iter()
        .map(|id| json!({ "SVCID": id, "AREANM": "강남구", "SVCSTATNM": "접수중" }))
        .collect();
    json!({
        "ListPublicReservationEducation": {
            "list_total_count": total,
            "RESULT": { "CODE": "INFO-000", "MESSAGE": "정상 처리되었습니다" },
            "row": rows,
        }
    })
}

fn seoul_port(server: &MockServer, timeout: Duration) -> SeoulListingPort {
    let http = client(timeout).expect("client");
    SeoulListingPort::new(http, server.uri(), KEY)
}

fn instant_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::ZERO,
    }
}

#[tokio::test]
async fn fetch_page_reads_rows_and_string_total() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(page_path(1, 1000)))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_body(json!("2500"), &["S1", "S2"])))
        .expect(1)
        .mount(&server)
        .await;

    let port = seoul_port(&server, Duration::from_secs(5));
    let page = port
        .fetch_page(PageRange::page(1, 1000))
        .await
        .expect("page");

    assert_eq!(page.total_count, 2500);
    assert_eq!(page.rows.len(), 2);
}

#[tokio::test]
async fn client_error_is_fatal_and_hides_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(page_path(1, 1000)))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let port = seoul_port(&server, Duration::from_secs(5));
    let err = port
        .fetch_page(PageRange::page(1, 1000))
        .await
        .expect_err("should fail");

    assert!(matches!(err, PortError::Status { status: 401, .. }));
    assert!(!err.is_retryable());
    assert!(!err.to_string().contains(KEY));
}

#[tokio::test]
async fn invalid_body_is_a_retryable_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(page_path(1, 1000)))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let port = seoul_port(&server, Duration::from_secs(5));
    let err = port
        .fetch_page(PageRange::page(1, 1000))
        .await
        .expect_err("should fail");

    assert!(matches!(err, PortError::Decode(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn slow_response_times_out_as_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(listing_body(json!(1), &["S1"]))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let port = seoul_port(&server, Duration::from_millis(50));
    let err = port
        .fetch_page(PageRange::page(1, 1000))
        .await
        .expect_err("should time out");

    assert!(matches!(err, PortError::Network(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn service_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(page_path(1, 1000)))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(page_path(1, 1000)))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_body(json!(1), &["S1"])))
        .expect(1)
        .mount(&server)
        .await;

    let port: Arc<dyn ListingPort> = Arc::new(seoul_port(&server, Duration::from_secs(5)));
    let records = ListingService::new(port, 1000, instant_retry())
        .fetch_all()
        .await
        .expect("fetch");

    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn service_gives_up_after_three_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(page_path(1, 1000)))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_body(json!(2500), &["S1"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(page_path(1001, 2000)))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(page_path(2001, 3000)))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_body(json!(2500), &["S3"])))
        .expect(0)
        .mount(&server)
        .await;

    let port: Arc<dyn ListingPort> = Arc::new(seoul_port(&server, Duration::from_secs(5)));
    let err = ListingService::new(port, 1000, instant_retry())
        .fetch_all()
        .await
        .expect_err("should fail");

    assert_eq!(err.range, PageRange::page(2, 1000));
    assert_eq!(err.attempts, 3);
}

#[tokio::test]
async fn service_walks_counted_pages() {
    let server = MockServer::start().await;
    for (start, end, ids) in [
        (1, 1000, vec!["A", "B"]),
        (1001, 2000, vec!["C"]),
        (2001, 3000, vec!["D"]),
    ] {
        Mock::given(method("GET"))
            .and(path(page_path(start, end)))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing_body(json!(2500), &ids)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let port: Arc<dyn ListingPort> = Arc::new(seoul_port(&server, Duration::from_secs(5)));
    let records = ListingService::new(port, 1000, instant_retry())
        .fetch_all()
        .await
        .expect("fetch");

    assert_eq!(records.len(), 4);
}

#[tokio::test]
async fn service_retries_dropped_connections() {
    // Accepts each connection, reads the request and hangs up without answering.
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&accepted);
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            counter.fetch_add(1, Ordering::SeqCst);
            let mut buf = [0_u8; 1024];
            let _read = stream.read(&mut buf);
            drop(stream);
        }
    });

    let http = client(Duration::from_secs(5)).expect("client");
    let port: Arc<dyn ListingPort> =
        Arc::new(SeoulListingPort::new(http, format!("http://{addr}"), KEY));
    let err = ListingService::new(port, 1000, instant_retry())
        .fetch_all()
        .await
        .expect_err("should fail");

    assert!(matches!(err.source, PortError::Network(_)), "{err}");
    assert!(err.source.is_retryable());
    assert_eq!(err.attempts, 3);
    assert_eq!(accepted.load(Ordering::SeqCst), 3);
}
