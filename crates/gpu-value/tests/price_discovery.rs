//! Price discovery integration tests.
//!
//! Each test stands up a local mock retailer with wiremock and drives the
//! real HTTP client against it.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as TimeDelta, Utc};
use gpu_value::{
    BaselineCache, BaselineResolver, ExtractionRule, HttpClient, ManualClock, NoQuoteReason,
    PageFetcher, ProbeOutcome, Retailer, RetailerProbe, RetailerSpec, DEFAULT_TTL,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── helpers ──

fn listing(prices: &[&str]) -> String {
    let spans: String = prices
        .iter()
        .map(|p| format!(r#"<span class="price">{p}</span>"#))
        .collect();
    format!("<html><body><div class=\"productListing\">{spans}</div></body></html>")
}

fn spec(name: &str, url: String) -> RetailerSpec {
    let mut headers = BTreeMap::new();
    headers.insert("Accept-Language".to_string(), "en-GB".to_string());
    RetailerSpec {
        retailer_name: name.to_string(),
        listing_url: url,
        request_headers: headers,
        extraction_rules: vec![ExtractionRule::Element {
            tag: "span".to_string(),
            class: "^price$".to_string(),
        }],
    }
}

async fn mount_page(server: &MockServer, route: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

fn client() -> Arc<dyn PageFetcher> {
    Arc::new(HttpClient::new(Duration::from_secs(5)).unwrap())
}

fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/gpu")
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.map(|r| r.len()).unwrap_or(0)
}

// ── probe ──

#[tokio::test]
async fn probe_quotes_cheapest_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/scan"))
        .and(header("Accept-Language", "en-GB"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&["£329.99", "£349.50"])))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/scan", server.uri());
    let retailer = Retailer::new(spec("Scan", url.clone())).unwrap();
    let outcome = RetailerProbe::new(client()).probe(&retailer).await;

    let quote = outcome.quote().expect("expected a quote");
    assert_eq!(quote.price, 329.99);
    assert_eq!(quote.source_url, url);
    assert_eq!(quote.retailer_name, "Scan");
}

#[tokio::test]
async fn probe_non_200_is_no_quote() {
    let server = MockServer::start().await;
    mount_page(&server, "/down", 503, listing(&["£300.00"])).await;

    let retailer = Retailer::new(spec("Down", format!("{}/down", server.uri()))).unwrap();
    let outcome = RetailerProbe::new(client()).probe(&retailer).await;

    assert_eq!(
        outcome,
        ProbeOutcome::NoQuote {
            retailer_name: "Down".to_string(),
            reason: NoQuoteReason::Status(503),
        }
    );
}

#[tokio::test]
async fn probe_page_without_prices_is_no_quote() {
    let server = MockServer::start().await;
    mount_page(&server, "/empty", 200, "<html><body>Out of stock</body></html>".to_string()).await;

    let retailer = Retailer::new(spec("Empty", format!("{}/empty", server.uri()))).unwrap();
    let outcome = RetailerProbe::new(client()).probe(&retailer).await;

    assert!(matches!(
        outcome,
        ProbeOutcome::NoQuote {
            reason: NoQuoteReason::NoPrices,
            ..
        }
    ));
}

#[tokio::test]
async fn probe_timeout_is_no_quote() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing(&["£300.00"]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let fast_client: Arc<dyn PageFetcher> =
        Arc::new(HttpClient::new(Duration::from_millis(200)).unwrap());
    let retailer = Retailer::new(spec("Slow", format!("{}/slow", server.uri()))).unwrap();
    let outcome = RetailerProbe::new(fast_client).probe(&retailer).await;

    assert!(matches!(
        outcome,
        ProbeOutcome::NoQuote {
            reason: NoQuoteReason::Network(_),
            ..
        }
    ));
}

#[tokio::test]
async fn probe_connection_refused_is_no_quote() {
    let retailer = Retailer::new(spec("Gone", closed_port_url())).unwrap();
    let outcome = RetailerProbe::new(client()).probe(&retailer).await;
    assert!(outcome.quote().is_none());
}

// ── resolver ──

#[tokio::test]
async fn resolve_picks_global_minimum() {
    let server = MockServer::start().await;
    mount_page(&server, "/a", 200, listing(&["£310.00", "£325.00"])).await;
    mount_page(&server, "/b", 500, String::new()).await;
    mount_page(&server, "/c", 200, listing(&["£305.50"])).await;

    let specs = vec![
        spec("Alpha", format!("{}/a", server.uri())),
        spec("Bravo", format!("{}/b", server.uri())),
        spec("Charlie", format!("{}/c", server.uri())),
    ];
    let resolver = BaselineResolver::new(client(), specs).unwrap();
    let snapshot = resolver.resolve_snapshot().await;

    assert_eq!(snapshot.price, 305.50);
    assert_eq!(snapshot.retailer_name, "Charlie");
    assert_eq!(snapshot.source_url, Some(format!("{}/c", server.uri())));
    assert!(!snapshot.is_fallback());
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn resolve_tie_goes_to_earliest_retailer() {
    let server = MockServer::start().await;
    mount_page(&server, "/a", 200, listing(&["£320.00"])).await;
    mount_page(&server, "/b", 200, listing(&["£299.00"])).await;
    mount_page(&server, "/c", 200, listing(&["£299.00", "£350.00"])).await;

    let specs = vec![
        spec("Alpha", format!("{}/a", server.uri())),
        spec("Bravo", format!("{}/b", server.uri())),
        spec("Charlie", format!("{}/c", server.uri())),
    ];
    let snapshot = BaselineResolver::new(client(), specs)
        .unwrap()
        .resolve_snapshot()
        .await;

    assert_eq!(snapshot.price, 299.00);
    assert_eq!(snapshot.retailer_name, "Bravo");
}

#[tokio::test]
async fn resolve_all_failed_uses_fallback() {
    let server = MockServer::start().await;
    mount_page(&server, "/a", 404, String::new()).await;
    mount_page(&server, "/b", 200, "<p>No results</p>".to_string()).await;

    let specs = vec![
        spec("Alpha", format!("{}/a", server.uri())),
        spec("Bravo", format!("{}/b", server.uri())),
        spec("Gone", closed_port_url()),
    ];
    let snapshot = BaselineResolver::new(client(), specs)
        .unwrap()
        .resolve_snapshot()
        .await;

    assert_eq!(snapshot.as_tuple(), (330.00, None, "Fallback"));
    assert!(snapshot.is_fallback());
}

#[tokio::test]
async fn resolve_with_no_retailers_uses_fallback() {
    let snapshot = BaselineResolver::new(client(), Vec::new())
        .unwrap()
        .with_fallback_price(315.0)
        .unwrap()
        .resolve_snapshot()
        .await;
    assert_eq!(snapshot.price, 315.0);
    assert_eq!(snapshot.retailer_name, "Fallback");
}

#[tokio::test]
async fn resolve_stamps_clock_time() {
    let start = Utc::now() - TimeDelta::days(3);
    let clock = Arc::new(ManualClock::new(start));
    let snapshot = BaselineResolver::new(client(), Vec::new())
        .unwrap()
        .with_clock(clock)
        .resolve_snapshot()
        .await;
    assert_eq!(snapshot.resolved_at, start);
}

// ── cache ──

#[tokio::test]
async fn cache_bounds_requests_to_one_cycle_per_ttl() {
    let server = MockServer::start().await;
    mount_page(&server, "/a", 200, listing(&["£339.99"])).await;
    mount_page(&server, "/b", 200, listing(&["£334.00"])).await;

    let clock = Arc::new(ManualClock::new(Utc::now()));
    let specs = vec![
        spec("Alpha", format!("{}/a", server.uri())),
        spec("Bravo", format!("{}/b", server.uri())),
    ];
    let resolver = BaselineResolver::new(client(), specs)
        .unwrap()
        .with_clock(clock.clone());
    let cache = BaselineCache::new(Arc::new(resolver), DEFAULT_TTL).with_clock(clock.clone());

    let first = cache.get().await;
    for _ in 0..5 {
        clock.advance(TimeDelta::hours(4));
        assert_eq!(cache.get().await, first);
    }
    assert_eq!(request_count(&server).await, 2);

    clock.advance(TimeDelta::hours(5));
    let refreshed = cache.get().await;
    assert_eq!(refreshed.price, 334.00);
    assert_ne!(refreshed.resolved_at, first.resolved_at);
    assert_eq!(request_count(&server).await, 4);
}

#[tokio::test]
async fn cache_concurrent_callers_share_one_cycle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing(&["£329.00"]))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let specs = vec![spec("Alpha", format!("{}/a", server.uri()))];
    let resolver = BaselineResolver::new(client(), specs).unwrap();
    let cache = Arc::new(BaselineCache::new(Arc::new(resolver), DEFAULT_TTL));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get().await })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap().price, 329.00);
    }
    assert_eq!(request_count(&server).await, 1);
}
