use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::body::{to_bytes, Body};
use axum::extract::State;
use axum::http::{header, Request, StatusCode, Uri};
use axum::Router;
use tower::ServiceExt;

use nnfcm_exporter::aggregate::Aggregator;
use nnfcm_exporter::config::SourceConfig;
use nnfcm_exporter::control::ScrapeAdmission;
use nnfcm_exporter::router::{create_exporter_router, Exporter};
use nnfcm_exporter::scrape::Scraper;
use nnfcm_exporter::transport::UpstreamClient;

const SELECTOR: &str = "op1";

/// Canned upstream answering by path and query string.
#[derive(Clone, Default)]
struct MockUpstream {
    routes: Arc<RwLock<HashMap<String, (StatusCode, String)>>>,
}

impl MockUpstream {
    async fn spawn() -> (Self, u16) {
        let mock = MockUpstream::default();
        let app = Router::new().fallback(answer).with_state(mock.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (mock, port)
    }

    fn stats(&self, category: &str, status: StatusCode, body: &str) {
        self.set(
            &format!("/nnfcm-statistics/v2/stats/{category}?operatorIdentifier={SELECTOR}"),
            status,
            body,
        );
    }

    fn monitoring(&self, category: &str, body: &str) {
        self.set(
            &format!("/nnfcm-monitoring/v2/{category}?operatorIdentifier={SELECTOR}"),
            StatusCode::OK,
            body,
        );
    }

    fn set(&self, path: &str, status: StatusCode, body: &str) {
        self.routes
            .write()
            .unwrap()
            .insert(path.to_string(), (status, body.to_string()));
    }

    fn clear(&self) {
        self.routes.write().unwrap().clear();
    }
}

async fn answer(State(mock): State<MockUpstream>, uri: Uri) -> (StatusCode, String) {
    let key = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default();
    mock.routes
        .read()
        .unwrap()
        .get(&key)
        .cloned()
        .unwrap_or((StatusCode::NOT_FOUND, "not found".to_string()))
}

fn source(port: u16, categories: &[&str]) -> SourceConfig {
    SourceConfig {
        address: "127.0.0.1".to_string(),
        port,
        categories: categories.iter().map(|c| c.to_string()).collect(),
    }
}

fn exporter(statistics: Option<SourceConfig>, monitoring: Option<SourceConfig>) -> Router {
    let scraper = Scraper::new(
        Aggregator::new(UpstreamClient::default(), SELECTOR),
        statistics,
        monitoring,
    );
    create_exporter_router(Arc::new(Exporter::new(scraper, ScrapeAdmission::default())))
}

async fn get(app: &Router, path: &str) -> (StatusCode, Option<String>, String) {
    let resp = app
        .clone()
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn statistics_categories_are_qualified() {
    let (upstream, port) = MockUpstream::spawn().await;
    upstream.stats("Q", StatusCode::OK, r#"{"A": {"x": 3}, "B": {"x": 4}}"#);

    let app = exporter(Some(source(port, &["Q"])), None);
    let (status, content_type, body) = get(&app, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/plain"));
    assert!(body.contains("# TYPE Q_A_x gauge"));
    assert!(body.contains("Q_A_x 3"));
    assert!(body.contains("Q_B_x 4"));
}

#[tokio::test]
async fn repeated_statistics_are_summed() {
    let (upstream, port) = MockUpstream::spawn().await;
    upstream.stats("Q", StatusCode::OK, r#"{"A": {"x": 2}}"#);

    let app = exporter(Some(source(port, &["Q", "Q"])), None);
    let (status, _, body) = get(&app, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Q_A_x 4"));
}

#[tokio::test]
async fn failing_category_is_skipped() {
    let (upstream, port) = MockUpstream::spawn().await;
    upstream.stats("A", StatusCode::OK, r#"{"in": {"pkts": 5}}"#);
    upstream.stats("B", StatusCode::INTERNAL_SERVER_ERROR, "boom");
    upstream.stats("C", StatusCode::OK, "not json");

    let app = exporter(Some(source(port, &["A", "B", "C"])), None);
    let (status, _, body) = get(&app, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("A_in_pkts 5"));
    assert!(!body.contains("B_"));
    assert!(!body.contains("C_"));
}

#[tokio::test]
async fn monitoring_values_are_coerced() {
    let (upstream, port) = MockUpstream::spawn().await;
    upstream.monitoring(
        "links",
        r#"{"rx": "120 bps", "tx": "3.9 Mbps", "state": "abc"}"#,
    );

    let app = exporter(None, Some(source(port, &["links"])));
    let (status, _, body) = get(&app, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("links_rx 120"));
    assert!(body.contains("links_tx 3"));
    assert!(!body.contains("links_state"));
}

#[tokio::test]
async fn both_sources_are_combined() {
    let (stats, stats_port) = MockUpstream::spawn().await;
    stats.stats("ports", StatusCode::OK, r#"{"eth0": {"errors": 1}}"#);
    let (mon, mon_port) = MockUpstream::spawn().await;
    mon.monitoring("cpu", r#"{"load": "42.5 %"}"#);

    let app = exporter(
        Some(source(stats_port, &["ports"])),
        Some(source(mon_port, &["cpu"])),
    );
    let (status, _, body) = get(&app, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("ports_eth0_errors 1"));
    assert!(body.contains("cpu_load 42"));
}

#[tokio::test]
async fn no_configuration_is_bad_request() {
    let app = exporter(Some(source(0, &[])), Some(source(0, &[])));
    let (status, _, body) = get(&app, "/metrics").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("No valid configuration"));
}

#[tokio::test]
async fn sources_without_data_are_bad_request() {
    let (_upstream, port) = MockUpstream::spawn().await;

    let app = exporter(Some(source(port, &["missing"])), None);
    let (status, _, body) = get(&app, "/metrics").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!body.is_empty());
}

#[tokio::test]
async fn unusable_source_does_not_hide_the_other() {
    let (upstream, port) = MockUpstream::spawn().await;
    upstream.stats("Q", StatusCode::OK, r#"{"A": {"x": 4}}"#);
    let bad_monitoring = SourceConfig {
        address: "mon host".to_string(),
        port: 8081,
        categories: vec!["links".to_string()],
    };

    let app = exporter(Some(source(port, &["Q"])), Some(bad_monitoring));
    let (status, _, body) = get(&app, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Q_A_x 4"));
    assert!(!body.contains("links_"));
}

#[tokio::test]
async fn only_unusable_sources_is_bad_request() {
    let bad = SourceConfig {
        address: "bad host".to_string(),
        port: 8080,
        categories: vec!["Q".to_string()],
    };
    let app = exporter(Some(bad), None);
    let (status, _, body) = get(&app, "/metrics").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("No valid configuration"));
}

#[tokio::test]
async fn registry_is_rebuilt_between_scrapes() {
    let (upstream, port) = MockUpstream::spawn().await;
    upstream.stats("Q", StatusCode::OK, r#"{"A": {"x": 4}}"#);

    let app = exporter(Some(source(port, &["Q"])), None);
    let (_, _, first) = get(&app, "/metrics").await;
    assert!(first.contains("Q_A_x 4"));

    upstream.clear();
    upstream.stats("Q", StatusCode::OK, r#"{"B": {"y": 1}}"#);
    let (status, _, second) = get(&app, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(second.contains("Q_B_y 1"));
    assert!(!second.contains("Q_A_x"));
}

#[tokio::test]
async fn health_is_ok() {
    let app = exporter(None, None);
    let (status, _, _) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
}
