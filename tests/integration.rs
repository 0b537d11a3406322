//! End-to-end tests against a mock search index and mock web pages

use axum::body::Body;
use axum::http::{Request, StatusCode};
use search_context::config::Settings;
use search_context::engines::GoogleCustomSearch;
use search_context::extract::ContentExtractor;
use search_context::fetcher::ContentFetcher;
use search_context::network::{HttpClient, PageClient};
use search_context::results::SkipReason;
use search_context::search::{Credentials, SearchBackend, SearchResultFetcher};
use search_context::web::{create_router, AppState, ContextResponse};
use search_context::FetchOutcome;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ARTICLE: &str = r#"<html><head><title>Ownership</title></head><body>
    <nav>Home Blog Contact</nav>
    <article>
      <h1>Understanding ownership</h1>
      <p>Rust tracks ownership statically. Every value has exactly one owner,
         borrowing lends access without moving, lifetimes describe how long
         references remain valid.</p>
    </article>
    <footer>Copyright</footer>
  </body></html>"#;

fn search_body(server: &MockServer, pages: &[(&str, &str)]) -> serde_json::Value {
    let items: Vec<_> = pages
        .iter()
        .map(|(title, page)| json!({ "title": title, "link": format!("{}{}", server.uri(), page) }))
        .collect();
    json!({ "kind": "customsearch#search", "items": items })
}

fn settings_for(server: &MockServer) -> Settings {
    let mut settings = Settings::default();
    settings.search.endpoint = format!("{}/customsearch/v1", server.uri());
    settings
}

fn fetcher(settings: &Settings) -> ContentFetcher {
    let client = HttpClient::with_settings(&settings.outgoing).unwrap();
    let extractor =
        Arc::new(ContentExtractor::new(&settings.extraction, &settings.filter).unwrap());
    ContentFetcher::with_settings(Arc::new(client), extractor, &settings.fetch)
}

#[tokio::test]
async fn test_search_returns_items_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("q", "rust ownership"))
        .and(query_param("key", "secret"))
        .and(query_param("cx", "engine"))
        .and(query_param("num", "10"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(search_body(&server, &[("First", "/one"), ("Second", "/two")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let settings = settings_for(&server);
    let client = HttpClient::with_settings(&settings.outgoing).unwrap();
    let search = SearchResultFetcher::new(
        client,
        Arc::new(GoogleCustomSearch::with_endpoint(settings.search.endpoint.as_str())),
    );

    let items = search
        .search("rust ownership", &Credentials::new("secret", "engine"))
        .await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "First");
    assert_eq!(items[0].link, format!("{}/one", server.uri()));
    assert_eq!(items[1].title, "Second");
}

#[tokio::test]
async fn test_search_error_degrades_to_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let settings = settings_for(&server);
    let client = HttpClient::with_settings(&settings.outgoing).unwrap();
    let search = SearchResultFetcher::new(
        client,
        Arc::new(GoogleCustomSearch::with_endpoint(settings.search.endpoint.as_str())),
    );

    let items = search.search("rust", &Credentials::new("k", "cx")).await;
    assert!(items.is_empty());
    assert!(search.try_fetch("rust", &Credentials::new("k", "cx")).await.is_err());
}

#[tokio::test]
async fn test_fetch_html_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ARTICLE, "text/html; charset=utf-8"))
        .expect(1)
        .mount(&server)
        .await;

    let settings = settings_for(&server);
    let outcome = fetcher(&settings)
        .fetch(&format!("{}/article", server.uri()), Duration::from_secs(5))
        .await;

    let page = outcome.into_page().expect("page should be extracted");
    assert!(page.text.starts_with("Understanding ownership Rust tracks ownership statically."));
    assert!(!page.text.contains("Copyright"));
    assert!(!page.text.contains("Contact"));
}

#[tokio::test]
async fn test_fetch_non_html_is_skipped_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/report"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF-1.7", "application/pdf"))
        .expect(1)
        .mount(&server)
        .await;

    let settings = settings_for(&server);
    let outcome = fetcher(&settings)
        .fetch(&format!("{}/report", server.uri()), Duration::from_secs(5))
        .await;

    assert_eq!(outcome, FetchOutcome::Skipped(SkipReason::UnsupportedContentType));
}

#[tokio::test]
async fn test_fetch_not_found_fails_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let settings = settings_for(&server);
    let outcome = fetcher(&settings)
        .fetch(&format!("{}/gone", server.uri()), Duration::from_secs(5))
        .await;

    assert!(matches!(outcome, FetchOutcome::Failed(_)));
}

#[tokio::test]
async fn test_binary_body_is_not_downloaded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blob"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(vec![0u8; 256 * 1024], "application/octet-stream"),
        )
        .expect(2)
        .mount(&server)
        .await;

    let settings = settings_for(&server);
    let url = format!("{}/blob", server.uri());

    let client = HttpClient::with_settings(&settings.outgoing).unwrap();
    let response = client.get_page(&url, Duration::from_secs(5)).await.unwrap();
    assert_eq!(response.status, 200);
    assert!(response.text.is_empty());

    let outcome = fetcher(&settings).fetch(&url, Duration::from_secs(5)).await;
    assert_eq!(outcome, FetchOutcome::Skipped(SkipReason::UnsupportedContentType));
}

#[tokio::test]
async fn test_page_body_is_capped() {
    let server = MockServer::start().await;
    let body = format!("<html><body><p>{}</p></body></html>", "x".repeat(10_000));
    Mock::given(method("GET"))
        .and(path("/long"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(&server)
        .await;

    let mut settings = settings_for(&server);
    settings.outgoing.max_page_bytes = 64;
    let client = HttpClient::with_settings(&settings.outgoing).unwrap();

    let response = client
        .get_page(&format!("{}/long", server.uri()), Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(response.text.len(), 64);
    assert!(response.text.starts_with("<html><body><p>xxx"));
}

#[tokio::test]
async fn test_out_of_range_timeout_is_a_startup_error() {
    let server = MockServer::start().await;
    let mut settings = settings_for(&server);
    settings.aggregation.global_timeout = -1.0;

    let client = HttpClient::with_settings(&settings.outgoing).unwrap();
    assert!(AppState::new(settings, client).is_err());
}

#[tokio::test]
async fn test_context_endpoint_rejects_invalid_body() {
    let server = MockServer::start().await;
    let settings = settings_for(&server);
    let client = HttpClient::with_settings(&settings.outgoing).unwrap();
    let app = create_router(AppState::new(settings, client).unwrap());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/context")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"queries":[],"apiKey":"k","searchEngineId":"cx"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn test_context_endpoint_builds_corpus() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(
            &server,
            &[("Ownership", "/article"), ("Manual", "/manual.pdf")],
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ARTICLE, "text/html"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/manual.pdf"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let settings = settings_for(&server);
    let client = HttpClient::with_settings(&settings.outgoing).unwrap();
    let state = AppState::new(settings, client).unwrap();
    let app = create_router(state.clone());

    let request = json!({
        "queries": ["rust ownership"],
        "apiKey": "k",
        "searchEngineId": "cx",
        "maxTotalChars": 5000
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/context")
                .header("content-type", "application/json")
                .body(Body::from(request.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: ContextResponse = serde_json::from_slice(&body).unwrap();

    assert!(body
        .context_data
        .starts_with("## Search results for \"rust ownership\"\n\nTitle: Ownership\n"));
    assert!(body.context_data.contains("Content: Understanding ownership"));
    assert!(body.context_data.ends_with("---\n\n"));
    assert!(body.context_data.chars().count() <= 5000);

    let stats = state.metrics.snapshot();
    assert_eq!(stats.aggregations, 1);
    assert_eq!(stats.searches, 1);
    assert_eq!(stats.fetch_successes, 1);
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = MockServer::start().await;
    let settings = settings_for(&server);
    let client = HttpClient::with_settings(&settings.outgoing).unwrap();
    let app = create_router(AppState::new(settings, client).unwrap());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
