use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use metrics_util::debugging::DebuggingRecorder;
use reqwest::Url;
use tower::ServiceExt;
use unevent::application::content::{ListingService, UpsertListingCommand};
use unevent::application::notify::{TagFanout, TagNotifier};
use unevent::application::repos::ListingsRepo;
use unevent::application::revalidation::RevalidationService;
use unevent::cache::{CacheConfig, HomeStamp, ListingCollection, MemoryStore, PageCache};
use unevent::infra::http::{FrontendState, build_frontend_router};
use unevent::infra::memory::MemoryRepositories;
use unevent::infra::outbound::{RevalidationClient, build_client};

#[tokio::test]
async fn revalidation_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");
    unevent::infra::telemetry::describe_metrics();

    // Listing writes fan out through an unconfigured client: skipped outcome.
    let unconfigured: Arc<dyn TagNotifier> = Arc::new(RevalidationClient::new(
        build_client(Duration::from_secs(1)).expect("client"),
        None,
        None,
    ));
    let repos: Arc<dyn ListingsRepo> = Arc::new(MemoryRepositories::new());
    let listings = ListingService::new(repos, TagFanout::new(vec![unconfigured]));
    listings
        .upsert_listing(UpsertListingCommand {
            id: None,
            tenant: "Acme".to_string(),
            collection: ListingCollection::Venues,
            slug: "blue-hall".to_string(),
            title: "Blue Hall".to_string(),
            city: "Cluj".to_string(),
            taxonomies: Vec::new(),
            featured: true,
        })
        .await
        .expect("listing upsert");

    // Outbound failure against a closed port: histogram plus failed outcome.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let closed = listener.local_addr().expect("addr");
    drop(listener);
    let failing = RevalidationClient::new(
        build_client(Duration::from_secs(1)).expect("client"),
        Some(Url::parse(&format!("http://{closed}/api/revalidate")).expect("url")),
        Some("token".to_string()),
    );
    assert!(failing.notify(&["home".to_string()]).await.is_failed());

    let cache = PageCache::new(CacheConfig::default());
    let state = FrontendState {
        revalidation: RevalidationService::new(
            cache.clone(),
            HomeStamp::new(Arc::new(MemoryStore::new()), Duration::from_secs(60)),
        ),
        page_cache: cache,
        listings,
        service_token: Some(Arc::from("secret")),
    };
    let app = build_frontend_router(state);

    for uri in ["/listings/venues/blue-hall", "/listings/venues/blue-hall"] {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("request should build");
        let response = app
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/revalidate")
        .header(header::AUTHORIZATION, "Bearer secret")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"tags":["home","venues:blue-hall"]}"#))
        .expect("request should build");
    let response = app.clone().oneshot(request).await.expect("router should respond");
    assert_eq!(response.status(), StatusCode::OK);

    let snapshot = snapshotter.snapshot().into_vec();
    let names: HashSet<String> = snapshot
        .iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();
    let described: HashSet<String> = snapshot
        .iter()
        .filter(|(_, unit, description, _)| unit.is_some() && description.is_some())
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "unevent_page_cache_hit_total",
        "unevent_page_cache_miss_total",
        "unevent_revalidate_tags_total",
        "unevent_revalidate_stamp_writes_total",
        "unevent_outbound_total",
        "unevent_outbound_ms",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
        assert!(described.contains(metric), "undescribed metric: {metric}");
    }
}
