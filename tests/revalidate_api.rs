use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use unevent::application::content::{ListingService, UpsertListingCommand};
use unevent::application::notify::TagFanout;
use unevent::application::repos::ListingsRepo;
use unevent::application::revalidation::RevalidationService;
use unevent::cache::{
    CacheConfig, HomeStamp, ListingCollection, MemoryStore, PageCache, SharedStore, StoreError,
};
use unevent::infra::http::{FrontendState, build_frontend_router};
use unevent::infra::memory::MemoryRepositories;
use unevent::util::clock::now_millis;
use unevent_api_types::{HomeUpdatedResponse, RevalidateResponse};

const TOKEN: &str = "frontend-secret";

struct Harness {
    app: Router,
    cache: PageCache,
    stamp: HomeStamp,
    listings: ListingService,
}

fn harness_with(store: Arc<dyn SharedStore>, token: Option<&str>) -> Harness {
    let cache = PageCache::new(CacheConfig::default());
    let stamp = HomeStamp::new(store, Duration::from_secs(3600));
    let repos: Arc<dyn ListingsRepo> = Arc::new(MemoryRepositories::new());
    let listings = ListingService::new(repos, TagFanout::default());

    let state = FrontendState {
        revalidation: RevalidationService::new(cache.clone(), stamp.clone()),
        page_cache: cache.clone(),
        listings: listings.clone(),
        service_token: token.map(Arc::from),
    };

    Harness {
        app: build_frontend_router(state),
        cache,
        stamp,
        listings,
    }
}

fn harness() -> Harness {
    harness_with(Arc::new(MemoryStore::new()), Some(TOKEN))
}

fn revalidate_request(auth: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/api/revalidate")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    (status, bytes.to_vec())
}

async fn seed_listing(listings: &ListingService, slug: &str) {
    listings
        .upsert_listing(UpsertListingCommand {
            id: None,
            tenant: "Acme".to_string(),
            collection: ListingCollection::Events,
            slug: slug.to_string(),
            title: "Jazz Night".to_string(),
            city: "Cluj".to_string(),
            taxonomies: vec!["genre:jazz".to_string()],
            featured: false,
        })
        .await
        .expect("seed listing");
}

#[tokio::test]
async fn missing_token_is_rejected_whatever_the_body() {
    let h = harness();
    let (status, body) = send(&h.app, revalidate_request(None, "not json at all")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let json: Value = serde_json::from_slice(&body).expect("json body");
    assert_eq!(json["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn oversized_body_without_valid_token_is_unauthorized() {
    let h = harness();
    let oversized = "x".repeat(3 * 1024 * 1024);

    let (status, _) = send(&h.app, revalidate_request(None, &oversized)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&h.app, revalidate_request(Some("Bearer nope"), &oversized)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_token_is_rejected() {
    let h = harness();
    let (status, _) = send(
        &h.app,
        revalidate_request(Some("Bearer nope"), r#"{"tags":["home"]}"#),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &h.app,
        revalidate_request(Some(TOKEN), r#"{"tags":["home"]}"#),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "scheme prefix is required");
    assert!(h.stamp.read().await.expect("read").is_none());
}

#[tokio::test]
async fn unconfigured_token_rejects_every_request() {
    let h = harness_with(Arc::new(MemoryStore::new()), None);
    let (status, _) = send(
        &h.app,
        revalidate_request(Some("Bearer "), r#"{"tags":["home"]}"#),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &h.app,
        revalidate_request(Some("Bearer anything"), r#"{"tags":["home"]}"#),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn non_array_tags_are_a_bad_request() {
    let h = harness();
    let auth = format!("Bearer {TOKEN}");

    for body in [
        r#"{"tags":"home"}"#,
        r#"{"tag":["home"]}"#,
        r#"{"tags":["home", 7]}"#,
        "not json",
    ] {
        let (status, bytes) = send(&h.app, revalidate_request(Some(&auth), body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        let json: Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(json["error"]["code"], "bad_request");
        assert!(json["error"]["hint"].is_string());
    }
}

#[tokio::test]
async fn home_tag_stamps_the_store() {
    let h = harness();
    let before = now_millis();

    let (status, bytes) = send(
        &h.app,
        revalidate_request(
            Some(&format!("Bearer {TOKEN}")),
            r#"{"tags":["home","city:cluj"]}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let response: RevalidateResponse = serde_json::from_slice(&bytes).expect("response");
    assert_eq!(
        response,
        RevalidateResponse {
            ok: true,
            count: 2
        }
    );

    let stamp = h.stamp.read().await.expect("read").expect("stamp written");
    assert!(stamp >= before);

    let (status, bytes) = send(&h.app, get_request("/api/public/home-updated")).await;
    assert_eq!(status, StatusCode::OK);
    let polled: HomeUpdatedResponse = serde_json::from_slice(&bytes).expect("home-updated");
    assert!(polled.success);
    assert_eq!(polled.last_update, stamp);
}

#[tokio::test]
async fn plain_tags_leave_the_stamp_alone() {
    let h = harness();
    let (status, bytes) = send(
        &h.app,
        revalidate_request(
            Some(&format!("Bearer {TOKEN}")),
            r#"{"tags":["city:cluj","top:events:10"]}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let response: RevalidateResponse = serde_json::from_slice(&bytes).expect("response");
    assert_eq!(response.count, 2);
    assert!(h.stamp.read().await.expect("read").is_none());
}

#[tokio::test]
async fn empty_tag_list_is_accepted() {
    let h = harness();
    let (status, bytes) = send(
        &h.app,
        revalidate_request(Some(&format!("Bearer {TOKEN}")), r#"{"tags":[]}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let response: RevalidateResponse = serde_json::from_slice(&bytes).expect("response");
    assert_eq!(response.count, 0);
}

#[tokio::test]
async fn revalidation_evicts_tagged_listing_pages() {
    let h = harness();
    seed_listing(&h.listings, "jazz-night").await;

    let (status, _) = send(&h.app, get_request("/listings/events/jazz-night")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&h.app, get_request("/listings/events")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.cache.pages.len(), 2);

    let (status, _) = send(
        &h.app,
        revalidate_request(
            Some(&format!("Bearer {TOKEN}")),
            r#"{"tags":["city:cluj"]}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.cache.pages.len(), 1, "only the detail page carries the city tag");

    let (status, _) = send(
        &h.app,
        revalidate_request(
            Some(&format!("Bearer {TOKEN}")),
            r#"{"tags":["events:jazz-night"]}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(h.cache.pages.is_empty());
}

#[tokio::test]
async fn unknown_listing_is_not_cached() {
    let h = harness();
    let (status, _) = send(&h.app, get_request("/listings/events/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&h.app, get_request("/listings/concerts")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(h.cache.pages.is_empty());
}

#[tokio::test]
async fn home_updated_defaults_to_now_when_never_written() {
    let h = harness();
    let before = now_millis();

    let (status, bytes) = send(&h.app, get_request("/api/public/home-updated")).await;
    let after = now_millis();

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&bytes).expect("json body");
    assert_eq!(json["success"], true);
    let last_update = json["lastUpdate"].as_i64().expect("lastUpdate is a number");
    assert!(last_update >= before && last_update <= after);
}

struct BrokenStore;

#[async_trait]
impl SharedStore for BrokenStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: String) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

#[tokio::test]
async fn store_failures_never_fail_the_public_endpoints() {
    let h = harness_with(Arc::new(BrokenStore), Some(TOKEN));
    let before = now_millis();

    let (status, bytes) = send(&h.app, get_request("/api/public/home-updated")).await;
    assert_eq!(status, StatusCode::OK);
    let polled: HomeUpdatedResponse = serde_json::from_slice(&bytes).expect("home-updated");
    assert!(polled.success);
    assert!(polled.last_update >= before);

    let (status, bytes) = send(
        &h.app,
        revalidate_request(
            Some(&format!("Bearer {TOKEN}")),
            r#"{"tags":["home-snapshot"]}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let response: RevalidateResponse = serde_json::from_slice(&bytes).expect("response");
    assert_eq!(response.count, 1);
}
