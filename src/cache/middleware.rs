//! Tag-indexed response cache middleware.
//!
//! Caches successful GET responses of public routes and registers each cached
//! page under the tags its handler recorded through [`deps`].

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::BodyExt;
use metrics::{Unit, counter, describe_counter};
use tracing::{debug, instrument};

use super::{
    config::CacheConfig,
    deps,
    registry::TagRegistry,
    store::{CachedPage, PageKey, PageStore},
};

const METRIC_PAGE_CACHE_HIT: &str = "unevent_page_cache_hit_total";
const METRIC_PAGE_CACHE_MISS: &str = "unevent_page_cache_miss_total";

pub fn describe_metrics() {
    describe_counter!(
        METRIC_PAGE_CACHE_HIT,
        Unit::Count,
        "Total number of page cache hits."
    );
    describe_counter!(
        METRIC_PAGE_CACHE_MISS,
        Unit::Count,
        "Total number of page cache misses."
    );
}

/// Shared page cache handle used by the middleware and the revalidation endpoint.
#[derive(Clone)]
pub struct PageCache {
    pub config: CacheConfig,
    pub pages: Arc<PageStore>,
    pub registry: Arc<TagRegistry>,
}

impl PageCache {
    pub fn new(config: CacheConfig) -> Self {
        let pages = Arc::new(PageStore::new(&config));
        Self {
            config,
            pages,
            registry: Arc::new(TagRegistry::new()),
        }
    }

    /// Drop every cached page rendered from `tag`, returning how many were dropped.
    pub fn revalidate_tag(&self, tag: &str) -> usize {
        let pages = self.registry.take_tag(tag);
        pages
            .iter()
            .filter(|page| self.pages.invalidate(page))
            .count()
    }

    /// Cache a page rendered at registry `generation`.
    ///
    /// A page whose render overlapped a revalidation is dropped rather than cached.
    fn store(
        &self,
        key: PageKey,
        page: CachedPage,
        tags: std::collections::HashSet<String>,
        generation: u64,
    ) -> bool {
        if let Some(evicted) = self.pages.set(key.clone(), page) {
            self.registry.unregister(&evicted);
        }
        if self.registry.register_since(key.clone(), tags, generation) {
            return true;
        }
        self.pages.invalidate(&key);
        self.registry.unregister(&key);
        false
    }
}

/// Serve cached pages and populate the cache on successful misses.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn response_cache_layer(
    State(cache): State<PageCache>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !cache.config.enabled || request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = PageKey::new(
        request.uri().path(),
        request.uri().query().unwrap_or_default(),
    );

    if let Some(cached) = cache.pages.get(&key) {
        counter!(METRIC_PAGE_CACHE_HIT).increment(1);
        debug!(cache = "page", outcome = "hit", "serving cached response");
        return build_response(cached);
    }

    counter!(METRIC_PAGE_CACHE_MISS).increment(1);
    let generation = cache.registry.generation();
    let (response, tags) = deps::with_collector(next.run(request)).await;

    if response.status() != StatusCode::OK || tags.is_empty() {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    if bytes.len() <= cache.config.response_body_limit_bytes {
        let page = CachedPage {
            status: parts.status.as_u16(),
            headers: parts
                .headers
                .iter()
                .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
                .collect(),
            body: bytes.clone(),
        };
        let tag_count = tags.len();
        if cache.store(key, page, tags, generation) {
            debug!(cache = "page", tag_count, "caching response");
        } else {
            debug!(cache = "page", tag_count, "revalidated mid-render, not caching");
        }
    }

    Response::from_parts(parts, Body::from(bytes))
}

fn build_response(cached: CachedPage) -> Response {
    let mut builder = Response::builder().status(cached.status);

    for (name, value) in cached.headers {
        if let Ok(header_value) = HeaderValue::from_str(&value) {
            builder = builder.header(name, header_value);
        }
    }

    builder
        .body(Body::from(cached.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{Router, middleware, routing::get};
    use tower::ServiceExt;

    use super::*;

    fn app(cache: PageCache, calls: Arc<AtomicUsize>) -> Router {
        Router::new()
            .route(
                "/listings/events",
                get(move || {
                    let calls = Arc::clone(&calls);
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        deps::record("collection:events");
                        "events"
                    }
                }),
            )
            .route("/untagged", get(|| async { "plain" }))
            .layer(middleware::from_fn_with_state(cache, response_cache_layer))
    }

    async fn get_ok(app: &Router, uri: &str) {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request");
        let response = app.clone().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn second_request_is_served_from_cache() {
        let cache = PageCache::new(CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let app = app(cache.clone(), calls.clone());

        get_ok(&app, "/listings/events").await;
        get_ok(&app, "/listings/events").await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.pages.len(), 1);
    }

    #[tokio::test]
    async fn revalidating_tag_forces_rerender() {
        let cache = PageCache::new(CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let app = app(cache.clone(), calls.clone());

        get_ok(&app, "/listings/events").await;
        assert_eq!(cache.revalidate_tag("collection:events"), 1);
        assert_eq!(cache.revalidate_tag("collection:events"), 0);
        get_ok(&app, "/listings/events").await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn untagged_responses_are_not_cached() {
        let cache = PageCache::new(CacheConfig::default());
        let app = app(cache.clone(), Arc::new(AtomicUsize::new(0)));

        get_ok(&app, "/untagged").await;
        assert!(cache.pages.is_empty());
    }

    #[tokio::test]
    async fn revalidation_during_render_is_not_cached() {
        let cache = PageCache::new(CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let racing = cache.clone();
        let counter = calls.clone();
        let app = Router::new()
            .route(
                "/listings/events",
                get(move || {
                    let racing = racing.clone();
                    let counter = Arc::clone(&counter);
                    async move {
                        deps::record("collection:events");
                        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                            racing.revalidate_tag("collection:events");
                        }
                        "events"
                    }
                }),
            )
            .layer(middleware::from_fn_with_state(
                cache.clone(),
                response_cache_layer,
            ));

        get_ok(&app, "/listings/events").await;
        assert!(cache.pages.is_empty());
        assert_eq!(cache.registry.page_count(), 0);

        get_ok(&app, "/listings/events").await;
        get_ok(&app, "/listings/events").await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.pages.len(), 1);
    }

    #[tokio::test]
    async fn disabled_cache_passes_through() {
        let cache = PageCache::new(CacheConfig {
            enabled: false,
            ..Default::default()
        });
        let calls = Arc::new(AtomicUsize::new(0));
        let app = app(cache.clone(), calls.clone());

        get_ok(&app, "/listings/events").await;
        get_ok(&app, "/listings/events").await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.pages.is_empty());
    }
}
