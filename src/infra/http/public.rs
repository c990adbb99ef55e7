//! Public frontend routes: polling endpoint and cached listing pages.

use axum::{
    Json, Router,
    extract::{Path, State},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use unevent_api_types::{HomeUpdatedResponse, ListingResponse};

use crate::cache::{ListingCollection, deps, response_cache_layer, tags};

use super::{
    auth::require_revalidate_token,
    error::ApiError,
    listing_response,
    middleware::{log_responses, set_request_context},
    revalidate::revalidate,
    state::FrontendState,
};

pub fn build_frontend_router(state: FrontendState) -> Router {
    let cached_routes = Router::new()
        .route("/listings/{collection}", get(listing_index))
        .route("/listings/{collection}/{slug}", get(listing_detail))
        .layer(middleware::from_fn_with_state(
            state.page_cache.clone(),
            response_cache_layer,
        ));

    let api_routes = Router::new()
        .route("/api/revalidate", post(revalidate))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_revalidate_token,
        ))
        .route("/api/public/home-updated", get(home_updated));

    cached_routes
        .merge(api_routes)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

/// Always 200: an absent or unreadable stamp reads as "now".
async fn home_updated(State(state): State<FrontendState>) -> Json<HomeUpdatedResponse> {
    Json(HomeUpdatedResponse {
        last_update: state.revalidation.last_update().await,
        success: true,
    })
}

async fn listing_index(
    State(state): State<FrontendState>,
    Path(collection): Path<String>,
) -> Response {
    let Some(collection) = ListingCollection::parse(&collection) else {
        return ApiError::not_found("Unknown collection").into_response();
    };

    let listings = match state.listings.list(collection).await {
        Ok(listings) => listings,
        Err(err) => return ApiError::from(err).into_response(),
    };

    deps::record(tags::collection(collection));
    deps::record(tags::featured(collection));
    deps::record_all(
        listings
            .iter()
            .map(|listing| tags::listing(collection, &listing.slug)),
    );

    let body: Vec<ListingResponse> = listings.iter().map(listing_response).collect();
    Json(body).into_response()
}

async fn listing_detail(
    State(state): State<FrontendState>,
    Path((collection, slug)): Path<(String, String)>,
) -> Response {
    let Some(collection) = ListingCollection::parse(&collection) else {
        return ApiError::not_found("Unknown collection").into_response();
    };

    let listing = match state.listings.find_by_slug(collection, &slug).await {
        Ok(Some(listing)) => listing,
        Ok(None) => return ApiError::not_found("Listing not found").into_response(),
        Err(err) => return ApiError::from(err).into_response(),
    };

    deps::record(tags::listing(collection, &listing.slug));
    deps::record(tags::similar(collection, &listing.slug));
    deps::record(tags::tenant(&listing.tenant));
    deps::record(tags::city(&listing.city));

    Json(listing_response(&listing)).into_response()
}
