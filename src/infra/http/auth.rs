//! Shared-secret bearer authentication.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Request, header::AUTHORIZATION};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;
use tracing::warn;

use super::error::ApiError;
use super::state::{AdminState, FrontendState};

pub fn extract_token(header: Option<&HeaderValue>) -> Option<&str> {
    let value = header?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// Exact, constant-time match of the request's bearer token against `expected`.
///
/// Always false when no token is configured.
pub fn bearer_matches(headers: &HeaderMap, expected: Option<&str>) -> bool {
    let Some(expected) = expected.filter(|token| !token.is_empty()) else {
        return false;
    };
    let Some(presented) = extract_token(headers.get(AUTHORIZATION)) else {
        return false;
    };
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Reject admin requests that do not carry the service token.
pub async fn require_service_token(
    State(state): State<AdminState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !bearer_matches(request.headers(), state.service_token.as_deref()) {
        return ApiError::unauthorized().into_response();
    }
    next.run(request).await
}

/// Reject revalidation requests that do not carry the service token.
///
/// Runs as a route layer, so the body is never buffered for a rejected request.
pub async fn require_revalidate_token(
    State(state): State<FrontendState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !bearer_matches(request.headers(), state.service_token.as_deref()) {
        warn!(
            target = "unevent::http::revalidate",
            "rejected revalidation request with invalid credentials"
        );
        return ApiError::unauthorized().into_response();
    }
    next.run(request).await
}
