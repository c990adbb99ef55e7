//! Admin content API: the write path that runs hooks and fans out tags.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{patch, post, put},
};
use unevent_api_types::{
    CreateProfileRequest, CreateReviewRequest, CreateUserRequest, ListingWriteResponse,
    ProfileResponse, ReviewResponse, UpdateProfileRequest, UpsertListingRequest, UserResponse,
};
use uuid::Uuid;

use crate::application::content::{
    CreateProfileCommand, CreateReviewCommand, CreateUserCommand, UpsertListingCommand,
};
use crate::application::hooks::HookContext;
use crate::cache::ListingCollection;
use crate::domain::entities::{ProfilePatch, ProfileRecord, ReviewRecord, UserRecord};
use crate::domain::types::{ProfileRole, UserRole};

use super::{
    auth::require_service_token,
    error::ApiError,
    listing_response,
    middleware::{log_responses, set_request_context},
    state::AdminState,
};

/// Header naming the user on whose behalf the service acts.
pub const ACTING_USER_HEADER: &str = "x-unevent-user";

pub fn build_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/users", post(create_user))
        .route("/admin/profiles", post(create_profile))
        .route("/admin/profiles/{id}", patch(update_profile))
        .route("/admin/reviews", post(create_review))
        .route("/admin/listings", put(upsert_listing))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_service_token,
        ))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

/// Resolve the acting user from [`ACTING_USER_HEADER`].
async fn hook_context(state: &AdminState, headers: &HeaderMap) -> Result<HookContext, ApiError> {
    let Some(raw) = headers.get(ACTING_USER_HEADER) else {
        return Ok(HookContext::anonymous());
    };
    let id = raw
        .to_str()
        .ok()
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
        .ok_or_else(|| {
            ApiError::bad_request(
                "Invalid acting user header",
                Some(format!("{ACTING_USER_HEADER} must be a UUID")),
            )
        })?;

    match state.users.find_user(id).await? {
        Some(user) => Ok(HookContext::for_user(user)),
        None => Err(ApiError::not_found("Acting user not found")),
    }
}

async fn create_user(
    State(state): State<AdminState>,
    Json(payload): Json<CreateUserRequest>,
) -> Response {
    let roles = match payload
        .roles
        .iter()
        .map(|role| UserRole::parse(role))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(roles) => roles,
        Err(err) => return ApiError::from(err).into_response(),
    };

    match state
        .users
        .create_user(CreateUserCommand {
            email: payload.email,
            roles,
        })
        .await
    {
        Ok(user) => (StatusCode::CREATED, Json(user_response(&user))).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn create_profile(
    State(state): State<AdminState>,
    headers: HeaderMap,
    Json(payload): Json<CreateProfileRequest>,
) -> Response {
    let ctx = match hook_context(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(err) => return err.into_response(),
    };
    let role = match ProfileRole::parse(&payload.role) {
        Ok(role) => role,
        Err(err) => return ApiError::from(err).into_response(),
    };

    let command = CreateProfileCommand {
        display_name: payload.display_name,
        role,
        user_id: payload.user_id,
    };
    match state.profiles.create_profile(&ctx, command).await {
        Ok(profile) => (StatusCode::CREATED, Json(profile_response(&profile))).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn update_profile(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Response {
    let role = match payload.role.as_deref().map(ProfileRole::parse).transpose() {
        Ok(role) => role,
        Err(err) => return ApiError::from(err).into_response(),
    };

    let patch = ProfilePatch {
        display_name: payload.display_name,
        role,
    };
    match state.profiles.update_profile(id, patch).await {
        Ok(profile) => Json(profile_response(&profile)).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn create_review(
    State(state): State<AdminState>,
    headers: HeaderMap,
    Json(payload): Json<CreateReviewRequest>,
) -> Response {
    let ctx = match hook_context(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(err) => return err.into_response(),
    };

    let command = CreateReviewCommand {
        listing_id: payload.listing_id,
        rating: payload.rating,
        body: payload.body,
        owner_profile_id: payload.owner_profile_id,
    };
    match state.reviews.create_review(&ctx, command).await {
        Ok(review) => (StatusCode::CREATED, Json(review_response(&review))).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn upsert_listing(
    State(state): State<AdminState>,
    Json(payload): Json<UpsertListingRequest>,
) -> Response {
    let Some(collection) = ListingCollection::parse(&payload.collection) else {
        return ApiError::bad_request(
            "Unknown collection",
            Some(format!("expected one of events, venues, services; got `{}`", payload.collection)),
        )
        .into_response();
    };

    let command = UpsertListingCommand {
        id: payload.id,
        tenant: payload.tenant,
        collection,
        slug: payload.slug,
        title: payload.title,
        city: payload.city,
        taxonomies: payload.taxonomies,
        featured: payload.featured,
    };
    match state.listings.upsert_listing(command).await {
        Ok(write) => Json(ListingWriteResponse {
            listing: listing_response(&write.listing),
            tags: write.tags,
        })
        .into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

fn user_response(user: &UserRecord) -> UserResponse {
    UserResponse {
        id: user.id,
        email: user.email.clone(),
        roles: user.roles.iter().map(|role| role.to_string()).collect(),
        profile_id: user.profile_id,
    }
}

fn profile_response(profile: &ProfileRecord) -> ProfileResponse {
    ProfileResponse {
        id: profile.id,
        user_id: profile.user_id,
        display_name: profile.display_name.clone(),
        role: profile.role.to_string(),
        member_since: profile.member_since,
    }
}

fn review_response(review: &ReviewRecord) -> ReviewResponse {
    ReviewResponse {
        id: review.id,
        listing_id: review.listing_id,
        owner_profile_id: review.owner_profile_id,
        rating: review.rating,
        body: review.body.clone(),
    }
}
