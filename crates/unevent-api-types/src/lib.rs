//! Wire types shared by the UN:EVENT server, its outbound clients, and tests.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Body of `POST /api/revalidate` and of the outbound revalidation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevalidateRequest {
    pub tags: Vec<String>,
}

/// Successful response of `POST /api/revalidate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevalidateResponse {
    pub ok: bool,
    pub count: usize,
}

/// Response of `GET /api/public/home-updated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeUpdatedResponse {
    pub last_update: i64,
    pub success: bool,
}

/// Body of the CDN purge-by-tag call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeByTagRequest {
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

// Admin content API payloads.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
    pub profile_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProfileRequest {
    pub display_name: String,
    pub role: String,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub display_name: String,
    pub role: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub member_since: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReviewRequest {
    pub listing_id: Uuid,
    pub rating: u8,
    pub body: String,
    #[serde(default)]
    pub owner_profile_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub owner_profile_id: Option<Uuid>,
    pub rating: u8,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertListingRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub tenant: String,
    pub collection: String,
    pub slug: String,
    pub title: String,
    pub city: String,
    #[serde(default)]
    pub taxonomies: Vec<String>,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingResponse {
    pub id: Uuid,
    pub tenant: String,
    pub collection: String,
    pub slug: String,
    pub title: String,
    pub city: String,
    pub taxonomies: Vec<String>,
    pub featured: bool,
}

/// Returned by `PUT /admin/listings`: the stored listing plus the tags it invalidated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingWriteResponse {
    pub listing: ListingResponse,
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_updated_uses_camel_case() {
        let body = HomeUpdatedResponse {
            last_update: 42,
            success: true,
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["lastUpdate"], 42);
        assert_eq!(json["success"], true);
    }

    #[test]
    fn revalidate_request_reads_tags() {
        let parsed: RevalidateRequest =
            serde_json::from_str(r#"{"tags":["home","city:cluj"]}"#).expect("parse");
        assert_eq!(parsed.tags, vec!["home", "city:cluj"]);
    }
}
