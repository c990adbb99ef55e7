//! Content documents handled by the write path.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::cache::ListingCollection;

use super::types::{ProfileRole, UserRole};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub roles: Vec<UserRole>,
    /// Cross-reference written back by the profile hooks.
    pub profile_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub display_name: String,
    pub role: ProfileRole,
    pub member_since: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Profile document before it is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfile {
    pub user_id: Option<Uuid>,
    pub display_name: String,
    pub role: ProfileRole,
    pub member_since: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub display_name: Option<String>,
    pub role: Option<ProfileRole>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub owner_profile_id: Option<Uuid>,
    pub rating: u8,
    pub body: String,
    pub created_at: OffsetDateTime,
}

/// Review document before it is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub listing_id: Uuid,
    pub owner_profile_id: Option<Uuid>,
    pub rating: u8,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRecord {
    pub id: Uuid,
    pub tenant: String,
    pub collection: ListingCollection,
    pub slug: String,
    pub title: String,
    pub city: String,
    pub taxonomies: Vec<String>,
    pub featured: bool,
    pub updated_at: OffsetDateTime,
}
