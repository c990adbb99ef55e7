//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::cache::ListingCollection;
use crate::domain::entities::{ListingRecord, ProfileRecord, ReviewRecord, UserRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn insert_user(&self, user: UserRecord) -> Result<UserRecord, RepoError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError>;

    async fn update_user(&self, user: UserRecord) -> Result<UserRecord, RepoError>;
}

#[async_trait]
pub trait ProfilesRepo: Send + Sync {
    async fn insert_profile(&self, profile: ProfileRecord) -> Result<ProfileRecord, RepoError>;

    async fn find_profile(&self, id: Uuid) -> Result<Option<ProfileRecord>, RepoError>;

    async fn update_profile(&self, profile: ProfileRecord) -> Result<ProfileRecord, RepoError>;
}

#[async_trait]
pub trait ReviewsRepo: Send + Sync {
    async fn insert_review(&self, review: ReviewRecord) -> Result<ReviewRecord, RepoError>;

    async fn list_reviews_for_listing(
        &self,
        listing_id: Uuid,
    ) -> Result<Vec<ReviewRecord>, RepoError>;
}

#[async_trait]
pub trait ListingsRepo: Send + Sync {
    /// Insert or replace a listing, returning the previous version if any.
    async fn upsert_listing(
        &self,
        listing: ListingRecord,
    ) -> Result<Option<ListingRecord>, RepoError>;

    async fn find_listing(&self, id: Uuid) -> Result<Option<ListingRecord>, RepoError>;

    async fn find_listing_by_slug(
        &self,
        collection: ListingCollection,
        slug: &str,
    ) -> Result<Option<ListingRecord>, RepoError>;

    async fn list_listings(
        &self,
        collection: ListingCollection,
    ) -> Result<Vec<ListingRecord>, RepoError>;
}
