//! In-process repositories for content documents.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::application::repos::{
    ListingsRepo, ProfilesRepo, RepoError, ReviewsRepo, UsersRepo,
};
use crate::cache::ListingCollection;
use crate::domain::entities::{ListingRecord, ProfileRecord, ReviewRecord, UserRecord};

#[derive(Default)]
pub struct MemoryRepositories {
    users: RwLock<HashMap<Uuid, UserRecord>>,
    profiles: RwLock<HashMap<Uuid, ProfileRecord>>,
    reviews: RwLock<Vec<ReviewRecord>>,
    listings: RwLock<HashMap<Uuid, ListingRecord>>,
}

impl MemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsersRepo for MemoryRepositories {
    async fn insert_user(&self, user: UserRecord) -> Result<UserRecord, RepoError> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(RepoError::Duplicate {
                constraint: "users_email_key".to_string(),
            });
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn update_user(&self, user: UserRecord) -> Result<UserRecord, RepoError> {
        let mut users = self.users.write().await;
        let slot = users.get_mut(&user.id).ok_or(RepoError::NotFound)?;
        *slot = user.clone();
        Ok(user)
    }
}

#[async_trait]
impl ProfilesRepo for MemoryRepositories {
    async fn insert_profile(&self, profile: ProfileRecord) -> Result<ProfileRecord, RepoError> {
        let mut profiles = self.profiles.write().await;
        if profiles.contains_key(&profile.id) {
            return Err(RepoError::Duplicate {
                constraint: "profiles_pkey".to_string(),
            });
        }
        profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<ProfileRecord>, RepoError> {
        Ok(self.profiles.read().await.get(&id).cloned())
    }

    async fn update_profile(&self, profile: ProfileRecord) -> Result<ProfileRecord, RepoError> {
        let mut profiles = self.profiles.write().await;
        let slot = profiles.get_mut(&profile.id).ok_or(RepoError::NotFound)?;
        *slot = profile.clone();
        Ok(profile)
    }
}

#[async_trait]
impl ReviewsRepo for MemoryRepositories {
    async fn insert_review(&self, review: ReviewRecord) -> Result<ReviewRecord, RepoError> {
        self.reviews.write().await.push(review.clone());
        Ok(review)
    }

    async fn list_reviews_for_listing(
        &self,
        listing_id: Uuid,
    ) -> Result<Vec<ReviewRecord>, RepoError> {
        Ok(self
            .reviews
            .read()
            .await
            .iter()
            .filter(|review| review.listing_id == listing_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ListingsRepo for MemoryRepositories {
    async fn upsert_listing(
        &self,
        listing: ListingRecord,
    ) -> Result<Option<ListingRecord>, RepoError> {
        Ok(self.listings.write().await.insert(listing.id, listing))
    }

    async fn find_listing(&self, id: Uuid) -> Result<Option<ListingRecord>, RepoError> {
        Ok(self.listings.read().await.get(&id).cloned())
    }

    async fn find_listing_by_slug(
        &self,
        collection: ListingCollection,
        slug: &str,
    ) -> Result<Option<ListingRecord>, RepoError> {
        Ok(self
            .listings
            .read()
            .await
            .values()
            .find(|listing| listing.collection == collection && listing.slug == slug)
            .cloned())
    }

    async fn list_listings(
        &self,
        collection: ListingCollection,
    ) -> Result<Vec<ListingRecord>, RepoError> {
        let mut listings: Vec<ListingRecord> = self
            .listings
            .read()
            .await
            .values()
            .filter(|listing| listing.collection == collection)
            .cloned()
            .collect();
        listings.sort_by(|a, b| {
            b.featured
                .cmp(&a.featured)
                .then_with(|| a.slug.cmp(&b.slug))
        });
        Ok(listings)
    }
}
