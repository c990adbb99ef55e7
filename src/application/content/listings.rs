use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::hooks;
use crate::application::notify::{Delivery, TagFanout};
use crate::application::repos::ListingsRepo;
use crate::cache::{ListingCollection, tags};
use crate::domain::entities::ListingRecord;

use super::{ContentError, ensure_non_empty};

#[derive(Debug, Clone)]
pub struct UpsertListingCommand {
    pub id: Option<Uuid>,
    pub tenant: String,
    pub collection: ListingCollection,
    pub slug: String,
    pub title: String,
    pub city: String,
    pub taxonomies: Vec<String>,
    pub featured: bool,
}

/// Result of a listing write: the stored record, its tags, and fanout outcomes.
#[derive(Debug)]
pub struct ListingWrite {
    pub listing: ListingRecord,
    pub tags: Vec<String>,
    pub deliveries: Vec<Delivery>,
}

#[derive(Clone)]
pub struct ListingService {
    listings: Arc<dyn ListingsRepo>,
    fanout: TagFanout,
}

impl ListingService {
    pub fn new(listings: Arc<dyn ListingsRepo>, fanout: TagFanout) -> Self {
        Self { listings, fanout }
    }

    pub async fn upsert_listing(
        &self,
        command: UpsertListingCommand,
    ) -> Result<ListingWrite, ContentError> {
        ensure_non_empty(&command.tenant, "tenant")?;
        ensure_non_empty(&command.title, "title")?;
        ensure_non_empty(&command.city, "city")?;

        let slug = tags::normalize_key(&command.slug);
        if slug.is_empty() {
            return Err(ContentError::ConstraintViolation("slug"));
        }

        if let Some(existing) = self
            .listings
            .find_listing_by_slug(command.collection, &slug)
            .await?
            && Some(existing.id) != command.id
        {
            return Err(ContentError::ConstraintViolation("slug already in use"));
        }

        let listing = ListingRecord {
            id: command.id.unwrap_or_else(Uuid::new_v4),
            tenant: command.tenant.trim().to_string(),
            collection: command.collection,
            slug,
            title: command.title.trim().to_string(),
            city: command.city.trim().to_string(),
            taxonomies: command.taxonomies,
            featured: command.featured,
            updated_at: OffsetDateTime::now_utc(),
        };

        let previous = self.listings.upsert_listing(listing.clone()).await?;
        let tags = hooks::listings::listing_tags(&listing, previous.as_ref());
        let deliveries = hooks::listings::after_listing_change(&self.fanout, &tags).await;

        Ok(ListingWrite {
            listing,
            tags,
            deliveries,
        })
    }

    pub async fn find_by_slug(
        &self,
        collection: ListingCollection,
        slug: &str,
    ) -> Result<Option<ListingRecord>, ContentError> {
        Ok(self
            .listings
            .find_listing_by_slug(collection, &tags::normalize_key(slug))
            .await?)
    }

    pub async fn list(
        &self,
        collection: ListingCollection,
    ) -> Result<Vec<ListingRecord>, ContentError> {
        Ok(self.listings.list_listings(collection).await?)
    }
}
