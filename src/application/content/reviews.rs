use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::hooks::{self, HookContext};
use crate::application::notify::TagFanout;
use crate::application::repos::{ListingsRepo, ReviewsRepo};
use crate::domain::entities::{NewReview, ReviewRecord};

use super::{ContentError, ensure_non_empty};

const MIN_RATING: u8 = 1;
const MAX_RATING: u8 = 5;

#[derive(Debug, Clone)]
pub struct CreateReviewCommand {
    pub listing_id: Uuid,
    pub rating: u8,
    pub body: String,
    pub owner_profile_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct ReviewService {
    reviews: Arc<dyn ReviewsRepo>,
    listings: Arc<dyn ListingsRepo>,
    fanout: TagFanout,
}

impl ReviewService {
    pub fn new(
        reviews: Arc<dyn ReviewsRepo>,
        listings: Arc<dyn ListingsRepo>,
        fanout: TagFanout,
    ) -> Self {
        Self {
            reviews,
            listings,
            fanout,
        }
    }

    pub async fn create_review(
        &self,
        ctx: &HookContext,
        command: CreateReviewCommand,
    ) -> Result<ReviewRecord, ContentError> {
        ensure_non_empty(&command.body, "body")?;
        if !(MIN_RATING..=MAX_RATING).contains(&command.rating) {
            return Err(ContentError::ConstraintViolation("rating"));
        }

        let listing = self
            .listings
            .find_listing(command.listing_id)
            .await?
            .ok_or(ContentError::NotFound("listing"))?;

        let mut draft = NewReview {
            listing_id: command.listing_id,
            owner_profile_id: command.owner_profile_id,
            rating: command.rating,
            body: command.body.trim().to_string(),
        };
        hooks::reviews::before_review_write(ctx, &mut draft);

        let record = ReviewRecord {
            id: Uuid::new_v4(),
            listing_id: draft.listing_id,
            owner_profile_id: draft.owner_profile_id,
            rating: draft.rating,
            body: draft.body,
            created_at: OffsetDateTime::now_utc(),
        };
        let stored = self.reviews.insert_review(record).await?;

        let tags = hooks::reviews::review_tags(&listing);
        self.fanout.fan_out(&tags).await;

        Ok(stored)
    }
}
