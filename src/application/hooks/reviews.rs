use crate::cache::tags;
use crate::domain::entities::{ListingRecord, NewReview};

use super::HookContext;

/// Default the review owner to the requesting user's profile.
pub fn before_review_write(ctx: &HookContext, review: &mut NewReview) {
    if review.owner_profile_id.is_some() {
        return;
    }
    if let Some(profile_id) = ctx.user.as_ref().and_then(|user| user.profile_id) {
        review.owner_profile_id = Some(profile_id);
    }
}

/// Tags of pages that show ratings for `listing`.
pub fn review_tags(listing: &ListingRecord) -> Vec<String> {
    vec![
        tags::listing(listing.collection, &listing.slug),
        tags::top(listing.collection, tags::DEFAULT_TOP_N),
    ]
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::*;
    use crate::cache::ListingCollection;
    use crate::domain::entities::UserRecord;
    use crate::domain::types::UserRole;

    fn review(owner: Option<Uuid>) -> NewReview {
        NewReview {
            listing_id: Uuid::new_v4(),
            owner_profile_id: owner,
            rating: 4,
            body: "Great night".to_string(),
        }
    }

    fn ctx(profile_id: Option<Uuid>) -> HookContext {
        HookContext::for_user(UserRecord {
            id: Uuid::new_v4(),
            email: "ion@example.com".to_string(),
            roles: vec![UserRole::Client],
            profile_id,
        })
    }

    #[test]
    fn defaults_owner_to_request_profile() {
        let profile_id = Uuid::new_v4();
        let mut draft = review(None);
        before_review_write(&ctx(Some(profile_id)), &mut draft);
        assert_eq!(draft.owner_profile_id, Some(profile_id));
    }

    #[test]
    fn keeps_explicit_owner() {
        let owner = Uuid::new_v4();
        let mut draft = review(Some(owner));
        before_review_write(&ctx(Some(Uuid::new_v4())), &mut draft);
        assert_eq!(draft.owner_profile_id, Some(owner));
    }

    #[test]
    fn user_without_profile_leaves_owner_unset() {
        let mut draft = review(None);
        before_review_write(&ctx(None), &mut draft);
        assert!(draft.owner_profile_id.is_none());

        before_review_write(&HookContext::anonymous(), &mut draft);
        assert!(draft.owner_profile_id.is_none());
    }

    #[test]
    fn review_tags_target_listing_and_top() {
        let listing = ListingRecord {
            id: Uuid::new_v4(),
            tenant: "cluj".to_string(),
            collection: ListingCollection::Venues,
            slug: "form-space".to_string(),
            title: "Form Space".to_string(),
            city: "cluj".to_string(),
            taxonomies: Vec::new(),
            featured: false,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };
        assert_eq!(
            review_tags(&listing),
            vec!["venues:form-space".to_string(), "top:venues:10".to_string()]
        );
    }
}
