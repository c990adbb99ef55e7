use std::sync::Arc;

use crate::application::content::{ListingService, ProfileService, ReviewService, UserService};
use crate::application::revalidation::RevalidationService;
use crate::cache::PageCache;

/// State of the public (frontend) listener.
#[derive(Clone)]
pub struct FrontendState {
    pub revalidation: RevalidationService,
    pub page_cache: PageCache,
    pub listings: ListingService,
    /// Token expected on `POST /api/revalidate`.
    pub service_token: Option<Arc<str>>,
}

/// State of the admin (content backend) listener.
#[derive(Clone)]
pub struct AdminState {
    pub users: UserService,
    pub profiles: ProfileService,
    pub reviews: ReviewService,
    pub listings: ListingService,
    pub service_token: Option<Arc<str>>,
}
