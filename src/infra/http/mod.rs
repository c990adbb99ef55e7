//! HTTP surfaces: the public frontend listener and the admin content API.

mod admin;
mod auth;
mod error;
mod middleware;
mod public;
mod revalidate;
mod state;

pub use admin::{ACTING_USER_HEADER, build_admin_router};
pub use error::ApiError;
pub use public::build_frontend_router;
pub use state::{AdminState, FrontendState};

use unevent_api_types::ListingResponse;

use crate::domain::entities::ListingRecord;

fn listing_response(listing: &ListingRecord) -> ListingResponse {
    ListingResponse {
        id: listing.id,
        tenant: listing.tenant.clone(),
        collection: listing.collection.to_string(),
        slug: listing.slug.clone(),
        title: listing.title.clone(),
        city: listing.city.clone(),
        taxonomies: listing.taxonomies.clone(),
        featured: listing.featured,
    }
}
