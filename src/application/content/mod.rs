//! Write path for content documents: validation, hooks, and persistence.

mod listings;
mod profiles;
mod reviews;
mod users;

use thiserror::Error;

use crate::application::repos::RepoError;
use crate::domain::error::DomainError;

pub use listings::{ListingService, ListingWrite, UpsertListingCommand};
pub use profiles::{CreateProfileCommand, ProfileService};
pub use reviews::{CreateReviewCommand, ReviewService};
pub use users::{CreateUserCommand, UserService};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("{0}")]
    ConstraintViolation(&'static str),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

fn ensure_non_empty(value: &str, field: &'static str) -> Result<(), ContentError> {
    if value.trim().is_empty() {
        Err(ContentError::ConstraintViolation(field))
    } else {
        Ok(())
    }
}
