//! Callbacks run around content writes.
//!
//! `before_*` hooks mutate the document before it is persisted and cannot
//! fail. `after_*` hooks run once the write has succeeded; they report an
//! [`EffectOutcome`](crate::application::effect::EffectOutcome) that the
//! caller logs and otherwise ignores.

pub mod listings;
pub mod profiles;
pub mod reviews;

use crate::domain::entities::UserRecord;

/// Request-scoped data available to hooks.
#[derive(Debug, Clone, Default)]
pub struct HookContext {
    /// The authenticated user performing the write, if any.
    pub user: Option<UserRecord>,
}

impl HookContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(user: UserRecord) -> Self {
        Self { user: Some(user) }
    }
}
