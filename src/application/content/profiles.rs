use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::hooks::{self, HookContext};
use crate::application::repos::{ProfilesRepo, UsersRepo};
use crate::domain::entities::{NewProfile, ProfilePatch, ProfileRecord};
use crate::domain::types::ProfileRole;

use super::{ContentError, ensure_non_empty};

#[derive(Debug, Clone)]
pub struct CreateProfileCommand {
    pub display_name: String,
    pub role: ProfileRole,
    pub user_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct ProfileService {
    users: Arc<dyn UsersRepo>,
    profiles: Arc<dyn ProfilesRepo>,
}

impl ProfileService {
    pub fn new(users: Arc<dyn UsersRepo>, profiles: Arc<dyn ProfilesRepo>) -> Self {
        Self { users, profiles }
    }

    pub async fn create_profile(
        &self,
        ctx: &HookContext,
        command: CreateProfileCommand,
    ) -> Result<ProfileRecord, ContentError> {
        ensure_non_empty(&command.display_name, "display_name")?;

        let now = OffsetDateTime::now_utc();
        let mut draft = NewProfile {
            user_id: command.user_id,
            display_name: command.display_name.trim().to_string(),
            role: command.role,
            member_since: None,
        };
        hooks::profiles::before_profile_create(ctx, &mut draft, now);

        let record = ProfileRecord {
            id: Uuid::new_v4(),
            user_id: draft.user_id,
            display_name: draft.display_name,
            role: draft.role,
            member_since: draft.member_since,
            created_at: now,
            updated_at: now,
        };
        let stored = self.profiles.insert_profile(record).await?;

        hooks::profiles::after_profile_create(self.users.as_ref(), &stored)
            .await
            .log("profile.link_user");

        Ok(stored)
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        patch: ProfilePatch,
    ) -> Result<ProfileRecord, ContentError> {
        let previous = self
            .profiles
            .find_profile(id)
            .await?
            .ok_or(ContentError::NotFound("profile"))?;

        let mut next = previous.clone();
        if let Some(display_name) = patch.display_name {
            ensure_non_empty(&display_name, "display_name")?;
            next.display_name = display_name.trim().to_string();
        }
        if let Some(role) = patch.role {
            next.role = role;
        }
        next.updated_at = OffsetDateTime::now_utc();

        let stored = self.profiles.update_profile(next).await?;

        hooks::profiles::after_profile_update(self.users.as_ref(), &previous, &stored)
            .await
            .log("profile.role_sync");

        Ok(stored)
    }

    pub async fn find_profile(&self, id: Uuid) -> Result<Option<ProfileRecord>, ContentError> {
        Ok(self.profiles.find_profile(id).await?)
    }
}
