use time::OffsetDateTime;

use crate::application::effect::EffectOutcome;
use crate::application::repos::{RepoError, UsersRepo};
use crate::domain::entities::{NewProfile, ProfileRecord};
use crate::domain::types::UserRole;

use super::HookContext;

/// Stamp the membership start and link the requesting user when no owner is set.
pub fn before_profile_create(ctx: &HookContext, profile: &mut NewProfile, now: OffsetDateTime) {
    profile.member_since = Some(now);
    if profile.user_id.is_none()
        && let Some(user) = &ctx.user
    {
        profile.user_id = Some(user.id);
    }
}

/// Write the new profile's id back onto its linked user.
pub async fn after_profile_create(
    users: &dyn UsersRepo,
    profile: &ProfileRecord,
) -> EffectOutcome<RepoError> {
    let Some(user_id) = profile.user_id else {
        return EffectOutcome::skipped("profile has no linked user");
    };

    let result = async {
        let mut user = users.find_user(user_id).await?.ok_or(RepoError::NotFound)?;
        user.profile_id = Some(profile.id);
        users.update_user(user).await
    }
    .await;

    match result {
        Ok(_) => EffectOutcome::Succeeded,
        Err(err) => EffectOutcome::Failed(err),
    }
}

/// Propagate a changed profile role onto the linked user's role list.
pub async fn after_profile_update(
    users: &dyn UsersRepo,
    previous: &ProfileRecord,
    current: &ProfileRecord,
) -> EffectOutcome<RepoError> {
    if previous.role == current.role {
        return EffectOutcome::skipped("role unchanged");
    }
    let Some(user_id) = current.user_id else {
        return EffectOutcome::skipped("profile has no linked user");
    };

    let result = async {
        let mut user = users.find_user(user_id).await?.ok_or(RepoError::NotFound)?;
        user.roles = sync_roles(&user.roles, current.role.user_role());
        users.update_user(user).await
    }
    .await;

    match result {
        Ok(_) => EffectOutcome::Succeeded,
        Err(err) => EffectOutcome::Failed(err),
    }
}

/// Keep `admin`, replace every other role with `role`.
fn sync_roles(roles: &[UserRole], role: UserRole) -> Vec<UserRole> {
    let mut next: Vec<UserRole> = roles
        .iter()
        .copied()
        .filter(|existing| *existing == UserRole::Admin)
        .collect();
    next.push(role);
    next
}
