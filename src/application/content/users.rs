use std::sync::Arc;

use uuid::Uuid;

use crate::application::repos::UsersRepo;
use crate::domain::entities::UserRecord;
use crate::domain::types::UserRole;

use super::{ContentError, ensure_non_empty};

#[derive(Debug, Clone)]
pub struct CreateUserCommand {
    pub email: String,
    pub roles: Vec<UserRole>,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UsersRepo>,
}

impl UserService {
    pub fn new(users: Arc<dyn UsersRepo>) -> Self {
        Self { users }
    }

    pub async fn create_user(&self, command: CreateUserCommand) -> Result<UserRecord, ContentError> {
        ensure_non_empty(&command.email, "email")?;
        if !command.email.contains('@') {
            return Err(ContentError::ConstraintViolation("email"));
        }

        let mut roles: Vec<UserRole> = Vec::with_capacity(command.roles.len());
        for role in command.roles {
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
        if roles.is_empty() {
            roles.push(UserRole::Client);
        }

        let user = UserRecord {
            id: Uuid::new_v4(),
            email: command.email.trim().to_ascii_lowercase(),
            roles,
            profile_id: None,
        };
        Ok(self.users.insert_user(user).await?)
    }

    pub async fn find_user(&self, id: Uuid) -> Result<Option<UserRecord>, ContentError> {
        Ok(self.users.find_user(id).await?)
    }
}
