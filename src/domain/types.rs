//! Role enumerations shared by user and profile documents.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Role held by a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Client,
    Organizer,
    Venue,
    Provider,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Client => "client",
            UserRole::Organizer => "organizer",
            UserRole::Venue => "venue",
            UserRole::Provider => "provider",
        }
    }

    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "client" => Ok(UserRole::Client),
            "organizer" => Ok(UserRole::Organizer),
            "venue" => Ok(UserRole::Venue),
            "provider" => Ok(UserRole::Provider),
            other => Err(DomainError::validation(format!("unknown user role `{other}`"))),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role-determining field of a profile document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileRole {
    Client,
    Organizer,
    Venue,
    Provider,
}

impl ProfileRole {
    pub fn as_str(self) -> &'static str {
        self.user_role().as_str()
    }

    /// The user role a profile of this kind grants.
    pub fn user_role(self) -> UserRole {
        match self {
            ProfileRole::Client => UserRole::Client,
            ProfileRole::Organizer => UserRole::Organizer,
            ProfileRole::Venue => UserRole::Venue,
            ProfileRole::Provider => UserRole::Provider,
        }
    }

    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match UserRole::parse(value)? {
            UserRole::Client => Ok(ProfileRole::Client),
            UserRole::Organizer => Ok(ProfileRole::Organizer),
            UserRole::Venue => Ok(ProfileRole::Venue),
            UserRole::Provider => Ok(ProfileRole::Provider),
            UserRole::Admin => Err(DomainError::validation(
                "profiles cannot carry the admin role",
            )),
        }
    }
}

impl fmt::Display for ProfileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_role_parse_is_case_insensitive() {
        assert_eq!(UserRole::parse(" Organizer ").expect("role"), UserRole::Organizer);
        assert!(UserRole::parse("owner").is_err());
    }

    #[test]
    fn profile_role_maps_to_user_role() {
        assert_eq!(ProfileRole::Venue.user_role(), UserRole::Venue);
        assert_eq!(ProfileRole::Provider.as_str(), "provider");
    }

    #[test]
    fn profile_role_rejects_admin() {
        assert!(ProfileRole::parse("admin").is_err());
    }
}
