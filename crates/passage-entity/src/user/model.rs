//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::UserRole;

/// A registered identity.
///
/// `email` and `username` are stored normalized (trimmed, lowercase) and are
/// each unique across all identities.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Normalized email address.
    pub email: String,
    /// Normalized login name.
    pub username: String,
    /// Username as the user typed it.
    pub display_username: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Role names granted to the user.
    pub roles: Vec<String>,
    /// Whether the account may authenticate.
    pub is_active: bool,
    /// When the account was deactivated, if it is.
    pub deactivated_at: Option<DateTime<Utc>>,
    /// Bumped to revoke every outstanding credential. Never decremented.
    pub token_version: i64,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check whether the user holds the given role.
    pub fn has_role(&self, role: UserRole) -> bool {
        self.roles.iter().any(|r| r == role.as_str())
    }

    /// Check if this user has admin privileges.
    pub fn is_admin(&self) -> bool {
        self.has_role(UserRole::Admin)
    }

    /// First and last name joined, trimmed.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// Data required to create a new user.
///
/// `password` is plaintext. The user directory hashes it as part of its
/// write path and never persists it as given.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Normalized email.
    pub email: String,
    /// Normalized username.
    pub username: String,
    /// Username as typed.
    pub display_username: String,
    /// Plaintext password.
    pub password: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Granted roles.
    pub roles: Vec<String>,
}

/// Normalize an email for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Normalize a username for storage, lookups, and uniqueness.
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}
