//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use passage_auth::{AuthOutcome, TokenPair};
use passage_entity::user::User;

/// User summary for responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    /// User ID.
    pub id: Uuid,
    /// Normalized email.
    pub email: String,
    /// Username as registered.
    pub username: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Granted roles.
    pub roles: Vec<String>,
    /// Whether the account may sign in.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.display_username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            roles: user.roles.clone(),
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

/// Register and login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The authenticated identity.
    pub user: UserResponse,
    /// Freshly issued credentials.
    pub tokens: TokenPair,
    /// Present and `true` when a registration was replayed.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub idempotent: bool,
}

impl From<AuthOutcome> for AuthResponse {
    fn from(outcome: AuthOutcome) -> Self {
        Self {
            user: UserResponse::from(&outcome.user),
            tokens: outcome.tokens,
            idempotent: outcome.idempotent,
        }
    }
}

/// Current identity response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    /// The caller.
    pub user: UserResponse,
}

/// Refresh response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokensResponse {
    /// Rotated credentials.
    pub tokens: TokenPair,
}

/// Acknowledgement for logout and admin actions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OkResponse {
    /// Always `true`.
    pub ok: bool,
}

impl OkResponse {
    /// The single acknowledgement value.
    pub const fn ok() -> Self {
        Self { ok: true }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// Coordination store status.
    pub store: String,
    /// User directory status.
    pub directory: String,
    /// Server version.
    pub version: String,
}
