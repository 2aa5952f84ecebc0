//! Claims carried by every access and refresh credential.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims payload embedded in every credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject: the user ID.
    pub sub: Uuid,
    /// Role names at the time of issuance.
    pub roles: Vec<String>,
    /// Snapshot of the subject's token version.
    pub tv: i64,
    /// Unique credential id, used for individual revocation.
    pub jti: Uuid,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Issuer.
    pub iss: String,
    /// Audience.
    pub aud: String,
    /// Token type: "access" or "refresh".
    pub token_type: TokenType,
}

/// Distinguishes access credentials from refresh credentials.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived credential for API requests.
    Access,
    /// Long-lived credential for obtaining a new pair.
    Refresh,
}

impl Claims {
    /// Returns the user ID from the subject claim.
    pub fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }

    /// Whether the credential was minted for the given token version.
    pub fn matches_version(&self, token_version: i64) -> bool {
        self.tv == token_version
    }
}
