//! Credential signing, verification, and rotation.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use passage_core::config::AuthConfig;
use passage_core::error::AppError;
use passage_core::result::AppResult;
use passage_entity::user::User;

use super::claims::{Claims, TokenType};

/// The only message any verification failure carries to callers.
pub const INVALID_CREDENTIAL: &str = "Invalid or expired credential";

/// A freshly signed credential together with the claims inside it.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    /// Compact signed form.
    pub token: String,
    /// The claims that were signed.
    pub claims: Claims,
}

/// Result of a successful token pair generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived access credential.
    pub access_token: String,
    /// Long-lived refresh credential.
    pub refresh_token: String,
    /// Access credential expiration.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh credential expiration.
    pub refresh_expires_at: DateTime<Utc>,
}

/// Signs and verifies session credentials.
///
/// Holds the signing secret; nothing else in the process sees it.
#[derive(Clone)]
pub struct CredentialService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialService")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl CredentialService {
    /// Build the service from auth configuration.
    ///
    /// A missing or blank signing secret is a configuration error.
    pub fn new(config: &AuthConfig) -> AppResult<Self> {
        let secret = config
            .jwt_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::configuration("auth.jwt_secret must be set"))?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.jwt_issuer.as_str()]);
        validation.set_audience(&[config.jwt_audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.leeway = config.leeway_seconds;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            issuer: config.jwt_issuer.clone(),
            audience: config.jwt_audience.clone(),
            access_ttl: Duration::seconds(config.access_ttl_seconds as i64),
            refresh_ttl: Duration::seconds(config.refresh_ttl_seconds as i64),
        })
    }

    /// Mint an access credential for the user.
    pub fn issue_access(&self, user: &User) -> AppResult<IssuedCredential> {
        self.issue(user, TokenType::Access, self.access_ttl)
    }

    /// Mint a refresh credential for the user.
    pub fn issue_refresh(&self, user: &User) -> AppResult<IssuedCredential> {
        self.issue(user, TokenType::Refresh, self.refresh_ttl)
    }

    /// Mint a new access + refresh pair.
    pub fn issue_pair(&self, user: &User) -> AppResult<TokenPair> {
        let access = self.issue_access(user)?;
        let refresh = self.issue_refresh(user)?;
        Ok(TokenPair {
            access_expires_at: access.claims.expires_at(),
            refresh_expires_at: refresh.claims.expires_at(),
            access_token: access.token,
            refresh_token: refresh.token,
        })
    }

    fn issue(&self, user: &User, token_type: TokenType, ttl: Duration) -> AppResult<IssuedCredential> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            roles: user.roles.clone(),
            tv: user.token_version,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            token_type,
        };
        let token = self.sign(&claims)?;
        Ok(IssuedCredential { token, claims })
    }

    pub(crate) fn sign(&self, claims: &Claims) -> AppResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign credential: {e}")))
    }

    /// Validate signature, issuer, audience, and expiry.
    ///
    /// Every failure maps to the same authentication error.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(reason = ?e.kind(), "Credential rejected");
                AppError::authentication(INVALID_CREDENTIAL)
            })
    }

    /// [`Self::verify`] and require an access credential.
    pub fn verify_access(&self, token: &str) -> AppResult<Claims> {
        self.verify_kind(token, TokenType::Access)
    }

    /// [`Self::verify`] and require a refresh credential.
    pub fn verify_refresh(&self, token: &str) -> AppResult<Claims> {
        self.verify_kind(token, TokenType::Refresh)
    }

    fn verify_kind(&self, token: &str, expected: TokenType) -> AppResult<Claims> {
        let claims = self.verify(token)?;
        if claims.token_type != expected {
            debug!(jti = %claims.jti, ?expected, "Credential of the wrong kind");
            return Err(AppError::authentication(INVALID_CREDENTIAL));
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use passage_core::error::ErrorKind;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: Some("test-secret-test-secret-test-secret".to_string()),
            ..AuthConfig::default()
        }
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            username: "alice".to_string(),
            display_username: "Alice".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: String::new(),
            roles: vec!["user".to_string()],
            is_active: true,
            deactivated_at: None,
            token_version: 3,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_missing_secret_is_fatal() {
        let err = CredentialService::new(&AuthConfig::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);

        let blank = AuthConfig {
            jwt_secret: Some("   ".to_string()),
            ..AuthConfig::default()
        };
        assert!(CredentialService::new(&blank).is_err());
    }

    #[test]
    fn test_issue_and_verify_pair() {
        let service = CredentialService::new(&config()).unwrap();
        let user = user();
        let pair = service.issue_pair(&user).unwrap();

        let access = service.verify_access(&pair.access_token).unwrap();
        assert_eq!(access.sub, user.id);
        assert_eq!(access.tv, 3);
        assert_eq!(access.iss, "passage");
        assert_eq!(access.aud, "passage-clients");
        assert_eq!(access.roles, vec!["user".to_string()]);

        let refresh = service.verify_refresh(&pair.refresh_token).unwrap();
        assert_ne!(access.jti, refresh.jti);
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn test_kinds_are_not_interchangeable() {
        let service = CredentialService::new(&config()).unwrap();
        let pair = service.issue_pair(&user()).unwrap();
        assert!(service.verify_access(&pair.refresh_token).is_err());
        assert!(service.verify_refresh(&pair.access_token).is_err());
    }

    #[test]
    fn test_expired_credential_fails_with_valid_signature() {
        let service = CredentialService::new(&config()).unwrap();
        let mut claims = service.issue_access(&user()).unwrap().claims;
        claims.iat -= 120;
        claims.exp = Utc::now().timestamp() - 60;
        let token = service.sign(&claims).unwrap();

        let err = service.verify(&token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
        assert_eq!(err.message, INVALID_CREDENTIAL);
    }

    #[test]
    fn test_failures_share_one_message() {
        let service = CredentialService::new(&config()).unwrap();
        let other = CredentialService::new(&AuthConfig {
            jwt_secret: Some("another-secret-another-secret".to_string()),
            ..AuthConfig::default()
        })
        .unwrap();
        let foreign = other.issue_access(&user()).unwrap().token;

        let wrong_aud = CredentialService::new(&AuthConfig {
            jwt_audience: "someone-else".to_string(),
            ..config()
        })
        .unwrap()
        .issue_access(&user())
        .unwrap()
        .token;

        for token in ["garbage", foreign.as_str(), wrong_aud.as_str()] {
            let err = service.verify(token).unwrap_err();
            assert_eq!(err.message, INVALID_CREDENTIAL);
        }
    }

    #[test]
    fn test_jti_is_unique_per_issue() {
        let service = CredentialService::new(&config()).unwrap();
        let user = user();
        let a = service.issue_access(&user).unwrap().claims.jti;
        let b = service.issue_access(&user).unwrap().claims.jti;
        assert_ne!(a, b);
    }
}
