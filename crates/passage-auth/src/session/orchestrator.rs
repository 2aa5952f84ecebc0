//! Register, login, refresh, and logout on top of the coordination primitives.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use passage_cache::{StoreManager, keys};
use passage_core::config::AuthConfig;
use passage_core::error::AppError;
use passage_core::result::AppResult;
use passage_database::{DUPLICATE_IDENTITY, UserDirectory};
use passage_entity::user::{NewUser, User, UserRole, normalize_email, normalize_username};

use crate::credential::{Claims, CredentialService, INVALID_CREDENTIAL, TokenPair};
use crate::idempotency::{IdempotencyCache, IdempotencyStamp};
use crate::lock::{DistributedLock, LockOutcome};
use crate::policy;
use crate::revocation::RevocationRegistry;

/// Returned for an unknown identifier and for a wrong password alike.
pub const LOGIN_FAILED: &str = "Email or password is incorrect. Please try again.";
/// Returned when a correct password is presented for a deactivated account.
pub const ACCOUNT_DEACTIVATED: &str = "This account has been deactivated. Please contact support.";
/// Returned when a credential's subject is missing or inactive.
pub const ACCOUNT_UNAVAILABLE: &str = "Account inactive or not found";
/// Returned when another registration holds the same email or username.
pub const REGISTRATION_BUSY: &str = "Registration in progress, please retry";

/// Registration request as received.
#[derive(Debug, Clone)]
pub struct RegisterInput {
    /// Email as typed.
    pub email: String,
    /// Username as typed.
    pub username: String,
    /// Plaintext password.
    pub password: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Client-supplied `Idempotency-Key`, if any.
    pub idempotency_key: Option<String>,
}

/// Login request: an email or a username plus password.
#[derive(Debug, Clone)]
pub struct LoginInput {
    /// Email (anything containing `@`) or username.
    pub identifier: String,
    /// Plaintext password.
    pub password: String,
}

/// A user with a freshly issued credential pair.
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    /// The authenticated identity.
    pub user: User,
    /// New credentials.
    pub tokens: TokenPair,
    /// Whether this answers a replayed registration.
    pub idempotent: bool,
}

/// An authenticated caller on a protected route.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The caller's current record.
    pub user: User,
    /// Claims of the access credential presented.
    pub claims: Claims,
}

impl AuthContext {
    /// Require the admin role.
    pub fn require_admin(&self) -> AppResult<()> {
        if self.user.has_role(UserRole::Admin) {
            Ok(())
        } else {
            Err(AppError::authorization("Admins only"))
        }
    }
}

/// Coordinates credentials, revocation, locks, and replay stamps against
/// the user directory.
#[derive(Debug, Clone)]
pub struct AuthSessionOrchestrator {
    directory: Arc<dyn UserDirectory>,
    credentials: Arc<CredentialService>,
    revocation: RevocationRegistry,
    lock: DistributedLock,
    idempotency: IdempotencyCache,
    lock_ttl: Duration,
    stamp_ttl: Duration,
}

impl AuthSessionOrchestrator {
    /// Wire the orchestrator.
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        store: Arc<StoreManager>,
        credentials: Arc<CredentialService>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            directory,
            credentials,
            revocation: RevocationRegistry::new(Arc::clone(&store)),
            lock: DistributedLock::new(Arc::clone(&store)),
            idempotency: IdempotencyCache::new(store),
            lock_ttl: Duration::from_secs(config.register_lock_ttl_seconds),
            stamp_ttl: Duration::from_secs(config.idempotency_ttl_seconds),
        }
    }

    /// The revocation registry in use.
    pub fn revocation(&self) -> &RevocationRegistry {
        &self.revocation
    }

    /// Create an identity exactly once per (email, username).
    ///
    /// A repeat of a completed registration, by client key or by the same
    /// normalized fields, is answered with the stamped identity and fresh
    /// credentials, provided the repeat names the same email and username
    /// and presents the same password. Anything else is a conflict, as are
    /// lock contention and duplicates.
    pub async fn register(&self, input: RegisterInput) -> AppResult<AuthOutcome> {
        let email = normalize_email(&input.email);
        let username = normalize_username(&input.username);
        policy::validate_registration(&email, &username, &input.password)?;

        let request_key = input
            .idempotency_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(IdempotencyCache::request_key);
        let business_key = IdempotencyCache::registration_key(&email, &username);

        for key in request_key.iter().chain(std::iter::once(&business_key)) {
            if let Some(outcome) = self.replay(key, &email, &username, &input.password).await? {
                info!(user_id = %outcome.user.id, "Registration replayed");
                return Ok(outcome);
            }
        }

        let lock_keys = [
            keys::register_email_lock(&email),
            keys::register_username_lock(&username),
        ];
        let outcome = self
            .lock
            .run_exclusive(&lock_keys, self.lock_ttl, || async {
                if self
                    .directory
                    .find_by_email_or_username(&email, &username)
                    .await?
                    .is_some()
                {
                    return Err(AppError::conflict(DUPLICATE_IDENTITY));
                }

                let user = self
                    .directory
                    .create(NewUser {
                        email: email.clone(),
                        username: username.clone(),
                        display_username: input.username.trim().to_string(),
                        password: input.password.clone(),
                        first_name: input.first_name.trim().to_string(),
                        last_name: input.last_name.trim().to_string(),
                        roles: UserRole::default_set(),
                    })
                    .await?;

                let stamp = IdempotencyStamp {
                    status: 201,
                    user_id: user.id,
                };
                for key in std::iter::once(&business_key).chain(request_key.iter()) {
                    if let Err(e) = self.idempotency.put(key, &stamp, self.stamp_ttl).await {
                        warn!(user_id = %user.id, error = %e, "Failed to stamp registration");
                    }
                }

                let tokens = self.credentials.issue_pair(&user)?;
                Ok(AuthOutcome {
                    user,
                    tokens,
                    idempotent: false,
                })
            })
            .await?;

        match outcome {
            LockOutcome::Acquired(outcome) => {
                info!(user_id = %outcome.user.id, username = %outcome.user.username, "User registered");
                Ok(outcome)
            }
            LockOutcome::Busy => Err(AppError::conflict(REGISTRATION_BUSY)),
        }
    }

    async fn replay(
        &self,
        key: &str,
        email: &str,
        username: &str,
        password: &str,
    ) -> AppResult<Option<AuthOutcome>> {
        let Some(stamp) = self.idempotency.get(key).await? else {
            return Ok(None);
        };
        let Some(user) = self.directory.find_by_id(stamp.user_id).await? else {
            self.idempotency.discard(key).await?;
            return Ok(None);
        };
        // A replay must come from whoever made the original registration
        if user.email != email || user.username != username {
            warn!(user_id = %user.id, "Idempotency key reused for a different identity");
            return Err(AppError::conflict(DUPLICATE_IDENTITY));
        }
        if !self.directory.verify_password(&user, password).await? {
            return Err(AppError::conflict(DUPLICATE_IDENTITY));
        }
        if !user.is_active {
            return Err(AppError::authorization(ACCOUNT_DEACTIVATED));
        }
        let tokens = self.credentials.issue_pair(&user)?;
        Ok(Some(AuthOutcome {
            user,
            tokens,
            idempotent: true,
        }))
    }

    /// Exchange an email or username and password for credentials.
    pub async fn login(&self, input: LoginInput) -> AppResult<AuthOutcome> {
        let identifier = input.identifier.trim();
        // Usernames may contain '@', so an email miss falls back to them
        let mut found = None;
        if identifier.contains('@') {
            found = self
                .directory
                .find_by_email(&normalize_email(identifier))
                .await?;
        }
        if found.is_none() {
            found = self
                .directory
                .find_by_username(&normalize_username(identifier))
                .await?;
        }

        let Some(user) = found else {
            self.directory.verify_unknown(&input.password).await?;
            return Err(AppError::authentication(LOGIN_FAILED));
        };
        if !self.directory.verify_password(&user, &input.password).await? {
            return Err(AppError::authentication(LOGIN_FAILED));
        }
        if !user.is_active {
            return Err(AppError::authorization(ACCOUNT_DEACTIVATED));
        }

        let tokens = self.credentials.issue_pair(&user)?;
        info!(user_id = %user.id, "User logged in");
        Ok(AuthOutcome {
            user,
            tokens,
            idempotent: false,
        })
    }

    /// Gate for protected routes: verify, deny-list, account state, version.
    pub async fn authenticate(&self, access_token: &str) -> AppResult<AuthContext> {
        let claims = self.credentials.verify_access(access_token)?;
        if self.revocation.is_denied(claims.jti).await? {
            return Err(AppError::authentication(INVALID_CREDENTIAL));
        }
        let user = self.active_user(claims.sub).await?;
        if !claims.matches_version(user.token_version) {
            return Err(AppError::authentication(INVALID_CREDENTIAL));
        }
        Ok(AuthContext { user, claims })
    }

    /// Rotate a refresh credential into a new pair.
    ///
    /// The presented refresh credential is single-use: of two concurrent
    /// rotations of the same credential only one succeeds.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = self.credentials.verify_refresh(refresh_token)?;
        if self.revocation.is_denied(claims.jti).await? {
            return Err(AppError::authentication(INVALID_CREDENTIAL));
        }
        let user = self.active_user(claims.sub).await?;
        if !claims.matches_version(user.token_version) {
            return Err(AppError::authentication(INVALID_CREDENTIAL));
        }
        if !self.revocation.deny_first(claims.jti, claims.exp).await? {
            return Err(AppError::authentication(INVALID_CREDENTIAL));
        }
        self.credentials.issue_pair(&user)
    }

    /// End the current session.
    ///
    /// A supplied refresh credential is revoked too, but only when it belongs
    /// to the caller's current token version; anything else is ignored.
    pub async fn logout(&self, ctx: &AuthContext, refresh_token: Option<&str>) -> AppResult<()> {
        self.revocation.deny(&ctx.claims).await?;

        if let Some(token) = refresh_token {
            match self.credentials.verify_refresh(token) {
                Ok(claims)
                    if claims.sub == ctx.user.id
                        && claims.matches_version(ctx.user.token_version) =>
                {
                    self.revocation.deny(&claims).await?;
                }
                _ => {}
            }
        }
        info!(user_id = %ctx.user.id, "User logged out");
        Ok(())
    }

    /// End every session of the caller.
    pub async fn logout_all(&self, ctx: &AuthContext, refresh_token: Option<&str>) -> AppResult<()> {
        self.bump_version(ctx.user.id).await?;
        self.revocation.deny(&ctx.claims).await?;

        if let Some(claims) = refresh_token.and_then(|t| self.credentials.verify_refresh(t).ok()) {
            if let Err(e) = self.revocation.deny(&claims).await {
                warn!(user_id = %ctx.user.id, error = %e, "Failed to deny refresh credential");
            }
        }
        info!(user_id = %ctx.user.id, "User logged out everywhere");
        Ok(())
    }

    /// End every session of another user.
    pub async fn admin_logout_all(&self, admin: &AuthContext, target: Uuid) -> AppResult<()> {
        admin.require_admin()?;
        let version = self.bump_version(target).await?;
        info!(admin_id = %admin.user.id, user_id = %target, token_version = version, "Forced logout-all");
        Ok(())
    }

    /// Deactivate a user; every outstanding credential stops working.
    pub async fn deactivate(&self, admin: &AuthContext, target: Uuid) -> AppResult<User> {
        admin.require_admin()?;
        let user = self
            .directory
            .set_active(target, false)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        info!(admin_id = %admin.user.id, user_id = %target, "User deactivated");
        Ok(user)
    }

    /// Reactivate a deactivated user.
    pub async fn reactivate(&self, admin: &AuthContext, target: Uuid) -> AppResult<User> {
        admin.require_admin()?;
        let user = self
            .directory
            .set_active(target, true)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        info!(admin_id = %admin.user.id, user_id = %target, "User reactivated");
        Ok(user)
    }

    async fn active_user(&self, id: Uuid) -> AppResult<User> {
        match self.directory.find_by_id(id).await? {
            Some(user) if user.is_active => Ok(user),
            _ => Err(AppError::authorization(ACCOUNT_UNAVAILABLE)),
        }
    }

    async fn bump_version(&self, id: Uuid) -> AppResult<i64> {
        self.directory
            .increment_token_version(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }
}
