//! The user directory contract.

use std::fmt::Debug;

use async_trait::async_trait;
use uuid::Uuid;

use passage_core::result::AppResult;
use passage_entity::user::{NewUser, User};

/// Message of the conflict error raised when an email or username is taken.
pub const DUPLICATE_IDENTITY: &str = "Email or username already in use";

/// The persistent record store for identities.
///
/// Lookups take already-normalized email and username values. Every
/// mutation is a single atomic step in the backing store.
#[async_trait]
pub trait UserDirectory: Send + Sync + Debug + 'static {
    /// Find a user by primary key.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find a user by normalized email.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Find a user by normalized username.
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Find a user holding either the email or the username.
    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> AppResult<Option<User>>;

    /// Create a user, hashing `data.password` on the way in.
    ///
    /// Fails with a conflict ([`DUPLICATE_IDENTITY`]) if the email or the
    /// username is already taken.
    async fn create(&self, data: NewUser) -> AppResult<User>;

    /// Check a plaintext password against the user's stored hash.
    async fn verify_password(&self, user: &User, password: &str) -> AppResult<bool>;

    /// Do the hashing work of [`Self::verify_password`] for an identifier
    /// that matched no user. The outcome is always a mismatch.
    async fn verify_unknown(&self, password: &str) -> AppResult<()>;

    /// Atomically add one to the user's token version.
    ///
    /// Returns the new version, or `None` if the user does not exist.
    async fn increment_token_version(&self, id: Uuid) -> AppResult<Option<i64>>;

    /// Activate or deactivate a user.
    ///
    /// Deactivation stamps `deactivated_at` and bumps the token version in
    /// the same step. Returns the updated user, or `None` if absent.
    async fn set_active(&self, id: Uuid, active: bool) -> AppResult<Option<User>>;

    /// Check that the directory is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
