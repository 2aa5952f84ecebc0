//! PostgreSQL user repository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use passage_core::error::{AppError, ErrorKind};
use passage_core::result::AppResult;
use passage_entity::user::{NewUser, User};

use crate::directory::{DUPLICATE_IDENTITY, UserDirectory};
use crate::password::PasswordHasher;

/// PostgreSQL-backed [`UserDirectory`].
///
/// Uniqueness of email and username is enforced by table constraints, so
/// two concurrent creates for the same identity cannot both succeed.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
    hasher: PasswordHasher,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool, hasher: PasswordHasher) -> Self {
        Self { pool, hasher }
    }

    fn map_err(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
        move |e| AppError::with_source(ErrorKind::Database, context, e)
    }
}

#[async_trait]
impl UserDirectory for UserRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::map_err("Failed to find user by id"))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::map_err("Failed to find user by email"))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::map_err("Failed to find user by username"))
    }

    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1 OR username = $2 LIMIT 1")
            .bind(email)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::map_err("Failed to find user by email or username"))
    }

    async fn create(&self, data: NewUser) -> AppResult<User> {
        let password_hash = self.hasher.hash_async(data.password).await?;

        sqlx::query_as::<_, User>(
            r#"INSERT INTO users
                (id, email, username, display_username, first_name, last_name,
                 password_hash, roles, is_active, token_version, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE, 0, NOW(), NOW())
               RETURNING *"#,
        )
        .bind(Uuid::now_v7())
        .bind(&data.email)
        .bind(&data.username)
        .bind(&data.display_username)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&password_hash)
        .bind(&data.roles)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::conflict(DUPLICATE_IDENTITY)
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create user", e),
        })
    }

    async fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        self.hasher
            .verify_async(password.to_string(), user.password_hash.clone())
            .await
    }

    async fn verify_unknown(&self, password: &str) -> AppResult<()> {
        self.hasher.verify_decoy_async(password.to_string()).await
    }

    async fn increment_token_version(&self, id: Uuid) -> AppResult<Option<i64>> {
        sqlx::query_scalar::<_, i64>(
            "UPDATE users SET token_version = token_version + 1, updated_at = NOW() \
             WHERE id = $1 RETURNING token_version",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::map_err("Failed to increment token version"))
    }

    async fn set_active(&self, id: Uuid, active: bool) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"UPDATE users SET
                is_active = $2,
                deactivated_at = CASE WHEN $2 THEN NULL ELSE COALESCE(deactivated_at, NOW()) END,
                token_version = token_version + CASE WHEN $2 THEN 0 ELSE 1 END,
                updated_at = NOW()
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::map_err("Failed to update user status"))
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(Self::map_err("Health check failed"))
    }
}
