//! In-memory user directory.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use passage_core::error::AppError;
use passage_core::result::AppResult;
use passage_entity::user::{NewUser, User};

use crate::directory::{DUPLICATE_IDENTITY, UserDirectory};
use crate::password::PasswordHasher;

#[derive(Debug, Default)]
struct Records {
    users: HashMap<Uuid, User>,
    by_email: HashMap<String, Uuid>,
    by_username: HashMap<String, Uuid>,
}

impl Records {
    fn lookup(&self, index: &HashMap<String, Uuid>, key: &str) -> Option<User> {
        index.get(key).and_then(|id| self.users.get(id)).cloned()
    }
}

/// In-memory [`UserDirectory`] for single-process runs and tests.
///
/// The record map and both secondary indexes live behind one lock, so a
/// create checks and claims the email and username in a single step.
#[derive(Debug, Clone)]
pub struct MemoryUserDirectory {
    records: Arc<RwLock<Records>>,
    hasher: PasswordHasher,
}

impl MemoryUserDirectory {
    /// Create an empty directory.
    pub fn new(hasher: PasswordHasher) -> Self {
        Self {
            records: Arc::new(RwLock::new(Records::default())),
            hasher,
        }
    }

    /// Remove a user and its index entries. Returns whether it existed.
    pub async fn remove(&self, id: Uuid) -> bool {
        let mut records = self.records.write().await;
        match records.users.remove(&id) {
            Some(user) => {
                records.by_email.remove(&user.email);
                records.by_username.remove(&user.username);
                true
            }
            None => false,
        }
    }

    /// Grant an additional role to a user.
    pub async fn grant_role(&self, id: Uuid, role: &str) -> AppResult<()> {
        let mut records = self.records.write().await;
        let user = records
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("User not found"))?;
        if !user.roles.iter().any(|r| r == role) {
            user.roles.push(role.to_string());
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    /// Number of stored users.
    pub async fn len(&self) -> usize {
        self.records.read().await.users.len()
    }

    /// Whether the directory is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.records.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let records = self.records.read().await;
        Ok(records.lookup(&records.by_email, email))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let records = self.records.read().await;
        Ok(records.lookup(&records.by_username, username))
    }

    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> AppResult<Option<User>> {
        let records = self.records.read().await;
        Ok(records
            .lookup(&records.by_email, email)
            .or_else(|| records.lookup(&records.by_username, username)))
    }

    async fn create(&self, data: NewUser) -> AppResult<User> {
        // Hash before taking the lock; it is the slow part.
        let password_hash = self.hasher.hash_async(data.password).await?;

        let mut records = self.records.write().await;
        if records.by_email.contains_key(&data.email)
            || records.by_username.contains_key(&data.username)
        {
            return Err(AppError::conflict(DUPLICATE_IDENTITY));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            email: data.email,
            username: data.username,
            display_username: data.display_username,
            first_name: data.first_name,
            last_name: data.last_name,
            password_hash,
            roles: data.roles,
            is_active: true,
            deactivated_at: None,
            token_version: 0,
            created_at: now,
            updated_at: now,
        };

        records.by_email.insert(user.email.clone(), user.id);
        records.by_username.insert(user.username.clone(), user.id);
        records.users.insert(user.id, user.clone());
        Ok(user)
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
        let mut records = self.records.write().await;
        Ok(records.users.get_mut(&id).map(|user| {
            user.token_version += 1;
            user.updated_at = Utc::now();
            user.token_version
        }))
    }

    async fn set_active(&self, id: Uuid, active: bool) -> AppResult<Option<User>> {
        let mut records = self.records.write().await;
        let Some(user) = records.users.get_mut(&id) else {
            return Ok(None);
        };

        let now = Utc::now();
        if active {
            user.deactivated_at = None;
        } else {
            user.deactivated_at.get_or_insert(now);
            user.token_version += 1;
        }
        user.is_active = active;
        user.updated_at = now;
        Ok(Some(user.clone()))
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use passage_core::error::ErrorKind;

    fn directory() -> MemoryUserDirectory {
        MemoryUserDirectory::new(PasswordHasher::new(64, 1).unwrap())
    }

    fn new_user(email: &str, username: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            username: username.to_string(),
            display_username: username.to_string(),
            password: "Str0ng!Pass".to_string(),
            first_name: "Omar".to_string(),
            last_name: "Z".to_string(),
            roles: vec!["user".to_string()],
        }
    }

    #[tokio::test]
    async fn test_create_hashes_password() {
        let dir = directory();
        let user = dir.create(new_user("a@x.com", "alice")).await.unwrap();
        assert_ne!(user.password_hash, "Str0ng!Pass");
        assert!(dir.verify_password(&user, "Str0ng!Pass").await.unwrap());
        assert!(!dir.verify_password(&user, "nope").await.unwrap());
        assert_eq!(user.token_version, 0);
        assert!(user.is_active);
    }

    #[tokio::test]
    async fn test_duplicate_email_or_username_conflicts() {
        let dir = directory();
        dir.create(new_user("a@x.com", "alice")).await.unwrap();

        let err = dir.create(new_user("a@x.com", "bob")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        let err = dir.create(new_user("b@x.com", "alice")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(dir.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_creates_admit_one() {
        let dir = directory();
        let mut handles = Vec::new();
        for i in 0..8 {
            let dir = dir.clone();
            handles.push(tokio::spawn(async move {
                dir.create(new_user("same@x.com", &format!("user{i}"))).await
            }));
        }
        let mut ok = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
    }

    #[tokio::test]
    async fn test_token_version_only_grows() {
        let dir = directory();
        let user = dir.create(new_user("a@x.com", "alice")).await.unwrap();
        assert_eq!(dir.increment_token_version(user.id).await.unwrap(), Some(1));
        assert_eq!(dir.increment_token_version(user.id).await.unwrap(), Some(2));
        assert_eq!(dir.increment_token_version(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_deactivate_bumps_version_and_reactivate_clears_stamp() {
        let dir = directory();
        let user = dir.create(new_user("a@x.com", "alice")).await.unwrap();

        let off = dir.set_active(user.id, false).await.unwrap().unwrap();
        assert!(!off.is_active);
        assert!(off.deactivated_at.is_some());
        assert_eq!(off.token_version, 1);

        let on = dir.set_active(user.id, true).await.unwrap().unwrap();
        assert!(on.is_active);
        assert!(on.deactivated_at.is_none());
        assert_eq!(on.token_version, 1);
    }

    #[tokio::test]
    async fn test_lookup_and_remove() {
        let dir = directory();
        let user = dir.create(new_user("a@x.com", "alice")).await.unwrap();
        assert!(dir.find_by_email_or_username("zzz@x.com", "alice").await.unwrap().is_some());
        assert!(dir.remove(user.id).await);
        assert!(dir.find_by_email("a@x.com").await.unwrap().is_none());
        assert!(dir.is_empty().await);
    }
}
