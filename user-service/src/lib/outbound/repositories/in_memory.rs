use std::collections::HashMap;

use async_trait::async_trait;
use auth::Role;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

/// In-memory implementation of UserRepository.
///
/// Backs development runs without a database and the HTTP integration tests.
/// Every mutation happens under one write lock, so uniqueness checks and
/// `record_login` are atomic.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn select(&self, predicate: impl Fn(&User) -> bool) -> Vec<User> {
        let users = self.users.read().await;
        let mut selected: Vec<User> = users.values().filter(|u| predicate(u)).cloned().collect();
        selected.sort_by_key(|u| u.created_at);
        selected
    }
}

fn conflicts(users: &HashMap<UserId, User>, user: &User) -> Result<(), UserError> {
    for other in users.values().filter(|other| other.id != user.id) {
        if other.username == user.username {
            return Err(UserError::UsernameAlreadyExists(user.username.to_string()));
        }
        if other.email == user.email {
            return Err(UserError::EmailAlreadyExists(user.email.to_string()));
        }
    }
    Ok(())
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.write().await;
        conflicts(&users, &user)?;
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.username.as_str() == username)
            .cloned())
    }

    async fn exists_by_username(&self, username: &Username) -> Result<bool, UserError> {
        let users = self.users.read().await;
        Ok(users.values().any(|u| &u.username == username))
    }

    async fn exists_by_email(&self, email: &EmailAddress) -> Result<bool, UserError> {
        let users = self.users.read().await;
        Ok(users.values().any(|u| &u.email == email))
    }

    async fn list_all(&self) -> Result<Vec<User>, UserError> {
        Ok(self.select(|_| true).await)
    }

    async fn search(&self, keyword: &str) -> Result<Vec<User>, UserError> {
        Ok(self.select(|u| u.matches_keyword(keyword)).await)
    }

    async fn find_by_role(&self, role: Role) -> Result<Vec<User>, UserError> {
        Ok(self.select(|u| u.role == role).await)
    }

    async fn count_by_role(&self, role: Role) -> Result<u64, UserError> {
        let users = self.users.read().await;
        Ok(users.values().filter(|u| u.role == role).count() as u64)
    }

    async fn find_by_enabled(&self, enabled: bool) -> Result<Vec<User>, UserError> {
        Ok(self.select(|u| u.enabled == enabled).await)
    }

    async fn find_created_after(&self, start: DateTime<Utc>) -> Result<Vec<User>, UserError> {
        Ok(self.select(|u| u.created_at > start).await)
    }

    async fn update(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.write().await;
        conflicts(&users, &user)?;

        let stored = users
            .get_mut(&user.id)
            .ok_or_else(|| UserError::NotFound(user.id.to_string()))?;

        // last_login is owned by record_login.
        let last_login = stored.last_login;
        *stored = User { last_login, ..user };
        Ok(stored.clone())
    }

    async fn record_login(&self, id: &UserId, at: DateTime<Utc>) -> Result<(), UserError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(id)
            .ok_or_else(|| UserError::NotFound(id.to_string()))?;

        user.record_login(at);
        Ok(())
    }

    async fn delete(&self, id: &UserId) -> Result<(), UserError> {
        self.users
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| UserError::NotFound(id.to_string()))
    }
}
