use std::sync::Arc;

use async_trait::async_trait;
use auth::CredentialStore;
use auth::Principal;
use auth::StoreError;
use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::user::models::UserId;
use crate::user::errors::UserError;
use crate::user::ports::UserRepository;

/// Exposes the user repository to the authenticator.
pub struct RepositoryCredentialStore<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
}

impl<UR> RepositoryCredentialStore<UR>
where
    UR: UserRepository,
{
    pub fn new(repository: Arc<UR>) -> Self {
        Self { repository }
    }
}

impl From<UserError> for StoreError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(id) => StoreError::NotFound(id),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

#[async_trait]
impl<UR> CredentialStore for RepositoryCredentialStore<UR>
where
    UR: UserRepository,
{
    async fn find_by_username(&self, username: &str) -> Result<Option<Principal>, StoreError> {
        let user = self.repository.find_by_username(username).await?;
        Ok(user.as_ref().map(Principal::from))
    }

    async fn record_login(&self, principal_id: &Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.repository
            .record_login(&UserId(*principal_id), at)
            .await
            .map_err(StoreError::from)
    }
}
