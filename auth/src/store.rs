use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::principal::Principal;

/// Error reported by a credential store adapter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Credential store unavailable: {0}")]
    Unavailable(String),

    #[error("Principal not found: {0}")]
    NotFound(String),
}

/// Port to the user records backing authentication.
///
/// Services implement this over their own persistence. Implementations
/// must make `record_login` an atomic read-modify-write of a single record.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Look up a principal by username.
    ///
    /// # Returns
    /// Optional principal (None if no such username)
    ///
    /// # Errors
    /// * `Unavailable` - The backing store could not be reached
    async fn find_by_username(&self, username: &str) -> Result<Option<Principal>, StoreError>;

    /// Record a successful login at `at`.
    ///
    /// The stored value must never move backwards: when `at` is older than
    /// the current `last_login`, the record is left unchanged.
    ///
    /// # Errors
    /// * `NotFound` - The principal no longer exists
    /// * `Unavailable` - The backing store could not be reached
    async fn record_login(&self, principal_id: &Uuid, at: DateTime<Utc>) -> Result<(), StoreError>;
}
