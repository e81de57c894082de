use async_trait::async_trait;
use auth::Role;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::UserError;
use crate::user::models::EmailAddress;
use crate::user::models::Username;

/// Port for user domain service operations.
#[async_trait]
pub trait UserServicePort: Send + Sync + 'static {
    /// Register a new user with role USER, enabled.
    ///
    /// # Arguments
    /// * `command` - Validated command containing username, email, password and names
    ///
    /// # Returns
    /// Created user entity
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` - Username is already taken
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create_user(&self, command: CreateUserCommand) -> Result<User, UserError>;

    /// Retrieve user by unique identifier.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn get_user(&self, id: &UserId) -> Result<User, UserError>;

    /// Retrieve user by unique username.
    ///
    /// # Errors
    /// * `NotFoundByUsername` - No user with this username
    /// * `DatabaseError` - Database operation failed
    async fn get_user_by_username(&self, username: &Username) -> Result<User, UserError>;

    async fn list_users(&self) -> Result<Vec<User>, UserError>;

    /// Case-insensitive search over username, email and names.
    async fn search_users(&self, keyword: &str) -> Result<Vec<User>, UserError>;

    async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>, UserError>;

    async fn count_users_by_role(&self, role: Role) -> Result<u64, UserError>;

    /// Users whose account is enabled.
    async fn list_active_users(&self) -> Result<Vec<User>, UserError>;

    /// Users created strictly after `start`.
    async fn list_users_created_after(&self, start: DateTime<Utc>)
        -> Result<Vec<User>, UserError>;

    /// Update profile fields of an existing user.
    ///
    /// # Arguments
    /// * `id` - User ID to update
    /// * `command` - Command with optional first name, last name and email
    ///
    /// # Returns
    /// Updated user entity
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `EmailAlreadyExists` - New email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn update_user(&self, id: &UserId, command: UpdateUserCommand)
        -> Result<User, UserError>;

    /// Delete existing user.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn delete_user(&self, id: &UserId) -> Result<(), UserError>;
}

/// Persistence operations for user aggregate.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` - Username is already taken
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: User) -> Result<User, UserError>;

    /// Retrieve user by identifier.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;

    /// Retrieve user by username.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserError>;

    async fn exists_by_username(&self, username: &Username) -> Result<bool, UserError>;

    async fn exists_by_email(&self, email: &EmailAddress) -> Result<bool, UserError>;

    /// Retrieve all users, oldest first.
    async fn list_all(&self) -> Result<Vec<User>, UserError>;

    async fn search(&self, keyword: &str) -> Result<Vec<User>, UserError>;

    async fn find_by_role(&self, role: Role) -> Result<Vec<User>, UserError>;

    async fn count_by_role(&self, role: Role) -> Result<u64, UserError>;

    async fn find_by_enabled(&self, enabled: bool) -> Result<Vec<User>, UserError>;

    async fn find_created_after(&self, start: DateTime<Utc>) -> Result<Vec<User>, UserError>;

    /// Update existing user in storage.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `EmailAlreadyExists` - New email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn update(&self, user: User) -> Result<User, UserError>;

    /// Atomically move `last_login` of one user forward to `at`.
    ///
    /// Concurrent calls must not lose updates, and an older `at` never
    /// overwrites a newer stored value.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn record_login(&self, id: &UserId, at: DateTime<Utc>) -> Result<(), UserError>;

    /// Remove user from storage.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn delete(&self, id: &UserId) -> Result<(), UserError>;
}
