use std::sync::Arc;

use async_trait::async_trait;
use auth::Role;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::user::errors::UserError;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Domain service implementation for user operations.
///
/// Concrete implementation of UserServicePort with dependency injection.
pub struct UserService<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
    password_hasher: auth::PasswordHasher,
}

impl<UR> UserService<UR>
where
    UR: UserRepository,
{
    /// Create a new user service over a repository.
    pub fn new(repository: Arc<UR>) -> Self {
        Self {
            repository,
            password_hasher: auth::PasswordHasher::new(),
        }
    }
}

#[async_trait]
impl<UR> UserServicePort for UserService<UR>
where
    UR: UserRepository,
{
    async fn create_user(&self, command: CreateUserCommand) -> Result<User, UserError> {
        if self.repository.exists_by_username(&command.username).await? {
            return Err(UserError::UsernameAlreadyExists(command.username.to_string()));
        }

        if self.repository.exists_by_email(&command.email).await? {
            return Err(UserError::EmailAlreadyExists(command.email.to_string()));
        }

        let password_hash = self.password_hasher.hash(command.password.as_str())?;

        let user = User {
            id: UserId::new(),
            username: command.username,
            email: command.email,
            password_hash,
            first_name: command.first_name,
            last_name: command.last_name,
            role: Role::User,
            enabled: true,
            created_at: Utc::now(),
            last_login: None,
        };

        let created_user = self.repository.create(user).await?;
        tracing::info!(
            user_id = %created_user.id,
            username = %created_user.username,
            "User registered"
        );

        Ok(created_user)
    }

    async fn get_user(&self, id: &UserId) -> Result<User, UserError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id.to_string()))
    }

    async fn get_user_by_username(&self, username: &Username) -> Result<User, UserError> {
        self.repository
            .find_by_username(username.as_str())
            .await?
            .ok_or(UserError::NotFoundByUsername(username.to_string()))
    }

    async fn list_users(&self) -> Result<Vec<User>, UserError> {
        self.repository.list_all().await
    }

    async fn search_users(&self, keyword: &str) -> Result<Vec<User>, UserError> {
        self.repository.search(keyword.trim()).await
    }

    async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>, UserError> {
        self.repository.find_by_role(role).await
    }

    async fn count_users_by_role(&self, role: Role) -> Result<u64, UserError> {
        self.repository.count_by_role(role).await
    }

    async fn list_active_users(&self) -> Result<Vec<User>, UserError> {
        self.repository.find_by_enabled(true).await
    }

    async fn list_users_created_after(
        &self,
        start: DateTime<Utc>,
    ) -> Result<Vec<User>, UserError> {
        self.repository.find_created_after(start).await
    }

    async fn update_user(
        &self,
        id: &UserId,
        command: UpdateUserCommand,
    ) -> Result<User, UserError> {
        let mut user = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id.to_string()))?;

        if let Some(first_name) = command.first_name {
            user.first_name = Some(first_name);
        }

        if let Some(last_name) = command.last_name {
            user.last_name = Some(last_name);
        }

        if let Some(new_email) = command.email {
            if new_email != user.email {
                if self.repository.exists_by_email(&new_email).await? {
                    return Err(UserError::EmailAlreadyExists(new_email.to_string()));
                }
                user.email = new_email;
            }
        }

        let updated_user = self.repository.update(user).await?;
        tracing::info!(user_id = %updated_user.id, "User updated");

        Ok(updated_user)
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), UserError> {
        self.repository.delete(id).await?;
        tracing::info!(user_id = %id, "User deleted");

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use mockall::mock;

    use super::*;
    use crate::domain::user::models::fixtures;
    use crate::domain::user::models::EmailAddress;
    use crate::domain::user::models::Password;
    use crate::domain::user::models::PersonName;

    mock! {
        pub TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn create(&self, user: User) -> Result<User, UserError>;
            async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;
            async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserError>;
            async fn exists_by_username(&self, username: &Username) -> Result<bool, UserError>;
            async fn exists_by_email(&self, email: &EmailAddress) -> Result<bool, UserError>;
            async fn list_all(&self) -> Result<Vec<User>, UserError>;
            async fn search(&self, keyword: &str) -> Result<Vec<User>, UserError>;
            async fn find_by_role(&self, role: Role) -> Result<Vec<User>, UserError>;
            async fn count_by_role(&self, role: Role) -> Result<u64, UserError>;
            async fn find_by_enabled(&self, enabled: bool) -> Result<Vec<User>, UserError>;
            async fn find_created_after(&self, start: DateTime<Utc>) -> Result<Vec<User>, UserError>;
            async fn update(&self, user: User) -> Result<User, UserError>;
            async fn record_login(&self, id: &UserId, at: DateTime<Utc>) -> Result<(), UserError>;
            async fn delete(&self, id: &UserId) -> Result<(), UserError>;
        }
    }

    fn create_command(username: &str, email: &str) -> CreateUserCommand {
        CreateUserCommand::new(
            Username::new(username.to_string()).unwrap(),
            EmailAddress::new(email.to_string()).unwrap(),
            Password::new("password123".to_string()).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_create_user_success() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_exists_by_username()
            .times(1)
            .returning(|_| Ok(false));
        repository
            .expect_exists_by_email()
            .times(1)
            .returning(|_| Ok(false));
        repository
            .expect_create()
            .withf(|user| {
                user.username.as_str() == "testuser"
                    && user.email.as_str() == "test@example.com"
                    && user.password_hash.starts_with("$argon2")
                    && user.role == Role::User
                    && user.enabled
                    && user.last_login.is_none()
            })
            .times(1)
            .returning(|user| Ok(user));

        let service = UserService::new(Arc::new(repository));

        let command = create_command("testuser", "test@example.com").with_names(
            Some(PersonName::new("Test".to_string()).unwrap()),
            None,
        );

        let user = service.create_user(command).await.unwrap();
        assert_eq!(user.username.as_str(), "testuser");
        assert_eq!(user.first_name.as_ref().map(|n| n.as_str()), Some("Test"));
        // Password is hashed with real Argon2
        assert!(user.password_hash.starts_with("$argon2"));
        assert_ne!(user.password_hash, "password123");
    }

    #[tokio::test]
    async fn test_create_user_duplicate_username() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_exists_by_username()
            .times(1)
            .returning(|_| Ok(true));
        repository.expect_exists_by_email().times(0);
        repository.expect_create().times(0);

        let service = UserService::new(Arc::new(repository));

        let result = service
            .create_user(create_command("testuser", "test2@example.com"))
            .await;
        assert!(matches!(
            result.unwrap_err(),
            UserError::UsernameAlreadyExists(_)
        ));
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_exists_by_username()
            .times(1)
            .returning(|_| Ok(false));
        repository
            .expect_exists_by_email()
            .times(1)
            .returning(|_| Ok(true));
        repository.expect_create().times(0);

        let service = UserService::new(Arc::new(repository));

        let result = service
            .create_user(create_command("user2", "test@example.com"))
            .await;
        assert!(matches!(
            result.unwrap_err(),
            UserError::EmailAlreadyExists(_)
        ));
    }

    #[tokio::test]
    async fn test_get_user_success() {
        let mut repository = MockTestUserRepository::new();

        let expected_user = fixtures::user("testuser");
        let user_id = expected_user.id;

        repository
            .expect_find_by_id()
            .withf(move |id| *id == user_id)
            .times(1)
            .returning(move |_| Ok(Some(expected_user.clone())));

        let service = UserService::new(Arc::new(repository));

        let user = service.get_user(&user_id).await.unwrap();
        assert_eq!(user.id, user_id);
        assert_eq!(user.username.as_str(), "testuser");
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let service = UserService::new(Arc::new(repository));

        let result = service.get_user(&UserId::new()).await;
        assert!(matches!(result.unwrap_err(), UserError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_user_by_username_not_found() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_username()
            .withf(|username| username == "nonexistent")
            .times(1)
            .returning(|_| Ok(None));

        let service = UserService::new(Arc::new(repository));

        let username = Username::new("nonexistent".to_string()).unwrap();
        let result = service.get_user_by_username(&username).await;
        assert!(matches!(
            result.unwrap_err(),
            UserError::NotFoundByUsername(_)
        ));
    }

    #[tokio::test]
    async fn test_search_users_trims_keyword() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_search()
            .withf(|keyword| keyword == "ali")
            .times(1)
            .returning(|_| Ok(vec![fixtures::user("alice")]));

        let service = UserService::new(Arc::new(repository));

        let users = service.search_users("  ali ").await.unwrap();
        assert_eq!(users.len(), 1);
    }

    #[tokio::test]
    async fn test_list_active_users_queries_enabled() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_enabled()
            .withf(|enabled| *enabled)
            .times(1)
            .returning(|_| Ok(vec![]));

        let service = UserService::new(Arc::new(repository));

        assert!(service.list_active_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_count_users_by_role() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_count_by_role()
            .withf(|role| *role == Role::Admin)
            .times(1)
            .returning(|_| Ok(2));

        let service = UserService::new(Arc::new(repository));

        assert_eq!(service.count_users_by_role(Role::Admin).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_user_success() {
        let mut repository = MockTestUserRepository::new();

        let existing_user = fixtures::user("olduser");
        let user_id = existing_user.id;

        repository
            .expect_find_by_id()
            .withf(move |id| *id == user_id)
            .times(1)
            .returning(move |_| Ok(Some(existing_user.clone())));
        repository
            .expect_exists_by_email()
            .times(1)
            .returning(|_| Ok(false));
        repository
            .expect_update()
            .withf(|user| {
                user.username.as_str() == "olduser"
                    && user.email.as_str() == "new@example.com"
                    && user.last_name.as_ref().map(|n| n.as_str()) == Some("Doe")
            })
            .times(1)
            .returning(|user| Ok(user));

        let service = UserService::new(Arc::new(repository));

        let command = UpdateUserCommand {
            first_name: None,
            last_name: Some(PersonName::new("Doe".to_string()).unwrap()),
            email: Some(EmailAddress::new("new@example.com".to_string()).unwrap()),
        };

        let updated_user = service.update_user(&user_id, command).await.unwrap();
        assert_eq!(updated_user.email.as_str(), "new@example.com");
    }

    #[tokio::test]
    async fn test_update_user_same_email_skips_duplicate_check() {
        let mut repository = MockTestUserRepository::new();

        let existing_user = fixtures::user("alice");
        let user_id = existing_user.id;

        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(existing_user.clone())));
        repository.expect_exists_by_email().times(0);
        repository
            .expect_update()
            .times(1)
            .returning(|user| Ok(user));

        let service = UserService::new(Arc::new(repository));

        let command = UpdateUserCommand {
            email: Some(EmailAddress::new("alice@example.com".to_string()).unwrap()),
            ..Default::default()
        };

        assert!(service.update_user(&user_id, command).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_user_email_taken() {
        let mut repository = MockTestUserRepository::new();

        let existing_user = fixtures::user("alice");
        let user_id = existing_user.id;

        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(existing_user.clone())));
        repository
            .expect_exists_by_email()
            .times(1)
            .returning(|_| Ok(true));
        repository.expect_update().times(0);

        let service = UserService::new(Arc::new(repository));

        let command = UpdateUserCommand {
            email: Some(EmailAddress::new("bob@example.com".to_string()).unwrap()),
            ..Default::default()
        };

        let result = service.update_user(&user_id, command).await;
        assert!(matches!(
            result.unwrap_err(),
            UserError::EmailAlreadyExists(_)
        ));
    }

    #[tokio::test]
    async fn test_update_user_not_found() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let service = UserService::new(Arc::new(repository));

        let result = service
            .update_user(&UserId::new(), UpdateUserCommand::default())
            .await;
        assert!(matches!(result.unwrap_err(), UserError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_user_success() {
        let mut repository = MockTestUserRepository::new();

        let user_id = UserId::new();

        repository
            .expect_delete()
            .withf(move |id| *id == user_id)
            .times(1)
            .returning(|_| Ok(()));

        let service = UserService::new(Arc::new(repository));

        assert!(service.delete_user(&user_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_user_not_found() {
        let mut repository = MockTestUserRepository::new();

        let user_id = UserId::new();

        repository
            .expect_delete()
            .times(1)
            .returning(move |_| Err(UserError::NotFound(user_id.to_string())));

        let service = UserService::new(Arc::new(repository));

        let result = service.delete_user(&user_id).await;
        assert!(matches!(result.unwrap_err(), UserError::NotFound(_)));
    }
}
