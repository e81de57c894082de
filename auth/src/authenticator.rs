use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;
use thiserror::Error;
use tokio::task;

use crate::jwt::JwtHandler;
use crate::jwt::TokenError;
use crate::password::PasswordError;
use crate::password::PasswordHasher;
use crate::password::DUMMY_HASH;
use crate::principal::AuthResult;
use crate::principal::Credentials;
use crate::store::CredentialStore;
use crate::store::StoreError;

/// Authentication failure as reported to callers.
///
/// Every cause (unknown user, wrong password, disabled account, store or
/// signing failure) maps to the same variant and message. The cause is
/// only written to the log.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,
}

/// Authentication coordinator.
///
/// Looks the principal up, verifies the password, issues a token and
/// records the login. Holds no per-request state; share it behind an `Arc`.
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    password_hasher: PasswordHasher,
    jwt_handler: Arc<JwtHandler>,
}

#[derive(Debug)]
enum Rejection {
    UnknownPrincipal,
    PasswordMismatch,
    Disabled,
    Password(PasswordError),
    Verifier(task::JoinError),
    Store(StoreError),
    Token(TokenError),
}

impl Rejection {
    fn log(&self, username: &str) {
        match self {
            Rejection::UnknownPrincipal => {
                tracing::warn!(username, reason = "unknown principal", "Authentication rejected")
            }
            Rejection::PasswordMismatch => {
                tracing::warn!(username, reason = "password mismatch", "Authentication rejected")
            }
            Rejection::Disabled => {
                tracing::warn!(username, reason = "account disabled", "Authentication rejected")
            }
            Rejection::Password(e) => {
                tracing::error!(username, error = %e, "Stored password hash unusable")
            }
            Rejection::Verifier(e) => {
                tracing::error!(username, error = %e, "Password verification task failed")
            }
            Rejection::Store(e) => {
                tracing::error!(username, error = %e, "Credential store failed during authentication")
            }
            Rejection::Token(e) => {
                tracing::error!(username, error = %e, "Token issue failed")
            }
        }
    }
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `store` - Credential store adapter
    /// * `jwt_handler` - Shared token codec
    pub fn new(store: Arc<dyn CredentialStore>, jwt_handler: Arc<JwtHandler>) -> Self {
        Self {
            store,
            password_hasher: PasswordHasher::new(),
            jwt_handler,
        }
    }

    /// Authenticate against the current wall clock.
    ///
    /// # Errors
    /// * `InvalidCredentials` - For every failure cause
    pub async fn authenticate(&self, credentials: Credentials) -> Result<AuthResult, AuthError> {
        self.authenticate_at(credentials, Utc::now()).await
    }

    /// Authenticate as of `now`, which becomes the token's issue time and
    /// the recorded `last_login`.
    ///
    /// On success the store is updated exactly once; on failure it is
    /// never written.
    ///
    /// # Errors
    /// * `InvalidCredentials` - For every failure cause
    pub async fn authenticate_at(
        &self,
        credentials: Credentials,
        now: DateTime<Utc>,
    ) -> Result<AuthResult, AuthError> {
        match self.try_authenticate(&credentials, now).await {
            Ok(result) => {
                tracing::info!(username = %result.username, role = %result.role, "Authentication succeeded");
                Ok(result)
            }
            Err(rejection) => {
                rejection.log(&credentials.username);
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    async fn try_authenticate(
        &self,
        credentials: &Credentials,
        now: DateTime<Utc>,
    ) -> Result<AuthResult, Rejection> {
        let principal = self
            .store
            .find_by_username(&credentials.username)
            .await
            .map_err(Rejection::Store)?;

        let Some(principal) = principal else {
            // Spend the same hashing time as a real mismatch.
            let _ = self
                .verify_password(&credentials.password, DUMMY_HASH.to_string())
                .await;
            return Err(Rejection::UnknownPrincipal);
        };

        let matches = self
            .verify_password(&credentials.password, principal.password_hash.clone())
            .await?;

        if !matches {
            return Err(Rejection::PasswordMismatch);
        }

        if !principal.enabled {
            return Err(Rejection::Disabled);
        }

        let token = self
            .jwt_handler
            .issue(&principal.username, Some(principal.role), now)
            .map_err(Rejection::Token)?;

        self.store
            .record_login(&principal.id, now)
            .await
            .map_err(Rejection::Store)?;

        Ok(AuthResult {
            token,
            username: principal.username,
            email: principal.email,
            role: principal.role,
        })
    }

    /// Run Argon2 on the blocking pool so logins do not stall async workers.
    async fn verify_password(&self, password: &str, stored_hash: String) -> Result<bool, Rejection> {
        let hasher = self.password_hasher;
        let password = password.to_string();

        task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
            .await
            .map_err(Rejection::Verifier)?
            .map_err(Rejection::Password)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::atomic::AtomicBool;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use mockall::mock;
    use uuid::Uuid;

    use super::*;
    use crate::principal::Principal;
    use crate::principal::Role;

    mock! {
        pub TestCredentialStore {}

        #[async_trait]
        impl CredentialStore for TestCredentialStore {
            async fn find_by_username(&self, username: &str) -> Result<Option<Principal>, StoreError>;
            async fn record_login(&self, principal_id: &Uuid, at: DateTime<Utc>) -> Result<(), StoreError>;
        }
    }

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(seconds, 0).unwrap()
    }

    fn jwt_handler() -> Arc<JwtHandler> {
        Arc::new(JwtHandler::new(SECRET, Duration::hours(24)))
    }

    fn principal(password: &str) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: PasswordHasher::new().hash(password).unwrap(),
            role: Role::User,
            enabled: true,
            created_at: at(0),
            last_login: None,
        }
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let mut store = MockTestCredentialStore::new();
        let alice = principal("correct horse");
        let alice_id = alice.id;

        store
            .expect_find_by_username()
            .withf(|username| username == "alice")
            .times(1)
            .returning(move |_| Ok(Some(alice.clone())));
        store
            .expect_record_login()
            .withf(move |id, login_at| *id == alice_id && *login_at == at(3_600))
            .times(1)
            .returning(|_, _| Ok(()));

        let jwt_handler = jwt_handler();
        let authenticator = Authenticator::new(Arc::new(store), Arc::clone(&jwt_handler));

        let result = authenticator
            .authenticate_at(Credentials::new("alice", "correct horse"), at(3_600))
            .await
            .expect("Authentication failed");

        assert_eq!(result.username, "alice");
        assert_eq!(result.email, "alice@example.com");
        assert_eq!(result.role, Role::User);

        let claims = jwt_handler
            .decode(&result.token, at(3_601))
            .expect("Token validation failed");
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, Some(Role::User));
        assert_eq!(claims.iat, 3_600);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_password_check_leaves_the_runtime_free() {
        let mut store = MockTestCredentialStore::new();
        let alice = principal("correct horse");

        store
            .expect_find_by_username()
            .returning(move |_| Ok(Some(alice.clone())));
        store.expect_record_login().returning(|_, _| Ok(()));

        let authenticator = Authenticator::new(Arc::new(store), jwt_handler());
        let done = AtomicBool::new(false);
        let ticks = AtomicUsize::new(0);

        let login = async {
            let result = authenticator
                .authenticate(Credentials::new("alice", "correct horse"))
                .await;
            done.store(true, Ordering::SeqCst);
            result
        };
        let ticker = async {
            while !done.load(Ordering::SeqCst) {
                ticks.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            }
        };

        let (result, ()) = tokio::join!(login, ticker);

        assert!(result.is_ok());
        // The single worker thread kept ticking while Argon2 ran elsewhere.
        assert!(ticks.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let mut store = MockTestCredentialStore::new();
        let alice = principal("correct horse");

        store
            .expect_find_by_username()
            .times(1)
            .returning(move |_| Ok(Some(alice.clone())));
        store.expect_record_login().times(0);

        let authenticator = Authenticator::new(Arc::new(store), jwt_handler());

        let result = authenticator
            .authenticate(Credentials::new("alice", "wrongpass"))
            .await;
        assert_eq!(result, Err(AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_are_indistinguishable() {
        let mut store = MockTestCredentialStore::new();
        let alice = principal("correct horse");

        store
            .expect_find_by_username()
            .returning(move |username| Ok((username == "alice").then(|| alice.clone())));
        store.expect_record_login().times(0);

        let authenticator = Authenticator::new(Arc::new(store), jwt_handler());

        let wrong_password = authenticator
            .authenticate(Credentials::new("alice", "wrongpass"))
            .await
            .unwrap_err();
        let unknown_user = authenticator
            .authenticate(Credentials::new("nouser", "anything"))
            .await
            .unwrap_err();

        assert_eq!(wrong_password, unknown_user);
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_disabled_principal_is_rejected() {
        let mut store = MockTestCredentialStore::new();
        let mut alice = principal("correct horse");
        alice.enabled = false;

        store
            .expect_find_by_username()
            .times(1)
            .returning(move |_| Ok(Some(alice.clone())));
        store.expect_record_login().times(0);

        let authenticator = Authenticator::new(Arc::new(store), jwt_handler());

        let result = authenticator
            .authenticate(Credentials::new("alice", "correct horse"))
            .await;
        assert_eq!(result, Err(AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_store_lookup_failure_fails_closed() {
        let mut store = MockTestCredentialStore::new();

        store
            .expect_find_by_username()
            .times(1)
            .returning(|_| Err(StoreError::Unavailable("connection refused".to_string())));
        store.expect_record_login().times(0);

        let authenticator = Authenticator::new(Arc::new(store), jwt_handler());

        let error = authenticator
            .authenticate(Credentials::new("alice", "correct horse"))
            .await
            .unwrap_err();
        assert_eq!(error, AuthError::InvalidCredentials);
        assert!(!error.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_store_update_failure_fails_closed() {
        let mut store = MockTestCredentialStore::new();
        let alice = principal("correct horse");

        store
            .expect_find_by_username()
            .times(1)
            .returning(move |_| Ok(Some(alice.clone())));
        store
            .expect_record_login()
            .times(1)
            .returning(|_, _| Err(StoreError::Unavailable("timeout".to_string())));

        let authenticator = Authenticator::new(Arc::new(store), jwt_handler());

        let result = authenticator
            .authenticate(Credentials::new("alice", "correct horse"))
            .await;
        assert_eq!(result, Err(AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_malformed_stored_hash_fails_closed() {
        let mut store = MockTestCredentialStore::new();
        let mut alice = principal("correct horse");
        alice.password_hash = "not-a-phc-string".to_string();

        store
            .expect_find_by_username()
            .times(1)
            .returning(move |_| Ok(Some(alice.clone())));
        store.expect_record_login().times(0);

        let authenticator = Authenticator::new(Arc::new(store), jwt_handler());

        let result = authenticator
            .authenticate(Credentials::new("alice", "correct horse"))
            .await;
        assert_eq!(result, Err(AuthError::InvalidCredentials));
    }
}
