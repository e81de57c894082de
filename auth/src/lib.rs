//! Authentication core
//!
//! Provides the credential and session-token machinery shared by services:
//! - Password hashing and verification (Argon2id)
//! - Signed, expiring session tokens (HS256 JWT) with an injected clock
//! - Token validation, caller resolution and revocation
//! - Login orchestration over a service-provided credential store
//! - A pure role-or-owner authorization check
//!
//! Services adapt their own persistence to [`CredentialStore`] and keep the
//! resulting [`Caller`] in request scope.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash).unwrap());
//! assert!(!hasher.verify("not_my_password", &hash).unwrap());
//! ```
//!
//! ## Session Tokens
//! ```
//! use std::sync::Arc;
//!
//! use auth::{JwtHandler, RevocationList, Role, TokenValidator};
//! use chrono::{Duration, Utc};
//!
//! let handler = Arc::new(JwtHandler::new(
//!     b"secret_key_at_least_32_bytes_long!",
//!     Duration::hours(24),
//! ));
//! let now = Utc::now();
//! let token = handler.issue("alice", Some(Role::User), now).unwrap();
//!
//! let validator = TokenValidator::new(Arc::clone(&handler), RevocationList::default());
//! assert!(validator.validate_at(&token, "alice", now));
//! assert!(!validator.validate_at(&token, "bob", now));
//! assert!(!validator.validate_at(&token, "alice", now + Duration::hours(25)));
//! ```

pub mod authenticator;
pub mod authorization;
pub mod jwt;
pub mod password;
pub mod principal;
pub mod store;
pub mod validator;

// Re-export commonly used items
pub use authenticator::AuthError;
pub use authenticator::Authenticator;
pub use authorization::authorize;
pub use authorization::Access;
pub use authorization::Caller;
pub use authorization::Owner;
pub use jwt::Claims;
pub use jwt::JwtHandler;
pub use jwt::RevocationList;
pub use jwt::TokenError;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use principal::AuthResult;
pub use principal::Credentials;
pub use principal::Principal;
pub use principal::Role;
pub use store::CredentialStore;
pub use store::StoreError;
pub use validator::TokenValidator;
