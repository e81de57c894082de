use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;

use crate::jwt::Claims;
use crate::jwt::JwtHandler;
use crate::jwt::RevocationList;
use crate::jwt::TokenError;

/// Decides whether a presented bearer token is acceptable.
///
/// `validate` answers yes/no for a known subject; `extract_subject` resolves
/// the caller and keeps the failure reason for diagnostics.
#[derive(Debug)]
pub struct TokenValidator {
    jwt_handler: Arc<JwtHandler>,
    revocations: RevocationList,
}

impl TokenValidator {
    pub fn new(jwt_handler: Arc<JwtHandler>, revocations: RevocationList) -> Self {
        Self {
            jwt_handler,
            revocations,
        }
    }

    /// True only if the token decodes now and belongs to `expected_subject`.
    pub fn validate(&self, token: &str, expected_subject: &str) -> bool {
        self.validate_at(token, expected_subject, Utc::now())
    }

    pub fn validate_at(&self, token: &str, expected_subject: &str, now: DateTime<Utc>) -> bool {
        match self.claims_at(token, now) {
            Ok(claims) => claims.subject() == expected_subject,
            Err(e) => {
                tracing::debug!(error = %e, "Token rejected");
                false
            }
        }
    }

    /// Resolve the subject of a token.
    ///
    /// # Errors
    /// * `Malformed`, `BadSignature`, `Expired` - from decoding
    /// * `Revoked` - the token was logged out
    pub fn extract_subject(&self, token: &str) -> Result<String, TokenError> {
        self.extract_subject_at(token, Utc::now())
    }

    pub fn extract_subject_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        self.claims_at(token, now).map(|claims| claims.sub)
    }

    /// Decode a token and check it against the revocation list.
    pub fn claims_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let claims = self.jwt_handler.decode(token, now)?;

        if self.revocations.is_revoked(&claims.jti, now) {
            return Err(TokenError::Revoked);
        }

        Ok(claims)
    }

    /// Revoke a currently valid token for the rest of its lifetime.
    ///
    /// # Errors
    /// Any error `claims_at` reports; an unusable token cannot be revoked.
    pub fn revoke(&self, token: &str) -> Result<Claims, TokenError> {
        self.revoke_at(token, Utc::now())
    }

    pub fn revoke_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let claims = self.claims_at(token, now)?;
        self.revocations.revoke(&claims, now);
        tracing::info!(subject = %claims.sub, jti = %claims.jti, "Token revoked");
        Ok(claims)
    }
}
