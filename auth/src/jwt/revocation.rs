use std::time::Instant;

use chrono::DateTime;
use chrono::Utc;
use moka::sync::Cache;
use moka::Expiry;

use super::claims::Claims;

/// Deny-list of revoked token identifiers.
///
/// Entries are keyed by `jti` and evicted only once the token they block
/// would have expired anyway, so the list never outgrows the set of live
/// tokens. A live entry is never evicted. The list is local to the process.
#[derive(Debug, Clone)]
pub struct RevocationList {
    revoked: Cache<String, RevokedToken>,
}

#[derive(Debug, Clone, Copy)]
struct RevokedToken {
    expires_at: DateTime<Utc>,
    remaining: std::time::Duration,
}

struct UntilTokenExpiry;

impl Expiry<String, RevokedToken> for UntilTokenExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &RevokedToken,
        _created_at: Instant,
    ) -> Option<std::time::Duration> {
        Some(value.remaining)
    }
}

impl RevocationList {
    pub fn new() -> Self {
        Self {
            revoked: Cache::builder().expire_after(UntilTokenExpiry).build(),
        }
    }

    /// Block the token described by `claims` until it expires.
    ///
    /// Already expired tokens are not recorded.
    pub fn revoke(&self, claims: &Claims, now: DateTime<Utc>) {
        let (Some(expires_at), Some(remaining)) = (
            claims.expires_at(),
            claims
                .remaining_lifetime(now)
                .and_then(|remaining| remaining.to_std().ok()),
        ) else {
            return;
        };

        self.revoked.insert(
            claims.jti.clone(),
            RevokedToken {
                expires_at,
                remaining,
            },
        );
    }

    pub fn is_revoked(&self, jti: &str, now: DateTime<Utc>) -> bool {
        self.revoked
            .get(jti)
            .map_or(false, |entry| now < entry.expires_at)
    }
}

impl Default for RevocationList {
    fn default() -> Self {
        Self::new()
    }
}
