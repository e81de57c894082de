use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::principal::Role;

/// Claims carried by a session token.
///
/// `iat` and `exp` are whole Unix seconds, with `exp` rounded up so that
/// standard verifiers never reject a token early. `exp_nanos` keeps the
/// sub-second part of the exact expiry. A token is live for
/// `issued_at <= now < issued_at + ttl`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp, rounded up)
    pub exp: i64,

    /// Sub-second part of the exact expiration, 0 when `exp` is exact
    #[serde(default)]
    pub exp_nanos: u32,

    /// Role of the subject at issue time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    /// Token identifier, used as the revocation key
    pub jti: String,
}

impl Claims {
    /// Build claims for `subject`, issued at `issued_at` and expiring `ttl` later.
    pub fn new(
        subject: impl ToString,
        role: Option<Role>,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let exp_nanos = expires_at.timestamp_subsec_nanos();

        Self {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp() + i64::from(exp_nanos > 0),
            exp_nanos,
            role,
            jti: Uuid::new_v4().to_string(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.sub
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    /// Exact expiry instant, `None` if the claims do not describe one.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match self.exp_nanos {
            0 => DateTime::from_timestamp(self.exp, 0),
            nanos => DateTime::from_timestamp(self.exp - 1, nanos),
        }
    }

    /// Check expiry against the supplied clock. Expired from the exact
    /// expiry instant onwards.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().map_or(true, |expires_at| now >= expires_at)
    }

    /// Time left before expiry, `None` once expired.
    pub fn remaining_lifetime(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expires_at()
            .map(|expires_at| expires_at - now)
            .filter(|remaining| *remaining > Duration::zero())
    }
}
