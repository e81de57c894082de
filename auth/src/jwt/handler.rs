use std::fmt;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::errors::TokenError;
use crate::principal::Role;

/// Session token codec.
///
/// Issues and decodes HS256 JWTs (`header.payload.signature`). The codec
/// holds no state besides the secret and the configured TTL, so any process
/// sharing the secret can decode tokens issued by any other. The current
/// time is always passed in by the caller.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    validation: Validation,
    ttl: Duration,
}

impl fmt::Debug for JwtHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtHandler")
            .field("algorithm", &self.algorithm)
            .field("ttl", &self.ttl)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtHandler {
    /// Create a codec signing with `secret` and issuing tokens valid for `ttl`.
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - The secret is read-only once the codec is built; share the codec
    ///   behind an `Arc` instead of rebuilding it
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let algorithm = Algorithm::HS256;

        let mut validation = Validation::new(algorithm);
        // Expiry is checked against the caller's clock once the signature holds.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm,
            validation,
            ttl,
        }
    }

    /// Lifetime given to every issued token.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `subject`, expiring at `now + ttl`.
    ///
    /// # Errors
    /// * `EncodingFailed` - Claims could not be serialized or signed
    pub fn issue(
        &self,
        subject: &str,
        role: Option<Role>,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        self.encode(&Claims::new(subject, role, now, self.ttl))
    }

    /// Sign prebuilt claims.
    ///
    /// # Errors
    /// * `EncodingFailed` - Claims could not be serialized or signed
    pub fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))
    }

    /// Verify and decode a token as of `now`.
    ///
    /// The signature is verified before the payload is trusted, and expiry
    /// is only evaluated on a verified payload.
    ///
    /// # Errors
    /// * `Malformed` - Not three segments, bad encoding or unexpected payload
    /// * `BadSignature` - Signature does not verify under this secret and algorithm
    /// * `Expired` - `now >= exp`
    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(classify)?
            .claims;

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

fn classify(error: jsonwebtoken::errors::Error) -> TokenError {
    match error.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::BadSignature,
        _ => TokenError::Malformed(error.to_string()),
    }
}
