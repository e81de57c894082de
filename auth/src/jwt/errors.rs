use thiserror::Error;

/// Error type for token operations.
///
/// Decode failures are reported in the order they are checked: segment
/// and header structure, signature, payload, expiry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token is malformed: {0}")]
    Malformed(String),

    #[error("Token signature is invalid")]
    BadSignature,

    #[error("Token is expired")]
    Expired,

    #[error("Token has been revoked")]
    Revoked,

    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),
}
