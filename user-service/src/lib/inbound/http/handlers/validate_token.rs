use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;

use super::ApiSuccess;
use crate::inbound::http::middleware::bearer_token;
use crate::inbound::http::router::AppState;

/// Answer whether the bearer token is currently valid for its own subject.
///
/// Never fails: a missing, malformed, expired or revoked token is `false`.
pub async fn validate_token(State(state): State<AppState>, headers: HeaderMap) -> ApiSuccess<bool> {
    let valid = bearer_token(&headers).is_some_and(|token| {
        state
            .token_validator
            .extract_subject(token)
            .is_ok_and(|subject| state.token_validator.validate(token, &subject))
    });

    tracing::debug!(valid, "Token validation completed");
    ApiSuccess::new(StatusCode::OK, valid)
}
