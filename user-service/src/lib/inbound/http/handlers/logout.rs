use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::middleware::bearer_token;
use crate::inbound::http::router::AppState;

/// Revoke the presented token for the rest of its lifetime.
///
/// Runs behind the authentication middleware, so the token is known to be
/// valid when this is reached.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<ApiSuccess<LogoutResponseData>, ApiError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    let claims = state.token_validator.revoke(token).map_err(|e| {
        tracing::warn!(error = %e, "Logout with unusable token");
        ApiError::Unauthorized("Invalid or expired token".to_string())
    })?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        LogoutResponseData {
            revoked_until: claims.expires_at(),
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogoutResponseData {
    pub revoked_until: Option<DateTime<Utc>>,
}
