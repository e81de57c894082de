use auth::Caller;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use crate::domain::user::models::User;
use crate::domain::user::models::Username;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;
use crate::user::errors::UserError;

const BEARER_PREFIX: &str = "Bearer ";

/// Middleware that resolves the bearer token to a [`Caller`] and adds it to
/// request extensions.
///
/// Rejects with 401 when the header is missing, the token is malformed,
/// badly signed, expired or revoked, or its subject no longer maps to an
/// enabled user.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = bearer_token(req.headers()).ok_or_else(|| {
        unauthorized("Missing or invalid Authorization header. Expected: Bearer <token>")
    })?;

    let username = state.token_validator.extract_subject(token).map_err(|e| {
        tracing::warn!(error = %e, "Token validation failed");
        unauthorized("Invalid or expired token")
    })?;

    let user = resolve_user(&state, &username).await?;

    req.extensions_mut().insert(Caller {
        principal_id: user.id.0,
        username: user.username.to_string(),
        role: user.role,
    });

    Ok(next.run(req).await)
}

async fn resolve_user(state: &AppState, subject: &str) -> Result<User, Response> {
    let username = Username::new(subject.to_string()).map_err(|e| {
        tracing::warn!(error = %e, "Token subject is not a valid username");
        unauthorized("Invalid or expired token")
    })?;

    match state.user_service.get_user_by_username(&username).await {
        Ok(user) if user.enabled => Ok(user),
        Ok(_) => {
            tracing::warn!(username = %username, "Token presented for disabled user");
            Err(unauthorized("Invalid or expired token"))
        }
        Err(UserError::NotFoundByUsername(_)) => {
            tracing::warn!(username = %username, "Token subject no longer exists");
            Err(unauthorized("Invalid or expired token"))
        }
        Err(e) => Err(ApiError::from(e).into_response()),
    }
}

/// Token carried in an `Authorization: Bearer <token>` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn unauthorized(message: &str) -> Response {
    ApiError::Unauthorized(message.to_string()).into_response()
}
