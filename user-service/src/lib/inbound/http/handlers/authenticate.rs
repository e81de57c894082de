use auth::Credentials;
use auth::Role;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::router::AppState;

pub async fn authenticate(
    State(state): State<AppState>,
    Json(body): Json<AuthenticateRequestBody>,
) -> Result<ApiSuccess<AuthenticateResponseData>, ApiError> {
    tracing::info!(username = %body.username, "Authentication attempt");

    let result = state
        .authenticator
        .authenticate(Credentials::new(body.username, body.password))
        .await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        AuthenticateResponseData {
            token: result.token,
            username: result.username,
            email: result.email,
            role: result.role,
        },
    ))
}

#[derive(Clone, Deserialize)]
pub struct AuthenticateRequestBody {
    username: String,
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticateResponseData {
    pub token: String,
    pub username: String,
    pub email: String,
    pub role: Role,
}
