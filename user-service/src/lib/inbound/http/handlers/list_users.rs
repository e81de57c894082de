use auth::Caller;
use auth::Owner;
use auth::Role;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use chrono::DateTime;
use chrono::NaiveDateTime;
use chrono::Utc;
use serde::Deserialize;

use super::require;
use super::ApiError;
use super::ApiSuccess;
use super::UserData;
use crate::domain::user::models::User;
use crate::inbound::http::router::AppState;
use crate::user::errors::UserError;

// Every listing is admin-only.

fn to_data(users: Vec<User>) -> ApiSuccess<Vec<UserData>> {
    ApiSuccess::new(StatusCode::OK, users.iter().map(UserData::from).collect())
}

fn parse_role(role: &str) -> Result<Role, ApiError> {
    role.parse::<Role>()
        .map_err(|e| ApiError::from(UserError::from(e)))
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<ApiSuccess<Vec<UserData>>, ApiError> {
    require(&caller, Role::Admin, Owner::Nobody)?;

    let users = state.user_service.list_users().await?;
    Ok(to_data(users))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    keyword: String,
}

pub async fn search_users(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<SearchQuery>,
) -> Result<ApiSuccess<Vec<UserData>>, ApiError> {
    require(&caller, Role::Admin, Owner::Nobody)?;

    let users = state.user_service.search_users(&query.keyword).await?;
    Ok(to_data(users))
}

pub async fn list_active_users(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<ApiSuccess<Vec<UserData>>, ApiError> {
    require(&caller, Role::Admin, Owner::Nobody)?;

    let users = state.user_service.list_active_users().await?;
    Ok(to_data(users))
}

#[derive(Debug, Deserialize)]
pub struct CreatedAfterQuery {
    start_date: String,
}

/// Accepts RFC 3339 timestamps, or a naive `YYYY-MM-DDTHH:MM:SS` read as UTC.
fn parse_start_date(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|n| n.and_utc()))
        .map_err(|e| ApiError::BadRequest(format!("Invalid start_date '{}': {}", raw, e)))
}

pub async fn list_users_created_after(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<CreatedAfterQuery>,
) -> Result<ApiSuccess<Vec<UserData>>, ApiError> {
    require(&caller, Role::Admin, Owner::Nobody)?;
    let start = parse_start_date(&query.start_date)?;

    let users = state.user_service.list_users_created_after(start).await?;
    Ok(to_data(users))
}

pub async fn list_users_by_role(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(role): Path<String>,
) -> Result<ApiSuccess<Vec<UserData>>, ApiError> {
    require(&caller, Role::Admin, Owner::Nobody)?;
    let role = parse_role(&role)?;

    let users = state.user_service.list_users_by_role(role).await?;
    Ok(to_data(users))
}

pub async fn count_users_by_role(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(role): Path<String>,
) -> Result<ApiSuccess<u64>, ApiError> {
    require(&caller, Role::Admin, Owner::Nobody)?;
    let role = parse_role(&role)?;

    let count = state.user_service.count_users_by_role(role).await?;
    Ok(ApiSuccess::new(StatusCode::OK, count))
}
