use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use auth::JwtHandler;
use auth::RevocationList;
use auth::TokenValidator;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::authenticate::authenticate;
use super::handlers::current_user::current_user;
use super::handlers::delete_user::delete_user;
use super::handlers::get_user::get_user;
use super::handlers::get_user::get_user_by_username;
use super::handlers::list_users::count_users_by_role;
use super::handlers::list_users::list_active_users;
use super::handlers::list_users::list_users;
use super::handlers::list_users::list_users_by_role;
use super::handlers::list_users::list_users_created_after;
use super::handlers::list_users::search_users;
use super::handlers::logout::logout;
use super::handlers::register_user::register_user;
use super::handlers::update_user::update_user;
use super::handlers::validate_token::validate_token;
use super::middleware::authenticate as auth_middleware;
use crate::config::JwtConfig;
use crate::domain::user::credentials::RepositoryCredentialStore;
use crate::domain::user::ports::UserRepository;
use crate::domain::user::ports::UserServicePort;
use crate::domain::user::service::UserService;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserServicePort>,
    pub authenticator: Arc<Authenticator>,
    pub token_validator: Arc<TokenValidator>,
}

/// Wire the user service, authenticator and token validator over one
/// repository and build the router.
pub fn create_application<UR>(repository: Arc<UR>, jwt: &JwtConfig) -> Router
where
    UR: UserRepository,
{
    let jwt_handler = Arc::new(JwtHandler::new(jwt.secret.as_bytes(), jwt.token_ttl()));
    let credential_store = Arc::new(RepositoryCredentialStore::new(Arc::clone(&repository)));

    let user_service = Arc::new(UserService::new(repository));
    let authenticator = Arc::new(Authenticator::new(credential_store, Arc::clone(&jwt_handler)));
    let token_validator = Arc::new(TokenValidator::new(jwt_handler, RevocationList::new()));

    create_router(user_service, authenticator, token_validator)
}

pub fn create_router(
    user_service: Arc<dyn UserServicePort>,
    authenticator: Arc<Authenticator>,
    token_validator: Arc<TokenValidator>,
) -> Router {
    let state = AppState {
        user_service,
        authenticator,
        token_validator,
    };

    let public_routes = Router::new()
        .route("/auth/login", post(authenticate))
        .route("/auth/register", post(register_user))
        .route("/auth/validate", post(validate_token));

    let protected_routes = Router::new()
        .route("/auth/me", get(current_user))
        .route("/auth/logout", post(logout))
        .route("/", get(list_users))
        .route("/search", get(search_users))
        .route("/active", get(list_active_users))
        .route("/created-after", get(list_users_created_after))
        .route("/role/:role", get(list_users_by_role))
        .route("/role/:role/count", get(count_users_by_role))
        .route("/username/:username", get(get_user_by_username))
        .route(
            "/:user_id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            // Headers are left out of the span: they carry bearer tokens.
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    let users = Router::new().merge(public_routes).merge(protected_routes);

    Router::new()
        .nest("/api/v1/users", users)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
