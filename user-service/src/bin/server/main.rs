use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use user_service::config::Config;
use user_service::inbound::http::router::create_application;
use user_service::outbound::repositories::InMemoryUserRepository;
use user_service::outbound::repositories::PostgresUserRepository;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "user_service=debug,auth=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "user-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    let storage = match config.database.url {
        Some(_) => "postgresql",
        None => "in-memory",
    };
    tracing::info!(
        database = storage,
        http_port = config.server.http_port,
        token_ttl_hours = config.jwt.expiration_hours,
        "Configuration loaded"
    );

    if config.jwt.has_weak_secret() {
        tracing::warn!(
            secret_bytes = config.jwt.secret.len(),
            recommended_bytes = user_service::config::JwtConfig::RECOMMENDED_SECRET_BYTES,
            "JWT secret is shorter than recommended"
        );
    }

    let http_application = match &config.database.url {
        Some(url) => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(url)
                .await?;
            tracing::info!(
                max_connections = config.database.max_connections,
                database = "postgresql",
                "Database connection pool created"
            );

            sqlx::migrate!("./migrations").run(&pg_pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            create_application(Arc::new(PostgresUserRepository::new(pg_pool)), &config.jwt)
        }
        None => {
            tracing::warn!("No database.url configured, users are kept in memory");
            create_application(Arc::new(InMemoryUserRepository::new()), &config.jwt)
        }
    };

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    axum::serve(http_listener, http_application).await?;
    tracing::info!("Server exited");

    Ok(())
}
