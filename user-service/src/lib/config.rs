use std::env;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string. When absent the service keeps users in memory.
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
}

impl JwtConfig {
    /// Secrets shorter than this are accepted but reported at startup.
    pub const RECOMMENDED_SECRET_BYTES: usize = 32;

    /// Longest accepted token lifetime, one year.
    pub const MAX_EXPIRATION_HOURS: i64 = 24 * 366;

    pub fn has_weak_secret(&self) -> bool {
        self.secret.len() < Self::RECOMMENDED_SECRET_BYTES
    }

    /// Token lifetime, clamped to `1..=MAX_EXPIRATION_HOURS` hours.
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.expiration_hours.clamp(1, Self::MAX_EXPIRATION_HOURS))
    }

    /// Reject settings no token could be issued with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::Message("jwt.secret must not be empty".to_string()));
        }

        if !(1..=Self::MAX_EXPIRATION_HOURS).contains(&self.expiration_hours) {
            return Err(ConfigError::Message(format!(
                "jwt.expiration_hours must be between 1 and {}, got {}",
                Self::MAX_EXPIRATION_HOURS,
                self.expiration_hours
            )));
        }

        Ok(())
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[hidden]")
            .field("expiration_hours", &self.expiration_hours)
            .finish()
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, JWT__SECRET, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    /// 4. Built-in defaults (everything except `jwt.secret`)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .set_default("database.max_connections", 5)?
            .set_default("server.http_port", 8081)?
            .set_default("jwt.expiration_hours", 24)?
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on environment-specific configuration
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Layer on environment variables (with __ as separator)
            // Example: DATABASE__URL=postgres://... overrides database.url
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.jwt.validate()?;

        Ok(config)
    }
}
