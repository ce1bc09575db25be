/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `API_PRODUCTION`: Enables HSTS (default: false)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: *)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS` / `DATABASE_MIN_CONNECTIONS`: Pool bounds (default: 10 / 2)
/// - `DATABASE_CONNECT_TIMEOUT_SECONDS`: Pool acquire timeout (default: 30)
/// - `RUN_MIGRATIONS`: Apply migrations at startup (default: true)
/// - `JWT_SECRET`: Secret key for JWT signing (required, at least 32 characters)
/// - `JWT_ACCESS_TTL_MINUTES`: Access token lifetime (default: 1440)
/// - `JWT_REFRESH_TTL_DAYS`: Refresh token lifetime (default: 30)
/// - `PAGE_SIZE`: Default list page size (default: 5)
/// - `MAX_PAGE_SIZE`: Upper bound for `?page_size=` (default: 100)
/// - `LOG_FORMAT`: `json` for JSON logs, anything else for text
/// - `RUST_LOG`: Log filter
///
/// # Example
///
/// ```no_run
/// use projectmgr_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Minimum accepted JWT secret length
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// List pagination defaults
    pub pagination: PaginationConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Production mode (adds HSTS)
    pub production: bool,

    /// Allowed CORS origins; `*` means permissive
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,

    /// Minimum number of idle connections
    pub min_connections: u32,

    /// Pool acquire timeout
    pub connect_timeout_seconds: u64,

    /// Whether to apply pending migrations at startup
    pub run_migrations: bool,
}

impl DatabaseConfig {
    /// Pool settings for the shared connection pool
    pub fn pool_config(&self) -> projectmgr_shared::db::pool::DatabaseConfig {
        projectmgr_shared::db::pool::DatabaseConfig {
            url: self.url.clone(),
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            connect_timeout_seconds: self.connect_timeout_seconds,
            ..Default::default()
        }
    }
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    #[serde(skip_serializing)]
    pub secret: String,

    /// Access token lifetime in minutes
    pub access_ttl_minutes: i64,

    /// Refresh token lifetime in days
    pub refresh_ttl_days: i64,
}

impl JwtConfig {
    pub fn access_ttl(&self) -> Duration {
        Duration::minutes(self.access_ttl_minutes)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::days(self.refresh_ttl_days)
    }
}

/// Pagination configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Page size when `?page_size=` is absent or invalid
    pub page_size: i64,

    /// Upper bound for `?page_size=`
    pub max_page_size: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: 5,
            max_page_size: 100,
        }
    }
}

/// Reads an optional environment variable, parsing it when present
fn env_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value: {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

/// Splits a comma-separated origin list
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Configuration with every optional value at its default
    ///
    /// # Example
    ///
    /// ```
    /// use projectmgr_api::config::Config;
    ///
    /// let config = Config::with_defaults("postgresql://localhost/projectmgr", "x".repeat(32));
    /// assert_eq!(config.pagination.page_size, 5);
    /// assert_eq!(config.bind_address(), "0.0.0.0:8080");
    /// ```
    pub fn with_defaults(database_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                production: false,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: database_url.into(),
                max_connections: 10,
                min_connections: 2,
                connect_timeout_seconds: 30,
                run_migrations: true,
            },
            jwt: JwtConfig {
                secret: jwt_secret.into(),
                access_ttl_minutes: 24 * 60,
                refresh_ttl_days: 30,
            },
            pagination: PaginationConfig::default(),
        }
    }

    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        let defaults = Self::with_defaults(database_url, jwt_secret);

        let config = Self {
            api: ApiConfig {
                host: env::var("API_HOST").unwrap_or(defaults.api.host),
                port: env_or("API_PORT", defaults.api.port)?,
                production: env_or("API_PRODUCTION", defaults.api.production)?,
                cors_origins: env::var("CORS_ORIGINS")
                    .map(|raw| parse_origins(&raw))
                    .unwrap_or(defaults.api.cors_origins),
            },
            database: DatabaseConfig {
                url: defaults.database.url,
                max_connections: env_or("DATABASE_MAX_CONNECTIONS", defaults.database.max_connections)?,
                min_connections: env_or("DATABASE_MIN_CONNECTIONS", defaults.database.min_connections)?,
                connect_timeout_seconds: env_or(
                    "DATABASE_CONNECT_TIMEOUT_SECONDS",
                    defaults.database.connect_timeout_seconds,
                )?,
                run_migrations: env_or("RUN_MIGRATIONS", defaults.database.run_migrations)?,
            },
            jwt: JwtConfig {
                secret: defaults.jwt.secret,
                access_ttl_minutes: env_or("JWT_ACCESS_TTL_MINUTES", defaults.jwt.access_ttl_minutes)?,
                refresh_ttl_days: env_or("JWT_REFRESH_TTL_DAYS", defaults.jwt.refresh_ttl_days)?,
            },
            pagination: PaginationConfig {
                page_size: env_or("PAGE_SIZE", defaults.pagination.page_size)?,
                max_page_size: env_or("MAX_PAGE_SIZE", defaults.pagination.max_page_size)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jwt.secret.len() < MIN_JWT_SECRET_LENGTH {
            anyhow::bail!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            );
        }
        if self.jwt.access_ttl_minutes <= 0 || self.jwt.refresh_ttl_days <= 0 {
            anyhow::bail!("JWT token lifetimes must be positive");
        }
        if self.pagination.page_size < 1 || self.pagination.max_page_size < 1 {
            anyhow::bail!("PAGE_SIZE and MAX_PAGE_SIZE must be positive");
        }
        if self.pagination.page_size > self.pagination.max_page_size {
            anyhow::bail!("PAGE_SIZE must not exceed MAX_PAGE_SIZE");
        }
        Ok(())
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Whether CORS should be permissive
    pub fn cors_permissive(&self) -> bool {
        self.api.cors_origins.iter().any(|o| o == "*")
    }
}
