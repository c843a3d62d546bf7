/// Configuration management for the API server
///
/// Configuration is read once at startup from environment variables (a
/// `.env` file is honoured in development) into a typed [`Config`].
///
/// # Environment Variables
///
/// - `API_HOST` / `API_PORT`: bind address (default `0.0.0.0:4113`)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default 10)
/// - `JWT_SECRET`: token signing key, at least 32 characters (required)
/// - `JWT_ISSUER`: `iss` claim (default `tokoku`)
/// - `JWT_EXPIRATION_SECONDS`: token lifetime, `0` disables expiry (default 86400,
///   at most ten years)
/// - `HASH_MAX_CONCURRENCY`: concurrent password hashes (default 4)
/// - `ARGON2_MEMORY_KIB` / `ARGON2_ITERATIONS` / `ARGON2_PARALLELISM`: hashing cost
/// - `REDIS_URL`: revocation backend; in-memory when unset
/// - `CORS_ORIGINS`: comma-separated origins or `*` (default `*`)
/// - `PRODUCTION`: enables HSTS (default false)
/// - `RUST_LOG` / `LOG_FORMAT`: logging, see `main.rs`
///
/// # Example
///
/// ```no_run
/// use tokoku_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use chrono::Duration;
use std::env;
use std::fmt;
use std::str::FromStr;
use tokoku_shared::auth::password::HashingConfig;

/// Minimum accepted signing key length
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime (ten years)
pub const MAX_EXPIRATION_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub hashing: HashingSettings,
    pub redis: RedisSettings,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `["*"]` allows any
    pub cors_origins: Vec<String>,

    /// Production mode (adds HSTS)
    pub production: bool,
}

/// Database configuration
#[derive(Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Token configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Signing key
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Issuer claim
    pub issuer: String,

    /// Token lifetime in seconds; `0` means tokens never expire
    ///
    /// Capped at [`MAX_EXPIRATION_SECONDS`].
    pub expiration_seconds: u64,
}

impl JwtConfig {
    /// Token lifetime, `None` when expiry is disabled
    pub fn ttl(&self) -> Option<Duration> {
        match self.expiration_seconds {
            0 => None,
            secs => Some(Duration::seconds(secs.min(MAX_EXPIRATION_SECONDS) as i64)),
        }
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("expiration_seconds", &self.expiration_seconds)
            .finish()
    }
}

/// Password hashing configuration
#[derive(Debug, Clone)]
pub struct HashingSettings {
    /// Maximum simultaneous hash/verify operations
    pub max_concurrency: usize,

    /// Argon2id cost parameters
    pub params: HashingConfig,
}

/// Revocation backend configuration
#[derive(Clone, Default)]
pub struct RedisSettings {
    /// Redis URL; `None` selects the in-memory revocation list
    pub url: Option<String>,
}

impl fmt::Debug for RedisSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisSettings")
            .field("url", &self.url.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value", key)),
        None => Ok(default),
    }
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a value does not
    /// parse, `JWT_SECRET` is shorter than 32 characters, or
    /// `JWT_EXPIRATION_SECONDS` exceeds [`MAX_EXPIRATION_SECONDS`].
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "API_PORT", 4113u16)?;

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let production = parse_or(&lookup, "PRODUCTION", false)?;

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?;

        let secret = lookup("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if secret.len() < MIN_SECRET_LEN {
            anyhow::bail!("JWT_SECRET must be at least {} characters long", MIN_SECRET_LEN);
        }

        let issuer = lookup("JWT_ISSUER").unwrap_or_else(|| "tokoku".to_string());
        let expiration_seconds = parse_or(&lookup, "JWT_EXPIRATION_SECONDS", 86_400u64)?;
        if expiration_seconds > MAX_EXPIRATION_SECONDS {
            anyhow::bail!(
                "JWT_EXPIRATION_SECONDS must be at most {} (ten years)",
                MAX_EXPIRATION_SECONDS
            );
        }

        let defaults = HashingConfig::default();
        let hashing = HashingSettings {
            max_concurrency: parse_or(&lookup, "HASH_MAX_CONCURRENCY", 4usize)?.max(1),
            params: HashingConfig {
                memory_kib: parse_or(&lookup, "ARGON2_MEMORY_KIB", defaults.memory_kib)?,
                iterations: parse_or(&lookup, "ARGON2_ITERATIONS", defaults.iterations)?,
                parallelism: parse_or(&lookup, "ARGON2_PARALLELISM", defaults.parallelism)?,
            },
        };

        let redis = RedisSettings {
            url: lookup("REDIS_URL").filter(|url| !url.trim().is_empty()),
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret,
                issuer,
                expiration_seconds,
            },
            hashing,
            redis,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
