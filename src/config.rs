//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::path::PathBuf;

use crate::auth::DEFAULT_TOKEN_TTL_DAYS;

/// Signing secret used when `JWT_SECRET` is unset. Refused in production.
pub const DEFAULT_JWT_SECRET: &str = "change-this-secret";

/// Where the application keeps its data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Single JSON document on disk
    File { path: PathBuf },
    /// PostgreSQL database
    Postgres {
        database_url: String,
        max_connections: u32,
    },
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// HMAC secret for session tokens
    pub jwt_secret: String,

    /// Session token validity in days
    pub token_ttl_days: i64,

    /// bcrypt work factor
    pub bcrypt_cost: u32,

    pub storage: StorageBackend,

    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = var("HOST", "127.0.0.1");

        let port = var("PORT", "8000")
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let environment = var("ENVIRONMENT", "development");

        let jwt_secret = var("JWT_SECRET", DEFAULT_JWT_SECRET);
        if jwt_secret.is_empty() {
            return Err(ConfigError::InvalidValue("JWT_SECRET"));
        }

        let token_ttl_days: i64 = var("TOKEN_TTL_DAYS", &DEFAULT_TOKEN_TTL_DAYS.to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("TOKEN_TTL_DAYS"))?;
        if token_ttl_days <= 0 {
            return Err(ConfigError::InvalidValue("TOKEN_TTL_DAYS"));
        }

        let bcrypt_cost: u32 = var("BCRYPT_COST", "10")
            .parse()
            .map_err(|_| ConfigError::InvalidValue("BCRYPT_COST"))?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::InvalidValue("BCRYPT_COST"));
        }

        let storage = match var("STORAGE_BACKEND", "file").to_lowercase().as_str() {
            "file" => StorageBackend::File {
                path: PathBuf::from(var("DATA_FILE", "data.json")),
            },
            "postgres" => StorageBackend::Postgres {
                database_url: lookup("DATABASE_URL")
                    .ok_or(ConfigError::MissingEnv("DATABASE_URL"))?,
                max_connections: var("DATABASE_MAX_CONNECTIONS", "10")
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?,
            },
            _ => return Err(ConfigError::InvalidValue("STORAGE_BACKEND")),
        };

        let log_format = match var("LOG_FORMAT", "pretty").to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            _ => return Err(ConfigError::InvalidValue("LOG_FORMAT")),
        };

        let config = Self {
            host,
            port,
            environment,
            jwt_secret,
            token_ttl_days,
            bcrypt_cost,
            storage,
            log_format,
        };

        if config.is_production() && config.jwt_secret == DEFAULT_JWT_SECRET {
            return Err(ConfigError::InsecureSecret);
        }

        Ok(config)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),

    #[error("JWT_SECRET must be set in production")]
    InsecureSecret,
}
