use std::{ env, time::Duration };

use thiserror::Error;
use diesel::{
    PgConnection,
    result::Error as DieselError,
    r2d2::{ Pool, ConnectionManager, PoolError as R2D2Error },
};
use serde::Deserialize;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable not found: {0}")] MissingEnv(#[from] env::VarError),

    #[error("Configuration error: {0}")] Config(String),

    #[error("Database error: {0}")] Diesel(#[from] DieselError),

    #[error("Connection pool error: {0}")] Pool(#[from] R2D2Error),

    #[error("Not found")]
    NotFound,
}

/*
serde::Deserialize cannot be derived for types like Pool<ConnectionManager<PgConnection>>,
so the database configuration is split into two parts:
      - one struct for deserializing raw config values from the environment
      - another struct that includes the actual pool
*/

#[derive(Debug, Deserialize, Clone)]
pub struct RawDatabaseConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expires_in: i64,
}

// Basic validation to check for empty strings or invalid numbers
impl RawDatabaseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Config("DATABASE_URL cannot be empty".into()));
        }
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Config("JWT_SECRET cannot be empty".into()));
        }
        if self.jwt_expires_in <= 0 {
            return Err(ConfigError::Config("JWT_EXPIRES_IN must be greater than zero".into()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expires_in: i64,
    pub pool: PgPool,
}

impl DatabaseConfig {
    /// Build from a RawDatabaseConfig (which contains loaded fields).
    pub fn from_raw(raw: RawDatabaseConfig) -> Result<Self, ConfigError> {
        raw.validate()?;
        let manager = ConnectionManager::<PgConnection>::new(&raw.database_url);
        let pool = Pool::builder()
            .max_size(15)
            .connection_timeout(Duration::from_secs(5))
            .build(manager)?;

        Ok(Self {
            pool,
            database_url: raw.database_url,
            jwt_secret: raw.jwt_secret,
            jwt_expires_in: raw.jwt_expires_in,
        })
    }

    /// Load from environment variables and build the config.
    pub fn new() -> Result<Self, ConfigError> {
        let raw = RawDatabaseConfig {
            database_url: env::var("DATABASE_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            jwt_expires_in: env
                ::var("JWT_EXPIRES_IN")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .map_err(|e| {
                    ConfigError::Config(format!("Failed to parse JWT_EXPIRES_IN: {}", e))
                })?,
        };

        DatabaseConfig::from_raw(raw)
    }

    // FOR TESTING PURPOSES
    pub fn with_pool(pool: PgPool) -> Self {
        Self {
            database_url: "".into(),
            jwt_secret: "test-secret".into(),
            jwt_expires_in: 60,
            pool,
        }
    }
}
