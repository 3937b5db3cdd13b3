pub mod database;
pub mod logging;
pub mod uploads;

pub use database::{ DatabaseConfig, ConfigError, PgPool };
pub use uploads::UploadConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub uploads: UploadConfig,
}

impl Config {
    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self {
            database: DatabaseConfig::new()?,
            uploads: UploadConfig::new()?,
        })
    }
}
