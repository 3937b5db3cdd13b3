// Library entry point - exposes the venturelink functionality as a reusable library

// Public modules that can be used by other applications
pub mod client;
pub mod config;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod utils;

pub mod schema;

#[cfg(test)]
mod tests;

// Re-export commonly used types for convenience
pub use config::{ Config, ConfigError, DatabaseConfig };
pub use errors::{ ErrorMessage, HttpError, StoreError };
pub use models::{ Comment, GeoPoint, Post, User };

use std::sync::Arc;

use axum::{ Extension, Router };
use diesel_migrations::{ embed_migrations, EmbeddedMigrations, MigrationHarness };
use tower_http::trace::TraceLayer;

use middleware::cors::create_cors_layer;
use services::image_store::{ ImageStore, LocalImageStore };

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

// Application state type
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub image_store: Arc<dyn ImageStore>,
}

impl AppState {
    /// Create a new application state with configuration
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::new()?;
        let image_store: Arc<dyn ImageStore> = Arc::new(LocalImageStore::new(&config.uploads));

        Ok(Self {
            config,
            image_store,
        })
    }

    /// Create application state for testing
    pub fn for_testing(config: Config) -> Self {
        let image_store: Arc<dyn ImageStore> = Arc::new(LocalImageStore::new(&config.uploads));

        Self {
            config,
            image_store,
        }
    }
}

/// Create the complete application router
pub fn create_app(state: Arc<AppState>) -> Router {
    let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
    let cors = create_cors_layer(&environment);

    routes
        ::create_router()
        .with_state(state.clone())
        // The auth middleware pulls the state out of request extensions.
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Initialize the application with all dependencies
pub fn initialize_app() -> Result<Router, ConfigError> {
    config::logging::init_logging();

    let state = Arc::new(AppState::new()?);

    run_migrations(&state.config.database)?;

    Ok(create_app(state))
}

fn run_migrations(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let mut conn = database.pool.get()?;
    conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| ConfigError::Config(format!("Migration failed: {}", e)))?;

    Ok(())
}
