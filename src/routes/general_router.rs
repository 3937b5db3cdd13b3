use std::sync::Arc;

use axum::{ routing::get, Router };

use crate::{ handlers::general_handlers::*, AppState };

pub fn general_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
}
