use std::sync::Arc;

use axum::Router;

use crate::{ handlers::general_handlers::handler_404, AppState };

pub mod api;
pub mod general_router;

use api::posts::post_routes;
use general_router::general_routes;

/// Main application router assembly function
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        // API routes (feed queries, post mutations)
        .merge(post_routes())
        // General routes (health check, etc.)
        .merge(general_routes())
        // Unknown routes answer with the JSON error envelope
        .fallback(handler_404)
}
