use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{ delete, get, post, put },
    Router,
};

use crate::{
    handlers::post_handlers::{
        add_comment,
        create_post,
        delete_comment,
        delete_post,
        get_post_by_id,
        list_posts,
        request_meeting,
        toggle_like,
        update_post,
    },
    middleware::auth::auth,
    AppState,
};

// Body limit sized for one image upload plus the text fields.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Feed reads are public; every mutation passes through the auth
/// middleware first.
pub fn post_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/v1/posts",
            get(list_posts).merge(post(create_post).route_layer(from_fn(auth)))
        )
        .route(
            "/api/v1/posts/{id}",
            get(get_post_by_id).merge(
                put(update_post).delete(delete_post).route_layer(from_fn(auth))
            )
        )
        .route("/api/v1/posts/{id}/like", post(toggle_like).route_layer(from_fn(auth)))
        .route("/api/v1/posts/{id}/comments", post(add_comment).route_layer(from_fn(auth)))
        .route(
            "/api/v1/posts/{id}/comments/{comment_id}",
            delete(delete_comment).route_layer(from_fn(auth))
        )
        .route("/api/v1/posts/{id}/meeting", post(request_meeting).route_layer(from_fn(auth)))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}
