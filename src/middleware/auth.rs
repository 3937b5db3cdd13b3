use std::sync::Arc;

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::IntoResponse,
    Extension,
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::{
    errors::{ ErrorMessage, HttpError },
    models::User,
    repositories::user_repository::UserRepository,
    utils::token,
    AppState,
};

/// Authenticated request context attached by the middleware. Handlers
/// receive the user id from here, never from ambient storage.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
}

impl AuthenticatedUser {
    pub fn id(&self) -> Uuid {
        self.user.id
    }
}

/// Validates the bearer token on write routes and resolves it to a live
/// user. The token itself is issued by the external auth service; this
/// middleware only checks the signature and that the subject still exists.
pub async fn auth(
    cookie_jar: CookieJar,
    Extension(state): Extension<Arc<AppState>>,
    mut req: Request,
    next: Next
) -> Result<impl IntoResponse, HttpError> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|auth_header| auth_header.to_str().ok())
        .and_then(|auth_value| {
            auth_value.strip_prefix("Bearer ").map(|token| token.to_owned())
        })
        .or_else(|| { cookie_jar.get("token").map(|cookie| cookie.value().to_string()) });

    let token = bearer.ok_or_else(|| {
        HttpError::unauthorized(ErrorMessage::TokenNotProvided.to_string())
    })?;

    let subject = token
        ::decode_token(token, state.config.database.jwt_secret.as_bytes())
        .map_err(|_| { HttpError::unauthorized(ErrorMessage::InvalidToken.to_string()) })?;

    let user_id = Uuid::parse_str(&subject).map_err(|_| {
        HttpError::unauthorized(ErrorMessage::InvalidToken.to_string())
    })?;

    let user: Option<User> = UserRepository::get_user(&state.config.database.pool, user_id).map_err(
        |_| { HttpError::unauthorized(ErrorMessage::UserNoLongerExists.to_string()) }
    )?;

    let user = user.ok_or_else(|| {
        HttpError::unauthorized(ErrorMessage::UserNoLongerExists.to_string())
    })?;

    req.extensions_mut().insert(AuthenticatedUser { user });

    Ok(next.run(req).await)
}
