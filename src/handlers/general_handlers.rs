use crate::errors::{ ErrorMessage, HttpError };

pub async fn root() -> &'static str {
    "VentureLink API"
}

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn handler_404() -> HttpError {
    HttpError::not_found(ErrorMessage::NotFound.to_string())
}
