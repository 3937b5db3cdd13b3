use axum::{ http::StatusCode, response::{ IntoResponse, Response }, Json };
use std::fmt;
use serde::{ Serialize, Deserialize };
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", serde_json::to_string(&self).unwrap())
    }
}

#[derive(Debug, PartialEq)]
pub enum ErrorMessage {
    StoreUnavailable,
    InvalidToken,
    TokenNotProvided,
    PermissionDenied,
    InternalServerError,
    UserNoLongerExists,
    NotFound,
    PostNotFound,
    CommentNotFound,
    TitleAndContentRequired,
    CommentContentRequired,
    MeetingDetailsRequired,
    ImageTooLarge(usize),
    UnsupportedMediaType,
}

impl ToString for ErrorMessage {
    fn to_string(&self) -> String {
        self.to_str().to_owned()
    }
}

impl ErrorMessage {
    fn to_str(&self) -> String {
        match self {
            ErrorMessage::StoreUnavailable =>
                "The post store is temporarily unavailable. Please try again later.".to_string(),
            ErrorMessage::InvalidToken => "Authentication token is invalid or expired".to_string(),
            ErrorMessage::TokenNotProvided =>
                "You are not logged in, please provide a token".to_string(),
            ErrorMessage::PermissionDenied =>
                "You are not allowed to perform this action".to_string(),
            ErrorMessage::InternalServerError =>
                "Server Error. Please try again later.".to_string(),
            ErrorMessage::UserNoLongerExists =>
                "User belonging to this token does not exist".to_string(),
            ErrorMessage::NotFound => "The requested resource could not be found".to_string(),
            ErrorMessage::PostNotFound => "Post not found".to_string(),
            ErrorMessage::CommentNotFound => "Comment not found".to_string(),
            ErrorMessage::TitleAndContentRequired => "Title and content are required".to_string(),
            ErrorMessage::CommentContentRequired => "Comment content is required".to_string(),
            ErrorMessage::MeetingDetailsRequired =>
                "Meeting date, time, and message are required".to_string(),
            ErrorMessage::ImageTooLarge(max_bytes) =>
                format!("Image too large. Images must be {} bytes or less.", max_bytes),
            ErrorMessage::UnsupportedMediaType => "Only image files are allowed".to_string(),
        }
    }
}

/// Errors raised by the post/user stores. Handlers convert these into
/// `HttpError` responses through the `From` impl below.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")] Diesel(#[from] diesel::result::Error),

    #[error("Connection pool error: {0}")] Pool(#[from] diesel::r2d2::PoolError),

    #[error("Post {0} not found")] PostNotFound(Uuid),

    #[error("Comment {0} not found")] CommentNotFound(Uuid),

    #[error("User {0} is not authorized for this post")] NotAuthor(Uuid),

    #[error("Author record missing for post")]
    AuthorMissing,
}

#[derive(Debug, Clone)]
pub struct HttpError {
    pub message: String,
    pub status: StatusCode,
}

impl HttpError {
    pub fn new(message: impl Into<String>, status: StatusCode) -> Self {
        HttpError {
            message: message.into(),
            status,
        }
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::UNAUTHORIZED,
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::FORBIDDEN,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::NOT_FOUND,
        }
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn into_http_response(self) -> Response {
        let response = Json(ErrorResponse {
            success: false,
            message: self.message.clone(),
        });

        (self.status, response).into_response()
    }
}

impl From<StoreError> for HttpError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::PostNotFound(_) =>
                HttpError::not_found(ErrorMessage::PostNotFound.to_string()),
            StoreError::CommentNotFound(_) =>
                HttpError::not_found(ErrorMessage::CommentNotFound.to_string()),
            StoreError::NotAuthor(_) =>
                HttpError::forbidden(ErrorMessage::PermissionDenied.to_string()),
            StoreError::Pool(e) => {
                tracing::error!("connection pool failure: {}", e);
                HttpError::service_unavailable(ErrorMessage::StoreUnavailable.to_string())
            }
            StoreError::Diesel(e) => {
                tracing::error!("database failure: {}", e);
                HttpError::service_unavailable(ErrorMessage::StoreUnavailable.to_string())
            }
            StoreError::AuthorMissing => {
                tracing::error!("post references an author that no longer exists");
                HttpError::server_error(ErrorMessage::InternalServerError.to_string())
            }
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HttpError: message: {}, status: {}", self.message, self.status)
    }
}

impl std::error::Error for HttpError {}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}
