use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use ember_db::StoreError;
use ember_gateway::outbox::OutboxError;

/// Request-level failure taxonomy, rendered as `{code, message}` JSON
/// bodies. Nothing here is process-fatal; every failure is per-request.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("Missing token")]
    MissingToken,
    #[error("{0}")]
    InvalidToken(String),
    #[error("One or both users do not exist")]
    InvalidUser,
    #[error("You have already liked this user")]
    AlreadyLiked,
    #[error("You have not liked this user")]
    NotLiked,
    #[error("This username is already taken")]
    UsernameTaken,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("An internal error occurred")]
    Internal,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::MissingToken | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::InvalidToken(_) => StatusCode::FORBIDDEN,
            Self::InvalidUser | Self::AlreadyLiked | Self::NotLiked | Self::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::UsernameTaken => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::MissingToken => "MISSING_TOKEN",
            Self::InvalidToken(_) => "INVALID_TOKEN",
            Self::InvalidUser => "INVALID_USER",
            Self::AlreadyLiked => "ALREADY_LIKED",
            Self::NotLiked => "NOT_LIKED",
            Self::UsernameTaken => "USERNAME_TAKEN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Internal => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "code": self.code(),
            "message": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidUser => Self::InvalidUser,
            StoreError::AlreadyLiked => Self::AlreadyLiked,
            StoreError::NotLiked => Self::NotLiked,
            StoreError::UsernameTaken => Self::UsernameTaken,
            StoreError::Sqlite(_) | StoreError::Poisoned => {
                error!("store failure: {}", e);
                Self::Internal
            }
        }
    }
}

impl From<OutboxError> for ApiError {
    fn from(e: OutboxError) -> Self {
        error!("outbox failure: {}", e);
        Self::Internal
    }
}
