use serde::Serialize;
use thiserror::Error;

pub mod handlers;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("could not hash secret")]
    ArgonError,
    #[error("could not create token")]
    JWTTokenCreationError,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    TokenExpired,
    #[error("missing token")]
    MissingToken,
}

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("insufficient stock for product {0}")]
    InsufficientStock(uuid::Uuid),
    #[error("stale record: {0}")]
    Stale(String),
}

/// Domain error taxonomy. Services return it, controllers hand it to warp as a
/// rejection and `handlers::handle_rejection` turns it into the error envelope.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("validation error: {0}")]
    ValidationError(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    UnsupportedMediaType(String),
    #[error("internal server error")]
    InternalServerError,
}
impl warp::reject::Reject for AppError {}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken | AuthError::MissingToken => {
                AppError::Unauthorized(err.to_string())
            }
            AuthError::TokenExpired => AppError::Unauthorized("Token expired".to_string()),
            AuthError::ArgonError | AuthError::JWTTokenCreationError => {
                tracing::error!("auth primitive failure: {err}");
                AppError::InternalServerError
            }
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(message) => AppError::Conflict(message),
            RepositoryError::InsufficientStock(id) => {
                AppError::BadRequest(format!("Insufficient stock for product {id}"))
            }
            RepositoryError::Stale(message) => AppError::BadRequest(message),
            other => {
                tracing::error!("repository failure: {other:?}");
                AppError::InternalServerError
            }
        }
    }
}

/// Error half of the response envelope.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status: &'static str,
    pub status_code: u16,
    pub error: String,
    pub message: String,
}
