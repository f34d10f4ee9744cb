//! Application error taxonomy and its HTTP mapping.
//!
//! Each variant maps to exactly one status code. Variants that hide an internal cause
//! (`Unauthorized`, `Internal`) carry no user-visible detail at all; the cause is logged at the
//! point where it is converted.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::repository::RepoError;

/// Message returned for every rejected bearer token, whatever the cause.
pub const INVALID_TOKEN_DETAIL: &str = "Could not validate credentials";
/// Message returned for every rejected login, whatever the cause.
pub const INVALID_LOGIN_DETAIL: &str = "Invalid credentials";

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Login rejected (unknown user or wrong password).
    #[error("Invalid credentials")]
    AuthenticationFailed,

    /// Bearer token missing, invalid, expired, or naming an unknown user.
    #[error("Could not validate credentials")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    /// Storage or crypto failure. The payload is for logs only.
    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::AuthenticationFailed | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(cause) = &self {
            tracing::error!(%cause, "request failed with an internal error");
        }

        let status = self.status();
        let body = Json(ErrorResponse {
            detail: self.to_string(),
        });

        let mut response = (status, body).into_response();
        if matches!(self, AppError::Unauthorized) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Generic mapping for storage errors. Handlers that need a more specific
/// message for `Duplicate` or `MissingReference` match on `RepoError` first.
impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Duplicate => AppError::Conflict("Resource already exists".into()),
            RepoError::MissingReference => AppError::NotFound("Referenced resource not found".into()),
            RepoError::Database(e) => AppError::Internal(e.to_string()),
        }
    }
}
