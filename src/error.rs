// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Used by the authentication and dashboard handlers; maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    AuthError(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., duplicate username)
    Conflict(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InternalServerError(msg) => write!(f, "internal error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "bad request: {}", msg),
            AppError::AuthError(msg) => write!(f, "auth error: {}", msg),
            AppError::NotFound(msg) => write!(f, "not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "conflict: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<NeedError> for AppError {
    fn from(err: NeedError) -> Self {
        match err {
            NeedError::Unauthenticated => AppError::AuthError(err.to_string()),
            NeedError::NeedNotFound => AppError::NotFound(err.to_string()),
            NeedError::ValidationFailed(msg) => AppError::BadRequest(msg),
            NeedError::StoreFailure(msg) => AppError::InternalServerError(msg),
            other => AppError::Conflict(other.to_string()),
        }
    }
}

/// Failure kinds of the need mutation and query services.
///
/// Rendered to clients as the tagged result
/// `{"success": false, "error": <message>, "code": <kind>}`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NeedError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Not authorized")]
    Unauthorized,

    #[error("Need not found")]
    NeedNotFound,

    #[error("Already volunteered for this need")]
    AlreadyVolunteered,

    #[error("You have not volunteered for this need")]
    NotVolunteered,

    #[error("This need has already been resolved")]
    NeedResolved,

    #[error("You cannot volunteer for your own need")]
    OwnNeed,

    #[error("{0}")]
    ValidationFailed(String),

    #[error("Store failure: {0}")]
    StoreFailure(String),
}

impl NeedError {
    /// Stable machine-readable kind.
    pub fn code(&self) -> &'static str {
        match self {
            NeedError::Unauthenticated => "unauthenticated",
            NeedError::Unauthorized => "unauthorized",
            NeedError::NeedNotFound => "need_not_found",
            NeedError::AlreadyVolunteered => "already_volunteered",
            NeedError::NotVolunteered => "not_volunteered",
            NeedError::NeedResolved => "need_resolved",
            NeedError::OwnNeed => "own_need",
            NeedError::ValidationFailed(_) => "validation_failed",
            NeedError::StoreFailure(_) => "store_failure",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            NeedError::Unauthenticated => StatusCode::UNAUTHORIZED,
            NeedError::Unauthorized | NeedError::OwnNeed => StatusCode::FORBIDDEN,
            NeedError::NeedNotFound => StatusCode::NOT_FOUND,
            NeedError::AlreadyVolunteered
            | NeedError::NotVolunteered
            | NeedError::NeedResolved => StatusCode::CONFLICT,
            NeedError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            NeedError::StoreFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for NeedError {
    fn into_response(self) -> Response {
        let message = match &self {
            NeedError::StoreFailure(msg) => {
                tracing::error!("Store failure: {}", msg);
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };
        let body = Json(json!({
            "success": false,
            "error": message,
            "code": self.code(),
        }));

        (self.status(), body).into_response()
    }
}

impl From<sqlx::Error> for NeedError {
    fn from(err: sqlx::Error) -> Self {
        NeedError::StoreFailure(err.to_string())
    }
}

impl From<validator::ValidationErrors> for NeedError {
    fn from(errors: validator::ValidationErrors) -> Self {
        NeedError::ValidationFailed(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn need_error_maps_to_status_and_code() {
        assert_eq!(NeedError::Unauthorized.status(), StatusCode::FORBIDDEN);
        assert_eq!(NeedError::NeedResolved.status(), StatusCode::CONFLICT);
        assert_eq!(NeedError::NotVolunteered.code(), "not_volunteered");
        assert_eq!(NeedError::OwnNeed.status(), StatusCode::FORBIDDEN);
        assert_eq!(NeedError::OwnNeed.code(), "own_need");
        assert_eq!(
            NeedError::ValidationFailed("bad".into()).to_string(),
            "bad"
        );
    }

    #[test]
    fn store_failure_becomes_internal_app_error() {
        let err: AppError = NeedError::StoreFailure("boom".into()).into();
        assert!(matches!(err, AppError::InternalServerError(msg) if msg == "boom"));
    }
}
