use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::fmt;

use super::health::NO_CACHE;

/// Failure taxonomy for the request pipeline. Every domain check resolves
/// to one of these inside its handler; only genuinely unexpected faults on
/// the submission path reach `Internal`.
#[derive(Debug)]
pub enum ApiError {
    /// Persistence layer unreachable; short-circuits before auth.
    ServiceUnavailable,

    /// Missing or bad credentials.
    Unauthenticated,

    /// Authenticated but not the owner, or attempts exceeded.
    Forbidden,

    NotFound,

    /// Payload shape/type errors; carries a short plain-text message
    /// naming the offending field or keys.
    Validation(String),

    /// Empty-bodied 400s: unexpected request bodies, deadline violations
    /// and store faults on CRUD paths. Details stay in the logs.
    BadRequest,

    /// Unexpected faults in submission processing.
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ServiceUnavailable => write!(f, "Service unavailable"),
            ApiError::Unauthenticated => write!(f, "Unauthenticated"),
            ApiError::Forbidden => write!(f, "Forbidden"),
            ApiError::NotFound => write!(f, "Not found"),
            ApiError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ApiError::BadRequest => write!(f, "Bad request"),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::ServiceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                [(header::CACHE_CONTROL, NO_CACHE)],
                "",
            )
                .into_response(),
            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "").into_response(),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "").into_response(),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "").into_response(),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::BadRequest => (StatusCode::BAD_REQUEST, "").into_response(),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::Internal(msg.into())
    }
}
