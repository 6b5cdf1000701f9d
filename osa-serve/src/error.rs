//! Maps request-handling failures onto HTTP status codes + a JSON body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug)]
pub enum ApiError {
    Busy { session_id: String },
    NotFound { session_id: String },
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn busy(session_id: impl Into<String>) -> Self {
        Self::Busy {
            session_id: session_id.into(),
        }
    }

    pub fn not_found(session_id: impl Into<String>) -> Self {
        Self::NotFound {
            session_id: session_id.into(),
        }
    }
}

impl From<osa_core::OsaError> for ApiError {
    fn from(err: osa_core::OsaError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Busy { session_id } => (
                StatusCode::CONFLICT,
                format!("session {session_id} has an active request in flight"),
            ),
            ApiError::NotFound { session_id } => {
                (StatusCode::NOT_FOUND, format!("no session {session_id}"))
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, axum::Json(ErrorBody { error: message })).into_response()
    }
}
