use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Failure reported by one of the external collaborators (donation store,
/// chain-submission service).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// Transport-level failure. Safe to retry for idempotent reads.
    #[error("network error: {0}")]
    Network(String),

    /// The collaborator answered with a domain error.
    #[error("remote error: {0}")]
    Remote(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl UpstreamError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, UpstreamError::Network(_))
    }

    /// Classify a non-success HTTP status. Gateway-style statuses are treated
    /// as transport failures, everything else as a domain answer.
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status {
            reqwest::StatusCode::NOT_FOUND => UpstreamError::NotFound(body),
            reqwest::StatusCode::BAD_GATEWAY
            | reqwest::StatusCode::SERVICE_UNAVAILABLE
            | reqwest::StatusCode::GATEWAY_TIMEOUT
            | reqwest::StatusCode::TOO_MANY_REQUESTS => {
                UpstreamError::Network(format!("{}: {}", status, body))
            }
            _ => UpstreamError::Remote(format!("{}: {}", status, body)),
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            UpstreamError::Remote(format!("malformed response: {}", err))
        } else if let Some(status) = err.status() {
            UpstreamError::from_status(status, err.to_string())
        } else {
            UpstreamError::Network(err.to_string())
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// The donation is not eligible for verification.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("donation not found: {0}")]
    NotFound(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("remote error: {0}")]
    Remote(String),

    /// The caller stopped waiting. The submission itself keeps running.
    #[error("verification still running after {0:?}")]
    TimedOut(Duration),
}

impl VerificationError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, VerificationError::Network(_))
    }
}

impl From<UpstreamError> for VerificationError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Network(msg) => VerificationError::Network(msg),
            UpstreamError::Remote(msg) => VerificationError::Remote(msg),
            UpstreamError::NotFound(msg) => VerificationError::NotFound(msg),
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Admin token missing or invalid")]
    Forbidden,

    #[error("Internal server error: {0}")]
    InternalError(String),
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub retryable: bool,
    pub timestamp: chrono::DateTime<Utc>,
    pub request_id: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Verification(err) => match err {
                VerificationError::InvalidState(_) => (StatusCode::CONFLICT, "INVALID_STATE"),
                VerificationError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                VerificationError::Network(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "NETWORK_ERROR")
                }
                VerificationError::Remote(_) => (StatusCode::BAD_GATEWAY, "REMOTE_ERROR"),
                VerificationError::TimedOut(_) => (StatusCode::GATEWAY_TIMEOUT, "TIMED_OUT"),
            },
            ApiError::Upstream(err) => match err {
                UpstreamError::Network(_) => (StatusCode::SERVICE_UNAVAILABLE, "NETWORK_ERROR"),
                UpstreamError::Remote(_) => (StatusCode::BAD_GATEWAY, "REMOTE_ERROR"),
                UpstreamError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            },
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            ApiError::Verification(err) => err.is_retryable(),
            ApiError::Upstream(err) => err.is_retryable(),
            _ => false,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();
        let (status, error_code) = self.status_and_code();

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            error_code: error_code.to_string(),
            retryable: self.retryable(),
            timestamp: Utc::now(),
            request_id,
        };

        if status.is_server_error() {
            tracing::error!(error = ?self, error_code = error_code, "Request failed");
        } else {
            tracing::warn!(error = ?self, error_code = error_code, "Request rejected");
        }

        (status, Json(body)).into_response()
    }
}
