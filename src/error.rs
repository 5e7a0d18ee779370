//! Error taxonomy for the AQI service.
//!
//! Five operator-facing classes, each with a fixed HTTP mapping:
//! validation failures (400), missing cities or empty history (404),
//! missing credentials (503), provider failures (502), and storage
//! failures that do reach the caller (500). Cache and store errors on
//! the side-effect path never surface here; the service logs and
//! swallows them.
//!
//! Messages carry the identifier and stage for diagnosis but never
//! credentials or internal traces.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// A failure surfaced to an API caller.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Bad input parameters; never retried.
    #[error("{0}")]
    Validation(String),

    /// City unresolvable or no historical data for the window.
    #[error("{0}")]
    NotFound(String),

    /// Required provider credentials are missing. Fatal for the request;
    /// the message tells the operator which variable to set.
    #[error("{0}")]
    Unconfigured(String),

    /// Provider call failed or returned no usable data. Single attempt,
    /// no retry.
    #[error("upstream provider error: {0}")]
    Upstream(String),

    /// A read-path storage failure the request could not proceed without.
    #[error("storage error: {0}")]
    Storage(String),
}

impl ServiceError {
    /// Stable machine-readable code for the error class.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "INVALID_PARAMS",
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::Unconfigured(_) => "UNCONFIGURED",
            ServiceError::Upstream(_) => "UPSTREAM_ERROR",
            ServiceError::Storage(_) => "STORAGE_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Unconfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body returned for every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
            code: self.code(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ServiceError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::NotFound("missing".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::Unconfigured("no key".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ServiceError::Upstream("down".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ServiceError::Storage("locked".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ServiceError::Validation("x".into()).code(), "INVALID_PARAMS");
        assert_eq!(ServiceError::NotFound("x".into()).code(), "NOT_FOUND");
        assert_eq!(ServiceError::Upstream("x".into()).code(), "UPSTREAM_ERROR");
    }
}
