//! Mapping from core errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::{error, warn};

use tributary_core::GraphError;

use super::models::ErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("{0}")]
    GatewayTimeout(String),

    #[error("{0}")]
    Internal(String),
}

impl From<GraphError> for ApiError {
    fn from(err: GraphError) -> Self {
        let message = err.to_string();
        match err {
            GraphError::UnknownType(_) | GraphError::NotFound { .. } => ApiError::NotFound(message),
            GraphError::StoreUnavailable(_) => ApiError::ServiceUnavailable(message),
            GraphError::Timeout => ApiError::GatewayTimeout(message),
            _ => ApiError::Internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::ServiceUnavailable(msg) => {
                warn!(error = %msg, "Graph store unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, msg)
            }
            ApiError::GatewayTimeout(msg) => {
                warn!(error = %msg, "Request deadline exceeded");
                (StatusCode::GATEWAY_TIMEOUT, msg)
            }
            ApiError::Internal(msg) => {
                error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
