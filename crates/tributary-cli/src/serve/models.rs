//! API request/response types.

use serde::{Deserialize, Serialize};

/// Query parameters for `/api/v1/allstories/{resource}/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct StoriesQuery {
    /// Comma separated resource types to serialize expanded.
    pub expand: Option<String>,
}

/// Response for `/healthz`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
