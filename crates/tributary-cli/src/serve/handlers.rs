//! HTTP route handlers.
//!
//! Handlers are kept thin, delegating to [`StoryService`](tributary_core::StoryService).

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use tributary_core::{ExpandSet, StoryEnvelope};

use super::error::ApiError;
use super::models::{HealthResponse, StoriesQuery};
use super::AppState;

// =============================================================================
// Health
// =============================================================================

/// GET `/healthz`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// API Handlers
// =============================================================================

/// GET `/api/v1/allstories/{resource}/{id}` - Every story the node takes part in.
///
/// `?expand=kojibuild,advisory` picks which headline types are expanded;
/// by default only the requested type is.
pub async fn all_stories(
    State(state): State<Arc<AppState>>,
    Path((resource, id)): Path<(String, String)>,
    Query(query): Query<StoriesQuery>,
) -> Result<Json<Vec<StoryEnvelope>>, ApiError> {
    let expand = query.expand.as_deref().map(ExpandSet::from_csv);
    let stories = state.service.all_stories(&resource, &id, expand).await?;
    Ok(Json(stories))
}

/// GET `/api/v1/{resource}/{id}` - One node with its relationships.
pub async fn node(
    State(state): State<Arc<AppState>>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let node = state.service.node(&resource, &id).await?;
    Ok(Json(node))
}
