//! Persisted item API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use harvester_core::store::{StoreStats, StoredItem};
use serde::{Deserialize, Serialize};

use super::handlers::ErrorResponse;
use crate::state::AppState;

/// Upper bound on `limit`.
const MAX_LIMIT: u32 = 1000;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ItemsQueryParams {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    100
}

#[derive(Debug, Serialize)]
pub struct ItemListResponse {
    pub items: Vec<StoredItem>,
    pub total: usize,
}

fn internal_error(message: String) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse { error: message }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/items
///
/// List persisted items, highest weighted score first.
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ItemsQueryParams>,
) -> Result<Json<ItemListResponse>, impl IntoResponse> {
    let limit = params.limit.min(MAX_LIMIT) as i64;

    match state.store().list_items(limit) {
        Ok(items) => {
            let total = items.len();
            Ok(Json(ItemListResponse { items, total }))
        }
        Err(e) => Err(internal_error(e.to_string())),
    }
}

/// GET /api/v1/items/stats
///
/// Row counts of both tables.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StoreStats>, impl IntoResponse> {
    state
        .store()
        .stats()
        .map(Json)
        .map_err(|e| internal_error(e.to_string()))
}

/// DELETE /api/v1/items/{id}
///
/// Delete an item together with its score row.
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, impl IntoResponse> {
    match state.store().delete_item(id) {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Item not found: {}", id),
            }),
        )),
        Err(e) => Err(internal_error(e.to_string())),
    }
}
