//! Harvest API handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use harvester_core::{HarvestError, HarvestParams, HarvestReport};
use serde::Deserialize;
use tracing::error;

use super::handlers::ErrorResponse;
use crate::state::AppState;

// ============================================================================
// Request types
// ============================================================================

/// Per-run overrides; missing fields use the configured defaults.
#[derive(Debug, Default, Deserialize)]
pub struct HarvestRequest {
    #[serde(default)]
    pub target_count: Option<usize>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub max_total_pages: Option<u32>,
    #[serde(default)]
    pub fetch_concurrency: Option<usize>,
    #[serde(default)]
    pub transform_concurrency: Option<usize>,
}

impl HarvestRequest {
    /// Apply the overrides on top of `defaults`.
    pub fn apply(&self, defaults: HarvestParams) -> HarvestParams {
        HarvestParams {
            target_count: self.target_count.unwrap_or(defaults.target_count),
            page_size: self.page_size.unwrap_or(defaults.page_size),
            max_total_pages: self.max_total_pages.unwrap_or(defaults.max_total_pages),
            fetch_concurrency: self.fetch_concurrency.unwrap_or(defaults.fetch_concurrency),
            transform_concurrency: self
                .transform_concurrency
                .unwrap_or(defaults.transform_concurrency),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/harvest
///
/// Run one harvest and return the ranked report. A persistence failure is
/// still a 200; the report carries `persist_error`.
pub async fn run_harvest(
    State(state): State<Arc<AppState>>,
    Json(request): Json<HarvestRequest>,
) -> Result<Json<HarvestReport>, impl IntoResponse> {
    let params = request.apply(state.default_params());

    match state.harvester().run(&params).await {
        Ok(report) => Ok(Json(report)),
        Err(HarvestError::InvalidParams(message)) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: message }),
        )),
        Err(e) => {
            error!(error = %e, "Harvest failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}
