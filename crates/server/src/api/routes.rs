use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::metrics_middleware;
use super::{handlers, harvest, items};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Harvest runs
        .route("/harvest", post(harvest::run_harvest))
        // Persisted items
        .route("/items", get(items::list_items))
        .route("/items/stats", get(items::get_stats))
        .route("/items/{id}", delete(items::delete_item));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
