//! GET and DELETE /api/history.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use query_engine::HistoryPage;
use serde_json::{Value, json};
use tracing::info;

use crate::{
    core::app_state::AppState, error_handler::AppResult,
    routes::history::history_request::HistoryParams,
};

/// Handler: GET /api/history?limit=10&offset=0
///
/// Newest first; `total_count` is the size before pagination.
pub async fn list_history(
    State(state): State<Arc<AppState>>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> AppResult<Json<HistoryPage>> {
    let Query(HistoryParams { limit, offset }) = params?;
    Ok(Json(state.history.list(limit, offset).await))
}

/// Handler: DELETE /api/history
pub async fn clear_history(State(state): State<Arc<AppState>>) -> Json<Value> {
    state.history.clear().await;
    info!("query history cleared");
    Json(json!({ "message": "Query history cleared successfully" }))
}
