//! POST /api/query — answers a question in one response.

use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use query_engine::Query;
use tracing::info;

use crate::{
    core::app_state::AppState, error_handler::AppResult,
    routes::query::query_request::QueryRequest,
};

/// Handler: POST /api/query
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8000/api/query \
///   -H 'content-type: application/json' \
///   -d '{"question":"Best time to visit Japan?"}'
/// ```
pub async fn query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> AppResult<Json<Query>> {
    let Json(body) = payload?;
    info!(question_chars = body.question.chars().count(), "query received");

    let answered = state.query_service.handle(&body.question).await?;
    Ok(Json(answered))
}
