//! POST /api/query/stream — answers a question as server-sent events.

use std::{convert::Infallible, sync::Arc};

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderName, header},
    response::{
        IntoResponse, Response,
        sse::{Event, Sse},
    },
};
use futures::StreamExt;
use tracing::info;

use crate::{
    core::app_state::AppState, error_handler::AppResult,
    routes::query::query_request::QueryRequest,
};

static X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// Handler: POST /api/query/stream
///
/// An invalid question is rejected with a plain error response before the
/// event stream starts. Afterwards failures arrive as an `error` event.
pub async fn stream_query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(body) = payload?;
    info!(question_chars = body.question.chars().count(), "stream query received");

    let events = state.stream_emitter.open(body.question)?;
    let frames = events.map(|ev| Ok::<Event, Infallible>(Event::default().data(ev.to_json())));

    Ok((
        [
            (header::CACHE_CONTROL, "no-cache"),
            (X_ACCEL_BUFFERING.clone(), "no"),
        ],
        Sse::new(frames),
    )
        .into_response())
}
