//! GET / — service banner and endpoint map.

use axum::Json;
use serde_json::{Value, json};

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Travel Assistant API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "query": "/api/query",
            "stream": "/api/query/stream",
            "history": "/api/history",
            "health": "/health",
        },
    }))
}
