//! Events of the streamed answer protocol.
//!
//! Serialized as JSON objects tagged by `type`:
//!
//! ```text
//! {"type":"metadata","id":"…","question":"…","timestamp":"2025-03-01T10:00:00Z"}
//! {"type":"content","content":"…"}
//! {"type":"done","processing_time":1.42}
//! {"type":"error","error":"…"}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Always first: identifies the query being answered.
    Metadata {
        id: String,
        question: String,
        timestamp: DateTime<Utc>,
    },
    /// One fragment of the answer, verbatim.
    Content { content: String },
    /// Successful end; the query has been recorded.
    Done { processing_time: f64 },
    /// Failed end; nothing was recorded.
    Error { error: String },
}

impl StreamEvent {
    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done { .. } | StreamEvent::Error { .. })
    }

    /// JSON payload for one `data:` frame.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            serde_json::json!({ "type": "error", "error": format!("failed to encode event: {e}") })
                .to_string()
        })
    }
}
