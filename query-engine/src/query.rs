//! The answered-question record kept in history.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One answered question. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub id: String,
    pub question: String,
    pub answer: String,
    /// When processing started.
    pub timestamp: DateTime<Utc>,
    /// Generation time in seconds.
    pub processing_time: f64,
}

impl Query {
    pub fn new(
        id: String,
        question: String,
        answer: String,
        timestamp: DateTime<Utc>,
        elapsed: Duration,
    ) -> Self {
        Self {
            id,
            question,
            answer,
            timestamp,
            processing_time: elapsed.as_secs_f64(),
        }
    }
}

/// Fresh opaque query identifier.
pub fn new_query_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_wire_field_names() {
        let ts = DateTime::parse_from_rfc3339("2025-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let q = Query::new(
            "abc".into(),
            "Q".into(),
            "A".into(),
            ts,
            Duration::from_millis(1500),
        );
        let v = serde_json::to_value(&q).unwrap();
        assert_eq!(v["id"], "abc");
        assert_eq!(v["processing_time"], 1.5);
        assert!(v["timestamp"].as_str().unwrap().starts_with("2025-03-01T10:00:00"));
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(new_query_id(), new_query_id());
        assert!(!new_query_id().is_empty());
    }
}
