use serde::Deserialize;

/// Request payload for both answering endpoints.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    /// Travel question, 1 to 1000 characters.
    pub question: String,
}
