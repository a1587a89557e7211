use serde::Deserialize;

fn default_limit() -> usize {
    10
}

/// Query string of GET /api/history. Negative values fail to deserialize.
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}
