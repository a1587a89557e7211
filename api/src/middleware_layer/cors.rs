use axum::http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tracing::warn;

pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000";

/// CORS for the browser frontend: listed origins, credentials allowed,
/// methods and headers mirrored from the preflight.
///
/// `origins` is a comma-separated list; unparsable entries are skipped and
/// an empty result falls back to [`DEFAULT_CORS_ORIGINS`].
pub fn cors_layer(origins: &str) -> CorsLayer {
    let mut allowed: Vec<HeaderValue> = parse_origins(origins);
    if allowed.is_empty() {
        warn!(%origins, "no usable CORS origin, falling back to default");
        allowed = parse_origins(DEFAULT_CORS_ORIGINS);
    }

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

fn parse_origins(origins: &str) -> Vec<HeaderValue> {
    origins
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect()
}
