pub mod gemini_service;
pub mod ollama_service;

mod line_stream;

use tracing::error;

use crate::{
    config::llm_provider::LlmProvider,
    error_handler::{HttpError, ProviderError, ProviderErrorKind, Result, make_snippet},
};

/// Passes a successful response through; turns anything else into `HttpStatus`.
async fn ensure_success(
    resp: reqwest::Response,
    url: &str,
    provider: LlmProvider,
) -> Result<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }

    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    let snippet = make_snippet(&text);

    error!(%status, %url, %snippet, %provider, "provider returned non-success status");

    Err(ProviderError::new(
        provider,
        ProviderErrorKind::HttpStatus(HttpError {
            status,
            url: url.to_string(),
            snippet,
        }),
    )
    .into())
}
