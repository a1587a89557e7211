//! Provider-agnostic text generation capability.
//!
//! [`ModelGateway`] is the only seam the rest of the system talks to. It
//! exposes a single-shot call and a streaming call; concrete providers live
//! in [`crate::services`] and are selected by [`build_gateway`].

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use tracing::info;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::Result,
    services::{gemini_service::GeminiService, ollama_service::OllamaService},
};

/// Lazily produced text fragments, in generation order.
///
/// The stream is finite and not restartable. A transport or provider failure
/// surfaces as an `Err` item; the stream ends after it. Dropping the stream
/// releases the underlying HTTP response, which cancels generation upstream.
pub type FragmentStream = BoxStream<'static, Result<String>>;

/// Text generation backend.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Generates the full answer for `prompt` in one call.
    ///
    /// # Errors
    /// Fails when the call errors or the provider returns no text.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Starts a streamed generation for `prompt`.
    ///
    /// # Errors
    /// Fails when the request cannot be started (transport error or
    /// non-success status). Later failures arrive as stream items.
    async fn complete_streaming(&self, prompt: &str) -> Result<FragmentStream>;

    /// Provider behind this gateway.
    fn provider(&self) -> LlmProvider;

    /// Model identifier used for generation.
    fn model(&self) -> &str;
}

/// Builds the gateway matching `cfg.provider`.
///
/// # Errors
/// Propagates constructor validation errors (endpoint, key, client build).
pub fn build_gateway(cfg: LlmModelConfig) -> Result<Arc<dyn ModelGateway>> {
    let gateway: Arc<dyn ModelGateway> = match cfg.provider {
        LlmProvider::Gemini => Arc::new(GeminiService::new(cfg)?),
        LlmProvider::Ollama => Arc::new(OllamaService::new(cfg)?),
    };
    info!(
        provider = %gateway.provider(),
        model = %gateway.model(),
        "model gateway ready"
    );
    Ok(gateway)
}
