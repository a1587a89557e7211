//! Lightweight Ollama service for text generation.
//!
//! This module implements a thin client for the local Ollama API:
//! - `POST {endpoint}/api/generate` with `stream=false` — single-shot generation
//! - `POST {endpoint}/api/generate` with `stream=true`  — NDJSON fragment stream
//!
//! It uses the universal configuration [`LlmModelConfig`] and ensures
//! that the selected provider is [`LlmProvider::Ollama`].
//!
//! # Examples
//!
//! ```no_run
//! use ai_llm_service::config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
//! use ai_llm_service::gateway::ModelGateway;
//! use ai_llm_service::services::ollama_service::OllamaService;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = LlmModelConfig {
//!     provider: LlmProvider::Ollama,
//!     model: "llama3.1".into(),
//!     endpoint: "http://localhost:11434".into(),
//!     api_key: None,
//!     max_tokens: Some(256),
//!     temperature: Some(0.7),
//!     top_p: Some(0.9),
//!     timeout_secs: Some(30),
//! };
//!
//! let svc = OllamaService::new(cfg)?;
//! let text = svc.complete("Best time to visit Japan?").await?;
//! println!("Generated:\n{}", text);
//! # Ok(()) }
//! ```

use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, ProviderError, ProviderErrorKind, Result},
    gateway::{FragmentStream, ModelGateway},
    services::{ensure_success, line_stream::split_lines},
};

/// Thin client for Ollama.
///
/// Initialized with a full [`LlmModelConfig`]. Reuses one HTTP client; the
/// configured timeout is applied per single-shot request only, so long
/// streams are not cut off.
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_generate: String,
    timeout: Duration,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not `Ollama`
    /// - `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        if cfg.provider != LlmProvider::Ollama {
            return Err(provider_error(ProviderErrorKind::InvalidProvider));
        }

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(provider_error(ProviderErrorKind::InvalidEndpoint(
                cfg.endpoint.clone(),
            )));
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let url_generate = format!("{}/api/generate", base);

        Ok(Self {
            client,
            cfg,
            url_generate,
            timeout,
        })
    }

    async fn post_generate(&self, prompt: &str, stream: bool) -> Result<reqwest::Response> {
        let body = GenerateRequest::from_cfg(&self.cfg, prompt, stream);

        debug!(stream, prompt_len = prompt.len(), "POST {}", self.url_generate);
        let mut req = self.client.post(&self.url_generate).json(&body);
        if !stream {
            req = req.timeout(self.timeout);
        }
        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                AiLlmError::Timeout(self.timeout)
            } else {
                AiLlmError::from(e)
            }
        })?;

        ensure_success(resp, &self.url_generate, LlmProvider::Ollama).await
    }
}

#[async_trait]
impl ModelGateway for OllamaService {
    /// Performs a **non-streaming** generation request via `/api/generate`.
    ///
    /// Mapped options:
    /// - `model`        ← `self.cfg.model`
    /// - `prompt`       ← argument
    /// - `num_predict`  ← `self.cfg.max_tokens`
    /// - `temperature`  ← `self.cfg.temperature`
    /// - `top_p`        ← `self.cfg.top_p`
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let started = Instant::now();
        let resp = self.post_generate(prompt, false).await?;

        let out: GenerateResponse = resp.json().await.map_err(|e| {
            // The request deadline also covers reading the body.
            if e.is_timeout() {
                return AiLlmError::Timeout(self.timeout);
            }
            error!(
                error = %e,
                latency_ms = started.elapsed().as_millis(),
                "failed to decode /api/generate response"
            );
            provider_error(ProviderErrorKind::Decode(format!(
                "serde error: {e}; ensure `stream=false` is used"
            )))
        })?;

        if let Some(msg) = out.error {
            return Err(provider_error(ProviderErrorKind::Upstream(msg)));
        }
        match out.response {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(provider_error(ProviderErrorKind::EmptyResponse)),
        }
    }

    /// Starts a streamed generation via `/api/generate` with `stream=true`.
    ///
    /// Each NDJSON line is one [`GenerateResponse`]; lines without text are
    /// skipped, an `error` line becomes an `Upstream` error item.
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    async fn complete_streaming(&self, prompt: &str) -> Result<FragmentStream> {
        let resp = self.post_generate(prompt, true).await?;

        let fragments = split_lines(Box::pin(resp.bytes_stream()))
            .filter_map(|line| async move {
                match line {
                    Ok(line) => decode_stream_line(&line).transpose(),
                    Err(e) => Some(Err(AiLlmError::from(e))),
                }
            })
            .boxed();

        Ok(fragments)
    }

    fn provider(&self) -> LlmProvider {
        LlmProvider::Ollama
    }

    fn model(&self) -> &str {
        &self.cfg.model
    }
}

/// Decodes one NDJSON line of a streamed `/api/generate` response.
///
/// Returns `Ok(None)` for lines that carry no text (e.g. the final
/// `done: true` statistics line).
fn decode_stream_line(line: &str) -> Result<Option<String>> {
    let chunk: GenerateResponse = serde_json::from_str(line).map_err(|e| {
        provider_error(ProviderErrorKind::Decode(format!(
            "serde error: {e}; expected an NDJSON generate chunk"
        )))
    })?;

    if let Some(msg) = chunk.error {
        return Err(provider_error(ProviderErrorKind::Upstream(msg)));
    }
    Ok(chunk.response.filter(|t| !t.is_empty()))
}

fn provider_error(kind: ProviderErrorKind) -> AiLlmError {
    ProviderError::new(LlmProvider::Ollama, kind).into()
}

/* ==========================
HTTP payloads & options
========================== */

/// Request body for `/api/generate`.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

impl<'a> GenerateRequest<'a> {
    /// Builds a request from config and prompt.
    fn from_cfg(cfg: &'a LlmModelConfig, prompt: &'a str, stream: bool) -> Self {
        let options = GenerateOptions {
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            num_predict: cfg.max_tokens,
        };

        Self {
            model: &cfg.model,
            prompt,
            stream,
            options: Some(options),
        }
    }
}

/// Subset of Ollama `options`.
#[derive(Debug, Default, Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Response body for `/api/generate`, both whole and per streamed line.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}
