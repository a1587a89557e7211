//! Gemini (Generative Language API) service for text generation.
//!
//! Endpoints are derived from `LlmModelConfig::endpoint`:
//! - POST {endpoint}/models/{model}:generateContent             — single-shot
//! - POST {endpoint}/models/{model}:streamGenerateContent?alt=sse — SSE stream
//!
//! Constructor validation:
//! - `cfg.provider` must be `LlmProvider::Gemini`
//! - `cfg.api_key` must be present (sent as `x-goog-api-key`, never in the URL)
//! - `cfg.endpoint` must start with http:// or https://
//!
//! Errors are normalized via unified error types in `error_handler`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, ProviderError, ProviderErrorKind, Result},
    gateway::{FragmentStream, ModelGateway},
    services::{ensure_success, line_stream::split_lines},
};

/// Thin client for the Gemini API.
///
/// Constructed from a complete [`LlmModelConfig`]. Internally keeps a
/// preconfigured `reqwest::Client` with the API key as a default header.
#[derive(Debug)]
pub struct GeminiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_generate: String,
    url_stream: String,
    timeout: Duration,
}

impl GeminiService {
    /// Creates a new [`GeminiService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not Gemini
    /// - `MissingApiKey` if `cfg.api_key` is `None`
    /// - `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        // 1) Provider must be Gemini.
        if cfg.provider != LlmProvider::Gemini {
            return Err(provider_error(ProviderErrorKind::InvalidProvider));
        }

        // 2) API key must be present.
        let api_key = cfg
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| provider_error(ProviderErrorKind::MissingApiKey))?;

        // 3) Endpoint must use http/https.
        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(provider_error(ProviderErrorKind::InvalidEndpoint(
                cfg.endpoint.clone(),
            )));
        }

        // 4) HTTP client: default headers; the timeout is applied per single-shot request.
        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut key_header = header::HeaderValue::from_str(api_key.trim()).map_err(|e| {
            provider_error(ProviderErrorKind::Decode(format!(
                "invalid API key header: {e}"
            )))
        })?;
        key_header.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert("x-goog-api-key", key_header);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .default_headers(headers)
            .gzip(true)
            .build()?;

        let base = endpoint.trim_end_matches('/');
        let model = cfg.model.trim().trim_start_matches("models/");
        let url_generate = format!("{base}/models/{model}:generateContent");
        let url_stream = format!("{base}/models/{model}:streamGenerateContent?alt=sse");

        info!(
            provider = %cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            "GeminiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_generate,
            url_stream,
            timeout,
        })
    }

    async fn post(&self, url: &str, prompt: &str, single_shot: bool) -> Result<reqwest::Response> {
        let body = GenerateContentRequest::from_cfg(&self.cfg, prompt);

        debug!(prompt_len = prompt.len(), "POST {}", url);
        let mut req = self.client.post(url).json(&body);
        if single_shot {
            req = req.timeout(self.timeout);
        }
        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                AiLlmError::Timeout(self.timeout)
            } else {
                AiLlmError::from(e)
            }
        })?;

        ensure_success(resp, url, LlmProvider::Gemini).await
    }
}

#[async_trait]
impl ModelGateway for GeminiService {
    /// Performs a single `generateContent` call and returns the joined text parts.
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let started = Instant::now();
        let resp = self.post(&self.url_generate, prompt, true).await?;

        let out: GenerateContentResponse = resp.json().await.map_err(|e| {
            // The request deadline also covers reading the body.
            if e.is_timeout() {
                return AiLlmError::Timeout(self.timeout);
            }
            error!(
                error = %e,
                latency_ms = started.elapsed().as_millis(),
                "failed to decode generateContent response"
            );
            provider_error(ProviderErrorKind::Decode(format!(
                "serde error: {e}; expected `candidates[0].content.parts[].text`"
            )))
        })?;

        let text = out
            .into_text()?
            .ok_or_else(|| provider_error(ProviderErrorKind::EmptyResponse))?;

        debug!(
            answer_len = text.len(),
            latency_ms = started.elapsed().as_millis(),
            "generateContent done"
        );
        Ok(text)
    }

    /// Opens a `streamGenerateContent` SSE stream; each `data:` line is one
    /// response chunk whose text becomes one fragment.
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    async fn complete_streaming(&self, prompt: &str) -> Result<FragmentStream> {
        let resp = self.post(&self.url_stream, prompt, false).await?;

        let fragments = split_lines(Box::pin(resp.bytes_stream()))
            .filter_map(|line| async move {
                match line {
                    Ok(line) => decode_sse_line(&line).transpose(),
                    Err(e) => Some(Err(AiLlmError::from(e))),
                }
            })
            .boxed();

        Ok(fragments)
    }

    fn provider(&self) -> LlmProvider {
        LlmProvider::Gemini
    }

    fn model(&self) -> &str {
        &self.cfg.model
    }
}

/// Decodes one SSE line of a `streamGenerateContent?alt=sse` body.
///
/// Non-`data:` lines (comments, `event:` fields) and chunks without text
/// yield `Ok(None)`.
fn decode_sse_line(line: &str) -> Result<Option<String>> {
    let Some(payload) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let payload = payload.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return Ok(None);
    }

    let chunk: GenerateContentResponse = serde_json::from_str(payload).map_err(|e| {
        provider_error(ProviderErrorKind::Decode(format!(
            "serde error: {e}; expected a generateContent chunk"
        )))
    })?;
    chunk.into_text()
}

fn provider_error(kind: ProviderErrorKind) -> AiLlmError {
    ProviderError::new(LlmProvider::Gemini, kind).into()
}

/* ==========================
HTTP payloads
========================== */

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [RequestContent<'a>; 1],
    #[serde(skip_serializing_if = "GenerationConfig::is_empty")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

impl GenerationConfig {
    fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.top_p.is_none() && self.max_output_tokens.is_none()
    }
}

impl<'a> GenerateContentRequest<'a> {
    fn from_cfg(cfg: &LlmModelConfig, prompt: &'a str) -> Self {
        Self {
            contents: [RequestContent {
                role: "user",
                parts: [RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: cfg.temperature,
                top_p: cfg.top_p,
                max_output_tokens: cfg.max_tokens,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

impl GenerateContentResponse {
    /// Joined text of the first candidate; in-band errors and blocked prompts fail.
    fn into_text(self) -> Result<Option<String>> {
        if let Some(err) = self.error {
            return Err(provider_error(ProviderErrorKind::Upstream(err.message)));
        }

        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if !text.is_empty() {
            return Ok(Some(text));
        }
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(provider_error(ProviderErrorKind::Upstream(format!(
                "prompt blocked: {reason}"
            ))));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Gemini,
            model: "models/gemini-1.5-flash".into(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta/".into(),
            api_key: Some("test-key".into()),
            max_tokens: None,
            temperature: Some(0.4),
            top_p: None,
            timeout_secs: Some(30),
        }
    }

    #[test]
    fn builds_urls_without_key_in_query() {
        let svc = GeminiService::new(cfg()).unwrap();
        assert_eq!(
            svc.url_generate,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert!(svc.url_stream.ends_with(":streamGenerateContent?alt=sse"));
        assert!(!svc.url_stream.contains("test-key"));
    }

    #[test]
    fn requires_api_key() {
        let mut no_key = cfg();
        no_key.api_key = Some("  ".into());
        let err = GeminiService::new(no_key).unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::MissingApiKey,
                ..
            })
        ));
    }

    #[test]
    fn request_body_shape() {
        let cfg = cfg();
        let body = serde_json::to_value(GenerateContentRequest::from_cfg(&cfg, "Q?")).unwrap();
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Q?");
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.4).abs() < 1e-6);
        assert!(body["generationConfig"].get("maxOutputTokens").is_none());
    }

    #[test]
    fn joins_all_text_parts_of_first_candidate() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"Spring "},{"text":"or autumn."}]}},
                      {"content":{"parts":[{"text":"ignored"}]}}]}"#;
        let resp: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.into_text().unwrap().as_deref(), Some("Spring or autumn."));
    }

    #[test]
    fn sse_data_lines_decode_and_others_are_skipped() {
        let line = r#"data: {"candidates":[{"content":{"parts":[{"text":"Kyoto"}],"role":"model"}}]}"#;
        assert_eq!(decode_sse_line(line).unwrap().as_deref(), Some("Kyoto"));
        assert_eq!(decode_sse_line(": keep-alive").unwrap(), None);
        assert_eq!(
            decode_sse_line(r#"data: {"candidates":[{"finishReason":"STOP"}]}"#).unwrap(),
            None
        );
    }

    #[test]
    fn in_band_error_and_block_become_upstream_errors() {
        let err = decode_sse_line(r#"data: {"error":{"code":429,"message":"Resource exhausted"}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("Resource exhausted"));

        let blocked: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        let err = blocked.into_text().unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }
}
