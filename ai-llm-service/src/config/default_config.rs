//! Default LLM configs loaded strictly from environment variables.
//!
//! This module provides convenience constructors for [`LlmModelConfig`],
//! one per provider, plus [`config_from_env`] which picks the provider
//! from `LLM_KIND`.
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND`         = provider kind (`gemini` (default) or `ollama`)
//! - `LLM_MAX_TOKENS`   = optional max tokens (u32)
//! - `LLM_TEMPERATURE`  = optional sampling temperature (0.0..=2.0)
//! - `LLM_TIMEOUT_SECS` = optional per-request timeout for single-shot calls
//!
//! Gemini-specific:
//! - `GEMINI_API_KEY` = credential (mandatory)
//! - `GEMINI_MODEL`   = model id (default `gemini-1.5-flash`)
//! - `GEMINI_URL`     = API base (default `https://generativelanguage.googleapis.com/v1beta`)
//!
//! Ollama-specific:
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (mandatory)
//! - `OLLAMA_MODEL`                = model id (mandatory)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, env_opt, env_opt_f32, env_opt_u32, env_opt_u64, must_env,
        validate_http_endpoint, validate_range_f32,
    },
};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Builds the config for whichever provider `LLM_KIND` names.
///
/// # Errors
///
/// - [`ConfigError::UnsupportedProvider`] for an unknown `LLM_KIND`
/// - any error of the provider-specific constructor
pub fn config_from_env() -> Result<LlmModelConfig, AiLlmError> {
    let provider = match env_opt("LLM_KIND") {
        Some(kind) => kind.parse::<LlmProvider>()?,
        None => LlmProvider::Gemini,
    };

    match provider {
        LlmProvider::Gemini => config_gemini(),
        LlmProvider::Ollama => config_ollama(),
    }
}

/// Constructs a config for the Gemini API.
///
/// # Env
/// - `GEMINI_API_KEY` (required)
/// - `GEMINI_MODEL`, `GEMINI_URL` (optional)
/// - `LLM_MAX_TOKENS`, `LLM_TEMPERATURE`, `LLM_TIMEOUT_SECS` (optional)
pub fn config_gemini() -> Result<LlmModelConfig, AiLlmError> {
    let api_key = must_env("GEMINI_API_KEY")?;
    let model = env_opt("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
    let endpoint = env_opt("GEMINI_URL").unwrap_or_else(|| DEFAULT_GEMINI_URL.to_string());
    validate_http_endpoint("GEMINI_URL", &endpoint)?;

    Ok(LlmModelConfig {
        provider: LlmProvider::Gemini,
        model,
        endpoint,
        api_key: Some(api_key),
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: temperature()?,
        top_p: None,
        timeout_secs: Some(env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS)),
    })
}

/// Constructs a config for a local Ollama runtime.
///
/// # Env
/// - `OLLAMA_URL` or `OLLAMA_PORT` (required)
/// - `OLLAMA_MODEL` (required)
/// - `LLM_MAX_TOKENS`, `LLM_TEMPERATURE`, `LLM_TIMEOUT_SECS` (optional)
pub fn config_ollama() -> Result<LlmModelConfig, AiLlmError> {
    let endpoint = ollama_endpoint()?;
    let model = must_env("OLLAMA_MODEL")?;

    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model,
        endpoint,
        api_key: None,
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: temperature()?,
        top_p: None,
        timeout_secs: Some(env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS)),
    })
}

/// Resolves the Ollama endpoint strictly from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
fn ollama_endpoint() -> Result<String, AiLlmError> {
    if let Some(url) = env_opt("OLLAMA_URL") {
        validate_http_endpoint("OLLAMA_URL", &url)?;
        return Ok(url);
    }
    if let Some(port) = env_opt("OLLAMA_PORT") {
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidNumber {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?;
        return Ok(format!("http://localhost:{port}"));
    }
    Err(AiLlmError::Config(ConfigError::MissingVar(
        "OLLAMA_URL or OLLAMA_PORT",
    )))
}

fn temperature() -> Result<Option<f32>, AiLlmError> {
    let value = env_opt_f32("LLM_TEMPERATURE")?;
    if let Some(t) = value {
        validate_range_f32("LLM_TEMPERATURE", t, 0.0, 2.0, "expected 0.0..=2.0")?;
    }
    Ok(value)
}
