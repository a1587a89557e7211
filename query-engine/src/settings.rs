//! Runtime knobs for the pipeline, loaded from environment variables.

use std::time::Duration;

use ai_llm_service::{AiLlmError, error_handler::env_opt_u64};

/// Delay between two streamed fragments. Smooths delivery; not a protocol rule.
pub const DEFAULT_STREAM_PACING: Duration = Duration::from_millis(10);
pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_FRAGMENT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Pause after each emitted `content` event.
    pub stream_pacing: Duration,
    /// Deadline for a single-shot answer and for opening a stream.
    pub model_timeout: Duration,
    /// Deadline for each fragment fetch once a stream is open.
    pub fragment_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            stream_pacing: DEFAULT_STREAM_PACING,
            model_timeout: DEFAULT_MODEL_TIMEOUT,
            fragment_timeout: DEFAULT_FRAGMENT_TIMEOUT,
        }
    }
}

impl EngineSettings {
    /// Reads `STREAM_PACING_MS`, `MODEL_TIMEOUT_SECS` and
    /// `STREAM_IDLE_TIMEOUT_SECS`; unset variables keep their defaults.
    ///
    /// # Errors
    /// Returns a config error naming the variable when a value is not a number.
    pub fn from_env() -> Result<Self, AiLlmError> {
        let d = Self::default();
        Ok(Self {
            stream_pacing: env_opt_u64("STREAM_PACING_MS")?
                .map(Duration::from_millis)
                .unwrap_or(d.stream_pacing),
            model_timeout: env_opt_u64("MODEL_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(d.model_timeout),
            fragment_timeout: env_opt_u64("STREAM_IDLE_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(d.fragment_timeout),
        })
    }

    pub fn with_stream_pacing(mut self, pacing: Duration) -> Self {
        self.stream_pacing = pacing;
        self
    }

    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = timeout;
        self
    }

    pub fn with_fragment_timeout(mut self, timeout: Duration) -> Self {
        self.fragment_timeout = timeout;
        self
    }
}
