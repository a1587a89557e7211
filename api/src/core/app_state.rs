use std::sync::Arc;

use ai_llm_service::{
    AiLlmError, ModelGateway, build_gateway, config::default_config::config_from_env,
};
use query_engine::{EngineSettings, HistoryStore, QueryService, StreamEmitter};

/// Shared state for all HTTP handlers.
///
/// Both answering paths write into the same [`HistoryStore`].
#[derive(Clone)]
pub struct AppState {
    pub query_service: QueryService,
    pub stream_emitter: StreamEmitter,
    pub history: Arc<HistoryStore>,
}

impl AppState {
    pub fn new(gateway: Arc<dyn ModelGateway>, settings: EngineSettings) -> Self {
        let history = Arc::new(HistoryStore::new());
        Self {
            query_service: QueryService::new(gateway.clone(), history.clone(), settings),
            stream_emitter: StreamEmitter::new(gateway, history.clone(), settings),
            history,
        }
    }

    /// Builds the model gateway and engine settings from environment variables.
    pub fn from_env() -> Result<Self, AiLlmError> {
        let gateway = build_gateway(config_from_env()?)?;
        let settings = EngineSettings::from_env()?;
        Ok(Self::new(gateway, settings))
    }
}
