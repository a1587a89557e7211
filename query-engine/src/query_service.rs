//! Single-shot question answering.

use std::{sync::Arc, time::Instant};

use ai_llm_service::ModelGateway;
use chrono::Utc;
use tracing::{info, warn};

use crate::{
    errors::QueryError,
    history::HistoryStore,
    prompt::build_prompt,
    query::{Query, new_query_id},
    settings::EngineSettings,
    validation::validate_question,
};

/// Validates a question, asks the model once and records the answer.
#[derive(Clone)]
pub struct QueryService {
    gateway: Arc<dyn ModelGateway>,
    history: Arc<HistoryStore>,
    settings: EngineSettings,
}

impl QueryService {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        history: Arc<HistoryStore>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            gateway,
            history,
            settings,
        }
    }

    /// Answers `question` and appends the resulting [`Query`] to history.
    ///
    /// Nothing is recorded unless a non-empty answer comes back.
    ///
    /// # Errors
    /// - [`QueryError::Validation`] before the model is contacted.
    /// - [`QueryError::Model`] when the provider call fails.
    /// - [`QueryError::EmptyAnswer`] when the provider returns no text.
    /// - [`QueryError::Timeout`] after `model_timeout` without an answer.
    pub async fn handle(&self, question: &str) -> Result<Query, QueryError> {
        validate_question(question)?;

        let id = new_query_id();
        let timestamp = Utc::now();
        let started = Instant::now();
        let prompt = build_prompt(question);

        let answer = tokio::time::timeout(
            self.settings.model_timeout,
            self.gateway.complete(&prompt),
        )
        .await
        .map_err(|_| QueryError::Timeout(self.settings.model_timeout))
        .and_then(|r| r.map_err(QueryError::from))
        .inspect_err(|e| warn!(query_id = %id, error = %e, "query failed"))?;

        if answer.is_empty() {
            warn!(query_id = %id, "model returned an empty answer");
            return Err(QueryError::EmptyAnswer);
        }

        let query = Query::new(id, question.to_string(), answer, timestamp, started.elapsed());
        info!(
            query_id = %query.id,
            processing_time = query.processing_time,
            answer_chars = query.answer.chars().count(),
            "query answered"
        );

        self.history.append(query.clone()).await;
        Ok(query)
    }

    #[cfg(test)]
    pub(crate) fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }
}
