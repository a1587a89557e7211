//! Incremental answering: the same pipeline as [`crate::query_service`],
//! emitted as a sequence of [`StreamEvent`]s.
//!
//! Every stream returned by [`StreamEmitter::open`] yields one `metadata`
//! event, then zero or more `content` events, then exactly one `done` or
//! `error` event. The query is recorded right before `done`; a failed
//! stream records nothing.
//!
//! The stream is lazy: fragments are pulled from the model only while the
//! consumer keeps polling. Dropping it drops the upstream fragment stream,
//! which aborts the HTTP response feeding it.

use std::{sync::Arc, time::Instant};

use ai_llm_service::{FragmentStream, ModelGateway};
use chrono::{DateTime, Utc};
use futures::{
    StreamExt,
    stream::{self, BoxStream},
};
use tracing::{debug, info, warn};

use crate::{
    errors::QueryError,
    history::HistoryStore,
    prompt::build_prompt,
    query::{Query, new_query_id},
    settings::EngineSettings,
    stream_event::StreamEvent,
    validation::validate_question,
};

pub type EventStream = BoxStream<'static, StreamEvent>;

struct Shared {
    gateway: Arc<dyn ModelGateway>,
    history: Arc<HistoryStore>,
    settings: EngineSettings,
}

#[derive(Clone)]
pub struct StreamEmitter {
    shared: Arc<Shared>,
}

impl StreamEmitter {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        history: Arc<HistoryStore>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                gateway,
                history,
                settings,
            }),
        }
    }

    /// Validates `question` and returns the event stream answering it.
    ///
    /// Nothing is sent to the model until the stream is polled past its
    /// `metadata` event.
    ///
    /// # Errors
    /// [`QueryError::Validation`] when the question is out of bounds; no
    /// events exist in that case.
    pub fn open(&self, question: String) -> Result<EventStream, QueryError> {
        validate_question(&question)?;

        let state = Emission {
            shared: self.shared.clone(),
            id: new_query_id(),
            question,
            timestamp: Utc::now(),
            started: Instant::now(),
            answer: String::new(),
            fragments: 0,
            phase: Phase::Metadata,
            finished: false,
        };
        debug!(query_id = %state.id, "stream opened");

        Ok(stream::unfold(state, Emission::advance).boxed())
    }
}

enum Phase {
    Metadata,
    Connect,
    /// `pace` is set once a fragment was emitted and the next pull must wait.
    Streaming {
        fragments: FragmentStream,
        pace: bool,
    },
    Done,
}

/// Per-request state threaded through the unfold.
struct Emission {
    shared: Arc<Shared>,
    id: String,
    question: String,
    timestamp: DateTime<Utc>,
    started: Instant,
    answer: String,
    /// Content events emitted so far.
    fragments: usize,
    phase: Phase,
    finished: bool,
}

impl Emission {
    async fn advance(mut self) -> Option<(StreamEvent, Self)> {
        loop {
            match std::mem::replace(&mut self.phase, Phase::Done) {
                Phase::Metadata => {
                    self.phase = Phase::Connect;
                    let event = StreamEvent::Metadata {
                        id: self.id.clone(),
                        question: self.question.clone(),
                        timestamp: self.timestamp,
                    };
                    return Some((event, self));
                }

                Phase::Connect => {
                    let prompt = build_prompt(&self.question);
                    let deadline = self.shared.settings.model_timeout;
                    let opened = tokio::time::timeout(
                        deadline,
                        self.shared.gateway.complete_streaming(&prompt),
                    )
                    .await;

                    match opened {
                        Ok(Ok(fragments)) => {
                            self.phase = Phase::Streaming {
                                fragments,
                                pace: false,
                            };
                        }
                        Ok(Err(e)) => return Some(self.fail(e.into())),
                        Err(_) => return Some(self.fail(QueryError::Timeout(deadline))),
                    }
                }

                Phase::Streaming {
                    mut fragments,
                    pace,
                } => {
                    let pacing = self.shared.settings.stream_pacing;
                    if pace && !pacing.is_zero() {
                        tokio::time::sleep(pacing).await;
                    }

                    let deadline = self.shared.settings.fragment_timeout;
                    let pulled = tokio::time::timeout(deadline, fragments.next()).await;
                    match pulled {
                        Ok(Some(Ok(fragment))) if fragment.is_empty() => {
                            self.phase = Phase::Streaming {
                                fragments,
                                pace: false,
                            };
                        }
                        Ok(Some(Ok(fragment))) => {
                            self.answer.push_str(&fragment);
                            self.fragments += 1;
                            self.phase = Phase::Streaming {
                                fragments,
                                pace: true,
                            };
                            return Some((StreamEvent::Content { content: fragment }, self));
                        }
                        Ok(Some(Err(e))) => return Some(self.fail(e.into())),
                        Ok(None) => return Some(self.finish().await),
                        Err(_) => return Some(self.fail(QueryError::Timeout(deadline))),
                    }
                }

                Phase::Done => return None,
            }
        }
    }

    async fn finish(mut self) -> (StreamEvent, Self) {
        let elapsed = self.started.elapsed();
        let query = Query::new(
            self.id.clone(),
            std::mem::take(&mut self.question),
            std::mem::take(&mut self.answer),
            self.timestamp,
            elapsed,
        );
        let processing_time = query.processing_time;

        info!(
            query_id = %query.id,
            processing_time,
            fragments = self.fragments,
            answer_chars = query.answer.chars().count(),
            "streamed query answered"
        );
        self.shared.history.append(query).await;

        self.finished = true;
        (StreamEvent::Done { processing_time }, self)
    }

    fn fail(mut self, err: QueryError) -> (StreamEvent, Self) {
        warn!(query_id = %self.id, error = %err, "streamed query failed");
        self.finished = true;
        (
            StreamEvent::Error {
                error: err.to_string(),
            },
            self,
        )
    }
}

impl Drop for Emission {
    fn drop(&mut self) {
        if !self.finished {
            info!(
                query_id = %self.id,
                fragments = self.fragments,
                streamed_chars = self.answer.chars().count(),
                "consumer detached, generation cancelled"
            );
        }
    }
}
