//! Question pipeline of the travel assistant.
//!
//! - [`validation`] rejects questions outside the length bounds.
//! - [`prompt`] wraps a question in the travel-assistant instructions.
//! - [`query_service::QueryService`] answers in one call.
//! - [`stream_emitter::StreamEmitter`] answers as a [`StreamEvent`] sequence.
//! - [`history::HistoryStore`] keeps the last 100 answered queries.

pub mod errors;
pub mod history;
pub mod prompt;
pub mod query;
pub mod query_service;
pub mod settings;
pub mod stream_emitter;
pub mod stream_event;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use errors::{QueryError, ValidationError};
pub use history::{HISTORY_CAPACITY, HistoryPage, HistoryStore};
pub use query::Query;
pub use query_service::QueryService;
pub use settings::EngineSettings;
pub use stream_emitter::{EventStream, StreamEmitter};
pub use stream_event::StreamEvent;
