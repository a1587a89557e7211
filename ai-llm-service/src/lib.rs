//! Model gateway for text generation.
//!
//! - [`gateway::ModelGateway`] is the provider-agnostic capability: one
//!   single-shot call and one streaming call.
//! - [`services`] holds the Gemini and Ollama clients.
//! - [`config`] loads provider settings from the environment.
//! - [`error_handler`] defines the unified [`AiLlmError`].
//! - [`telemetry`] renders this crate's logs.

pub mod config;
pub mod error_handler;
pub mod gateway;
pub mod services;
pub mod telemetry;

pub use error_handler::{AiLlmError, ProviderError, ProviderErrorKind};
pub use gateway::{FragmentStream, ModelGateway, build_gateway};
