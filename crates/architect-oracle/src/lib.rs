//! LLM-backed decision oracle for the Architect simulation.
//!
//! Renders the per-tick situation report into a prompt, sends it to an
//! OpenAI-compatible, Anthropic, or Gemini backend, and repairs the reply
//! into a [`Decision`](architect_types::Decision). The orchestrator never
//! sees an error from this crate: every failure becomes the fallback WAIT.
//!
//! # Modules
//!
//! - [`config`] -- Backend and deadline configuration from the environment.
//! - [`error`] -- [`OracleError`].
//! - [`llm`] -- HTTP backends with enum dispatch.
//! - [`oracle`] -- [`LlmOracle`] and the raw pass-through.
//! - [`parse`] -- Response extraction and field-by-field repair.
//! - [`prompt`] -- `minijinja` templates.

pub mod config;
pub mod error;
pub mod llm;
pub mod oracle;
pub mod parse;
pub mod prompt;

pub use config::{BackendType, LlmBackendConfig, OracleConfig};
pub use error::OracleError;
pub use llm::{BackendResponse, LlmBackend, create_backend};
pub use oracle::{LlmOracle, RawDecisionRequest};
pub use prompt::{PromptEngine, PromptInput, RenderedPrompt};
