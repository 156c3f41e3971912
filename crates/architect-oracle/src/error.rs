//! Error types for the decision oracle.
//!
//! None of these reach the orchestrator: [`LlmOracle::decide`] turns every
//! one of them into the fallback decision. They do surface through
//! [`LlmOracle::complete_raw`], which the HTTP pass-through reports verbatim.
//!
//! [`LlmOracle::decide`]: crate::LlmOracle
//! [`LlmOracle::complete_raw`]: crate::LlmOracle::complete_raw

/// Errors that can occur while consulting a language model.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// A prompt template failed to load or render.
    #[error("template render error: {0}")]
    Template(String),

    /// An LLM backend returned an error or was unreachable.
    #[error("LLM backend error: {0}")]
    LlmBackend(String),

    /// The response text held no JSON object.
    #[error("response parse error: {0}")]
    Parse(String),

    /// The decision deadline was exceeded.
    #[error("timeout: no response within {timeout_ms} ms")]
    Timeout {
        /// The deadline that elapsed.
        timeout_ms: u64,
    },

    /// Serialization or deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}
