//! Error types for the engine binary.

/// Top-level error for the engine binary.
///
/// Only startup failures surface here. Oracle and persistence problems
/// degrade to offline operation instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: architect_core::ConfigError,
    },

    /// Observer API server failed.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying server error.
        #[from]
        source: architect_observer::ServerError,
    },

    /// A background task panicked or was cancelled.
    #[error("task join error: {message}")]
    Join {
        /// Description of the join failure.
        message: String,
    },
}
