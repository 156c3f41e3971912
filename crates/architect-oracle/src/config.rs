//! Oracle configuration, loaded from environment variables.
//!
//! The oracle needs to know which LLM backends to call (URL, key, model),
//! how long a decision may take, and where to find template overrides.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::OracleError;

/// Decision deadline used when `DECISION_TIMEOUT_MS` is unset.
pub const DEFAULT_DECISION_TIMEOUT_MS: u64 = 20_000;

/// Complete oracle configuration.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Backend consulted first.
    pub primary_backend: LlmBackendConfig,
    /// Backend consulted when the primary one fails.
    pub escalation_backend: Option<LlmBackendConfig>,
    /// Maximum time allowed for one decision (all backend attempts).
    pub decision_timeout: Duration,
    /// Directory whose `system.j2` / `request.j2` replace the built-ins.
    pub templates_dir: Option<PathBuf>,
    /// Ask Gemini backends to ground answers with web search.
    pub search_grounding: bool,
}

/// Configuration for a single LLM backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmBackendConfig {
    /// The backend wire format.
    pub backend_type: BackendType,
    /// Base API URL (e.g. `https://api.openai.com/v1`).
    pub api_url: String,
    /// API key for authentication.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
}

/// Supported LLM wire formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// `OpenAI`-compatible chat completions (`OpenAI`, `DeepSeek`, Ollama).
    OpenAi,
    /// Anthropic Messages API.
    Anthropic,
    /// Google Gemini `generateContent`.
    Gemini,
}

impl BackendType {
    /// Parse a backend name as written in the environment.
    pub fn parse(name: &str) -> Result<Self, OracleError> {
        match name.trim().to_lowercase().as_str() {
            "openai" | "deepseek" | "ollama" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "gemini" | "google" => Ok(Self::Gemini),
            other => Err(OracleError::Config(format!("unknown backend type: {other}"))),
        }
    }
}

impl OracleConfig {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `LLM_DEFAULT_BACKEND` -- primary backend type
    /// - `LLM_DEFAULT_API_URL` -- primary API base URL
    /// - `LLM_DEFAULT_API_KEY` -- primary API key
    /// - `LLM_DEFAULT_MODEL` -- primary model name
    ///
    /// Optional variables:
    /// - `LLM_ESCALATION_BACKEND`, `LLM_ESCALATION_API_URL`,
    ///   `LLM_ESCALATION_API_KEY`, `LLM_ESCALATION_MODEL` -- fallback backend
    /// - `DECISION_TIMEOUT_MS` -- decision deadline (default 20000)
    /// - `TEMPLATES_DIR` -- prompt template overrides
    /// - `SEARCH_GROUNDING` -- Gemini web-search grounding (default `true`)
    pub fn from_env() -> Result<Self, OracleError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, OracleError> {
        let primary_backend = load_backend_config(&lookup, "LLM_DEFAULT")?;
        let escalation_backend = load_backend_config(&lookup, "LLM_ESCALATION").ok();

        let decision_timeout_ms = match lookup("DECISION_TIMEOUT_MS") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| OracleError::Config(format!("invalid DECISION_TIMEOUT_MS: {e}")))?,
            None => DEFAULT_DECISION_TIMEOUT_MS,
        };

        let search_grounding = match lookup("SEARCH_GROUNDING") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| OracleError::Config(format!("invalid SEARCH_GROUNDING: {e}")))?,
            None => true,
        };

        Ok(Self {
            primary_backend,
            escalation_backend,
            decision_timeout: Duration::from_millis(decision_timeout_ms),
            templates_dir: lookup("TEMPLATES_DIR").map(PathBuf::from),
            search_grounding,
        })
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String, OracleError> {
    lookup(name).ok_or_else(|| OracleError::Config(format!("missing required env var {name}")))
}

/// Load an LLM backend config from a set of prefixed variables.
fn load_backend_config(
    lookup: &impl Fn(&str) -> Option<String>,
    prefix: &str,
) -> Result<LlmBackendConfig, OracleError> {
    let backend_type = BackendType::parse(&required(lookup, &format!("{prefix}_BACKEND"))?)?;
    let api_url = required(lookup, &format!("{prefix}_API_URL"))?;
    let api_key = required(lookup, &format!("{prefix}_API_KEY"))?;
    let model = required(lookup, &format!("{prefix}_MODEL"))?;

    Ok(LlmBackendConfig {
        backend_type,
        api_url: api_url.trim_end_matches('/').to_owned(),
        api_key,
        model,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const PRIMARY: [(&str, &str); 4] = [
        ("LLM_DEFAULT_BACKEND", "gemini"),
        ("LLM_DEFAULT_API_URL", "https://generativelanguage.googleapis.com/v1beta/"),
        ("LLM_DEFAULT_API_KEY", "key"),
        ("LLM_DEFAULT_MODEL", "gemini-2.0-flash"),
    ];

    #[test]
    fn primary_only_uses_defaults() {
        let config = OracleConfig::from_lookup(lookup(&PRIMARY)).unwrap();
        assert_eq!(config.primary_backend.backend_type, BackendType::Gemini);
        assert_eq!(
            config.primary_backend.api_url,
            "https://generativelanguage.googleapis.com/v1beta"
        );
        assert!(config.escalation_backend.is_none());
        assert_eq!(config.decision_timeout, Duration::from_millis(20_000));
        assert!(config.templates_dir.is_none());
        assert!(config.search_grounding);
    }

    #[test]
    fn escalation_and_overrides() {
        let mut vars = PRIMARY.to_vec();
        vars.extend([
            ("LLM_ESCALATION_BACKEND", "claude"),
            ("LLM_ESCALATION_API_URL", "https://api.anthropic.com/v1"),
            ("LLM_ESCALATION_API_KEY", "other"),
            ("LLM_ESCALATION_MODEL", "claude-haiku"),
            ("DECISION_TIMEOUT_MS", "1500"),
            ("TEMPLATES_DIR", "/etc/architect/templates"),
            ("SEARCH_GROUNDING", "false"),
        ]);
        let config = OracleConfig::from_lookup(lookup(&vars)).unwrap();
        let escalation = config.escalation_backend.unwrap();
        assert_eq!(escalation.backend_type, BackendType::Anthropic);
        assert_eq!(config.decision_timeout, Duration::from_millis(1500));
        assert_eq!(
            config.templates_dir,
            Some(PathBuf::from("/etc/architect/templates"))
        );
        assert!(!config.search_grounding);
    }

    #[test]
    fn missing_primary_is_an_error() {
        let result = OracleConfig::from_lookup(lookup(&[]));
        assert!(matches!(result, Err(OracleError::Config(_))));
    }

    #[test]
    fn invalid_timeout_is_an_error() {
        let mut vars = PRIMARY.to_vec();
        vars.push(("DECISION_TIMEOUT_MS", "soon"));
        assert!(OracleConfig::from_lookup(lookup(&vars)).is_err());
    }

    #[test]
    fn backend_names() {
        assert_eq!(BackendType::parse("OpenAI").unwrap(), BackendType::OpenAi);
        assert_eq!(BackendType::parse("ollama").unwrap(), BackendType::OpenAi);
        assert_eq!(BackendType::parse("google").unwrap(), BackendType::Gemini);
        assert!(BackendType::parse("mystery").is_err());
    }
}
