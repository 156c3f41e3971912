//! LLM backend abstraction and implementations.
//!
//! Enum dispatch over the three supported wire formats, since async
//! methods are not dyn-compatible. Every backend sends a rendered prompt
//! over HTTP via `reqwest` and returns the text it got back, plus any
//! search grounding the provider attached.

use architect_types::{GroundingLink, KnowledgeCategory, WorldObjectType};
use serde_json::{Value, json};

use crate::config::{BackendType, LlmBackendConfig};
use crate::error::OracleError;
use crate::parse::link_from_parts;
use crate::prompt::RenderedPrompt;

const MAX_TOKENS: u32 = 1024;
const TEMPERATURE: f64 = 0.7;

/// What a backend returned for one prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendResponse {
    /// Raw response text, ideally a JSON object.
    pub text: String,
    /// Web sources the provider grounded the answer in.
    pub grounding: Vec<GroundingLink>,
}

impl BackendResponse {
    /// A response with text only.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            grounding: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Unified backend enum
// ---------------------------------------------------------------------------

/// An LLM backend that can process a prompt and return a response.
pub enum LlmBackend {
    /// OpenAI-compatible chat completions API.
    OpenAi(OpenAiBackend),
    /// Anthropic Messages API.
    Anthropic(AnthropicBackend),
    /// Google Gemini `generateContent` API.
    Gemini(GeminiBackend),
}

impl LlmBackend {
    /// Send a prompt to the LLM and return the response.
    pub async fn complete(&self, prompt: &RenderedPrompt) -> Result<BackendResponse, OracleError> {
        match self {
            Self::OpenAi(backend) => backend.complete(prompt).await,
            Self::Anthropic(backend) => backend.complete(prompt).await,
            Self::Gemini(backend) => backend.complete(prompt).await,
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::OpenAi(_) => "openai-compatible",
            Self::Anthropic(_) => "anthropic",
            Self::Gemini(_) => "gemini",
        }
    }

    /// Model identifier the backend was configured with.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAi(backend) => &backend.model,
            Self::Anthropic(backend) => &backend.model,
            Self::Gemini(backend) => &backend.model,
        }
    }
}

/// Create an LLM backend from configuration.
///
/// `search_grounding` only affects Gemini backends.
pub fn create_backend(config: &LlmBackendConfig, search_grounding: bool) -> LlmBackend {
    match config.backend_type {
        BackendType::OpenAi => LlmBackend::OpenAi(OpenAiBackend::new(config)),
        BackendType::Anthropic => LlmBackend::Anthropic(AnthropicBackend::new(config)),
        BackendType::Gemini => LlmBackend::Gemini(GeminiBackend::new(config, search_grounding)),
    }
}

async fn send_json(
    provider: &str,
    request: reqwest::RequestBuilder,
    body: &Value,
) -> Result<Value, OracleError> {
    let response = request
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await
        .map_err(|e| OracleError::LlmBackend(format!("{provider} request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error body".to_owned());
        return Err(OracleError::LlmBackend(format!(
            "{provider} returned {status}: {error_body}"
        )));
    }

    response
        .json()
        .await
        .map_err(|e| OracleError::LlmBackend(format!("{provider} response parse failed: {e}")))
}

// ---------------------------------------------------------------------------
// OpenAI-compatible backend
// ---------------------------------------------------------------------------

/// Backend for OpenAI-compatible chat completions APIs.
///
/// Sends requests to `{api_url}/chat/completions`.
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiBackend {
    /// Create a new `OpenAI`-compatible backend.
    pub fn new(config: &LlmBackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    async fn complete(&self, prompt: &RenderedPrompt) -> Result<BackendResponse, OracleError> {
        let url = format!("{}/chat/completions", self.api_url);
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": prompt.user}
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
            "response_format": {"type": "json_object"}
        });
        let request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key));
        let json = send_json("OpenAI", request, &body).await?;
        extract_openai_content(&json).map(BackendResponse::text)
    }
}

/// Extract the text content from an `OpenAI` chat completions response.
fn extract_openai_content(json: &Value) -> Result<String, OracleError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            OracleError::LlmBackend("OpenAI response missing choices[0].message.content".to_owned())
        })
}

// ---------------------------------------------------------------------------
// Anthropic Messages API backend
// ---------------------------------------------------------------------------

/// Backend for the Anthropic Messages API.
///
/// The system prompt is a top-level field and the key goes in `x-api-key`.
pub struct AnthropicBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl AnthropicBackend {
    /// Create a new Anthropic Messages API backend.
    pub fn new(config: &LlmBackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    async fn complete(&self, prompt: &RenderedPrompt) -> Result<BackendResponse, OracleError> {
        let url = format!("{}/messages", self.api_url);
        let body = json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "system": prompt.system,
            "messages": [
                {"role": "user", "content": prompt.user}
            ]
        });
        let request = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01");
        let json = send_json("Anthropic", request, &body).await?;
        extract_anthropic_content(&json).map(BackendResponse::text)
    }
}

/// Extract the text content from an Anthropic Messages API response.
fn extract_anthropic_content(json: &Value) -> Result<String, OracleError> {
    json.get("content")
        .and_then(|c| c.get(0))
        .and_then(|b| b.get("text"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            OracleError::LlmBackend("Anthropic response missing content[0].text".to_owned())
        })
}

// ---------------------------------------------------------------------------
// Gemini backend
// ---------------------------------------------------------------------------

/// Backend for the Google Gemini `generateContent` API.
///
/// Requests JSON output constrained by [`decision_schema`]. With search
/// grounding on, the provider's grounding chunks come back as
/// [`GroundingLink`]s.
pub struct GeminiBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    search_grounding: bool,
}

impl GeminiBackend {
    /// Create a new Gemini backend.
    pub fn new(config: &LlmBackendConfig, search_grounding: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            search_grounding,
        }
    }

    async fn complete(&self, prompt: &RenderedPrompt) -> Result<BackendResponse, OracleError> {
        let url = format!("{}/models/{}:generateContent", self.api_url, self.model);
        let mut body = json!({
            "systemInstruction": {"parts": [{"text": prompt.system}]},
            "contents": [{"role": "user", "parts": [{"text": prompt.user}]}],
            "generationConfig": {
                "temperature": TEMPERATURE,
                "maxOutputTokens": MAX_TOKENS,
                "responseMimeType": "application/json",
                "responseSchema": decision_schema()
            }
        });
        if self.search_grounding
            && let Some(fields) = body.as_object_mut()
        {
            fields.insert(String::from("tools"), json!([{"googleSearch": {}}]));
        }
        let request = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key);
        let json = send_json("Gemini", request, &body).await?;
        extract_gemini_response(&json)
    }
}

/// Extract text and grounding from a Gemini `generateContent` response.
fn extract_gemini_response(json: &Value) -> Result<BackendResponse, OracleError> {
    let candidate = json
        .get("candidates")
        .and_then(|c| c.get(0))
        .ok_or_else(|| OracleError::LlmBackend("Gemini response missing candidates[0]".to_owned()))?;

    let text: String = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter(|p| !p.get("thought").and_then(Value::as_bool).unwrap_or(false))
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(OracleError::LlmBackend(
            "Gemini response missing candidates[0].content.parts[].text".to_owned(),
        ));
    }

    let grounding = candidate
        .get("groundingMetadata")
        .and_then(|m| m.get("groundingChunks"))
        .and_then(Value::as_array)
        .map(|chunks| {
            chunks
                .iter()
                .filter_map(|chunk| {
                    let web = chunk.get("web")?;
                    link_from_parts(
                        web.get("uri").and_then(Value::as_str),
                        web.get("title").and_then(Value::as_str),
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(BackendResponse { text, grounding })
}

/// The response schema Gemini is asked to honour.
pub fn decision_schema() -> Value {
    let object_types: Vec<&str> = WorldObjectType::ALL.iter().map(|t| t.as_str()).collect();
    let categories: Vec<&str> = KnowledgeCategory::ALL.iter().map(|c| c.as_str()).collect();
    let position = json!({"type": "ARRAY", "items": {"type": "NUMBER"}});
    json!({
        "type": "OBJECT",
        "properties": {
            "action": {"type": "STRING", "enum": ["PLACE", "MOVE", "WAIT"]},
            "objectType": {"type": "STRING", "enum": object_types},
            "position": position,
            "reason": {"type": "STRING"},
            "reasoningSteps": {"type": "ARRAY", "items": {"type": "STRING"}},
            "learningNote": {"type": "STRING"},
            "knowledgeCategory": {"type": "STRING", "enum": categories},
            "taskLabel": {"type": "STRING"},
            "plan": {
                "type": "OBJECT",
                "properties": {
                    "objective": {"type": "STRING"},
                    "steps": {
                        "type": "ARRAY",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "label": {"type": "STRING"},
                                "type": {"type": "STRING", "enum": object_types},
                                "position": position,
                                "status": {"type": "STRING", "enum": ["pending", "active", "completed"]}
                            },
                            "required": ["label", "type", "position", "status"]
                        }
                    },
                    "currentStepIndex": {"type": "NUMBER"}
                }
            }
        },
        "required": ["action", "reason", "reasoningSteps", "learningNote", "knowledgeCategory", "taskLabel"]
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn backend_config(backend_type: BackendType) -> LlmBackendConfig {
        LlmBackendConfig {
            backend_type,
            api_url: "https://example.invalid/v1".to_owned(),
            api_key: "test".to_owned(),
            model: "test-model".to_owned(),
        }
    }

    #[test]
    fn extract_openai_content_valid() {
        let json = json!({
            "choices": [{"message": {"content": "{\"action\": \"WAIT\"}"}}]
        });
        assert!(extract_openai_content(&json).unwrap().contains("WAIT"));
    }

    #[test]
    fn extract_openai_content_missing_choices() {
        assert!(extract_openai_content(&json!({"error": "rate_limit"})).is_err());
    }

    #[test]
    fn extract_anthropic_content_valid() {
        let json = json!({"content": [{"type": "text", "text": "{\"action\": \"PLACE\"}"}]});
        assert!(extract_anthropic_content(&json).unwrap().contains("PLACE"));
    }

    #[test]
    fn extract_anthropic_content_missing() {
        assert!(extract_anthropic_content(&json!({"content": []})).is_err());
    }

    #[test]
    fn extract_gemini_text_and_grounding() {
        let json = json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "thinking...", "thought": true},
                    {"text": "{\"action\": \"PLACE\"}"}
                ]},
                "groundingMetadata": {"groundingChunks": [
                    {"web": {"uri": "https://example.org/rainwater", "title": "Rainwater"}},
                    {"web": {"uri": "https://example.org/untitled"}},
                    {"web": {"uri": "", "title": "Dropped"}},
                    {"retrievedContext": {}}
                ]}
            }]
        });
        let response = extract_gemini_response(&json).unwrap();
        assert_eq!(response.text, "{\"action\": \"PLACE\"}");
        assert_eq!(response.grounding.len(), 2);
        assert_eq!(response.grounding.first().unwrap().title, "Rainwater");
        assert_eq!(response.grounding.get(1).unwrap().title, "Underworld Archive");
    }

    #[test]
    fn extract_gemini_without_text_is_an_error() {
        let json = json!({"candidates": [{"content": {"parts": []}, "finishReason": "SAFETY"}]});
        assert!(extract_gemini_response(&json).is_err());
        assert!(extract_gemini_response(&json!({})).is_err());
    }

    #[test]
    fn schema_lists_every_object_type() {
        let schema = decision_schema();
        let listed = schema
            .pointer("/properties/objectType/enum")
            .and_then(Value::as_array)
            .unwrap();
        assert_eq!(listed.len(), WorldObjectType::ALL.len());
        assert!(schema.pointer("/properties/plan/properties/steps").is_some());
    }

    #[test]
    fn create_backend_dispatches_correctly() {
        let backend = create_backend(&backend_config(BackendType::OpenAi), true);
        assert_eq!(backend.name(), "openai-compatible");
        let backend = create_backend(&backend_config(BackendType::Anthropic), true);
        assert_eq!(backend.name(), "anthropic");
        let backend = create_backend(&backend_config(BackendType::Gemini), false);
        assert_eq!(backend.name(), "gemini");
        assert_eq!(backend.model(), "test-model");
    }
}
