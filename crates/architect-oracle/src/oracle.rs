//! The LLM-backed [`DecisionOracle`].
//!
//! One decision is: render the prompt, call the primary backend (then the
//! escalation backend if the primary fails), all under one deadline, and
//! parse whatever text comes back. Any failure along the way resolves to
//! [`fallback_decision`].

use std::time::{Duration, Instant};

use architect_core::{DecisionOracle, OracleContext, fallback_decision};
use architect_types::Decision;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::OracleConfig;
use crate::error::OracleError;
use crate::llm::{BackendResponse, LlmBackend, create_backend};
use crate::parse::{extract_json, parse_decision};
use crate::prompt::{PromptEngine, PromptInput, RenderedPrompt};

/// Body of the raw decision pass-through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDecisionRequest {
    /// User message sent to the model as-is.
    pub prompt: String,
    /// Goal woven into the system instruction.
    #[serde(default)]
    pub current_goal: String,
    /// Knowledge entries the caller holds. Only the count is used.
    #[serde(default)]
    pub knowledge_base: Vec<Value>,
}

/// Decision oracle over one or two LLM backends.
pub struct LlmOracle {
    primary: LlmBackend,
    escalation: Option<LlmBackend>,
    prompts: PromptEngine,
    decision_timeout: Duration,
}

impl core::fmt::Debug for LlmOracle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LlmOracle")
            .field("primary", &self.primary.name())
            .field("escalation", &self.escalation.as_ref().map(LlmBackend::name))
            .field("decision_timeout", &self.decision_timeout)
            .finish_non_exhaustive()
    }
}

impl LlmOracle {
    /// Assemble an oracle from its parts.
    pub const fn new(
        primary: LlmBackend,
        escalation: Option<LlmBackend>,
        prompts: PromptEngine,
        decision_timeout: Duration,
    ) -> Self {
        Self {
            primary,
            escalation,
            prompts,
            decision_timeout,
        }
    }

    /// Build the backends and templates described by `config`.
    pub fn from_config(config: &OracleConfig) -> Result<Self, OracleError> {
        let prompts = PromptEngine::new(config.templates_dir.as_deref())?;
        let primary = create_backend(&config.primary_backend, config.search_grounding);
        let escalation = config
            .escalation_backend
            .as_ref()
            .map(|backend| create_backend(backend, config.search_grounding));
        info!(
            primary = primary.name(),
            model = primary.model(),
            escalation = escalation.as_ref().map(LlmBackend::name),
            timeout_ms = u64::try_from(config.decision_timeout.as_millis()).unwrap_or(u64::MAX),
            "Decision oracle configured"
        );
        Ok(Self::new(primary, escalation, prompts, config.decision_timeout))
    }

    /// Send a caller-supplied prompt and return the model's JSON untouched.
    ///
    /// Unlike [`decide`](DecisionOracle::decide), failures are returned
    /// rather than replaced by the fallback.
    pub async fn complete_raw(&self, request: &RawDecisionRequest) -> Result<Value, OracleError> {
        let system = self.prompts.render_system(&PromptInput::for_goal(
            &request.current_goal,
            request.knowledge_base.len(),
        ))?;
        let prompt = RenderedPrompt {
            system,
            user: request.prompt.clone(),
        };
        let response = self.complete_within_deadline(&prompt).await?;
        extract_json(&response.text)
    }

    async fn complete(&self, prompt: &RenderedPrompt) -> Result<BackendResponse, OracleError> {
        let primary_error = match self.primary.complete(prompt).await {
            Ok(response) => return Ok(response),
            Err(e) => e,
        };
        let Some(escalation) = &self.escalation else {
            return Err(primary_error);
        };
        warn!(
            backend = self.primary.name(),
            escalation = escalation.name(),
            error = %primary_error,
            "Primary backend failed, escalating"
        );
        escalation.complete(prompt).await
    }

    async fn complete_within_deadline(
        &self,
        prompt: &RenderedPrompt,
    ) -> Result<BackendResponse, OracleError> {
        match tokio::time::timeout(self.decision_timeout, self.complete(prompt)).await {
            Ok(result) => result,
            Err(elapsed) => {
                debug!(%elapsed, "Oracle deadline elapsed");
                Err(OracleError::Timeout {
                    timeout_ms: u64::try_from(self.decision_timeout.as_millis())
                        .unwrap_or(u64::MAX),
                })
            }
        }
    }
}

impl DecisionOracle for LlmOracle {
    async fn decide(&self, context: &OracleContext<'_>) -> Decision {
        let prompt = match self.prompts.render(&PromptInput::from_context(context)) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(error = %e, "Prompt render failed, substituting fallback");
                return fallback_decision();
            }
        };

        let started = Instant::now();
        match self.complete_within_deadline(&prompt).await {
            Ok(response) => {
                debug!(
                    elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                    grounding = response.grounding.len(),
                    "Oracle responded"
                );
                parse_decision(&response.text, response.grounding)
            }
            Err(e) => {
                warn!(error = %e, "Oracle call failed, substituting fallback");
                fallback_decision()
            }
        }
    }
}
