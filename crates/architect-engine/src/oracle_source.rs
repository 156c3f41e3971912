//! Choice of decision oracle for this process.
//!
//! With LLM credentials in the environment the engine talks to a model;
//! without them it runs offline and every tick resolves to the standby
//! fallback.

use std::sync::Arc;

use architect_core::{DecisionOracle, OracleContext, StubOracle};
use architect_oracle::{LlmOracle, OracleConfig};
use architect_types::Decision;
use tracing::{info, warn};

/// The oracle the orchestrator runs against.
#[derive(Debug, Clone)]
pub enum EngineOracle {
    /// A configured LLM backend, shared with the observer pass-through.
    Llm(Arc<LlmOracle>),
    /// No backend configured.
    Offline(StubOracle),
}

impl EngineOracle {
    /// Build from `LLM_*` environment variables, falling back to offline.
    pub fn from_env() -> Self {
        let config = match OracleConfig::from_env() {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "No LLM backend configured, running offline");
                return Self::Offline(StubOracle);
            }
        };
        match LlmOracle::from_config(&config) {
            Ok(oracle) => Self::Llm(Arc::new(oracle)),
            Err(e) => {
                warn!(error = %e, "Decision oracle setup failed, running offline");
                Self::Offline(StubOracle)
            }
        }
    }

    /// The LLM oracle, when one is configured.
    pub fn llm(&self) -> Option<Arc<LlmOracle>> {
        match self {
            Self::Llm(oracle) => Some(Arc::clone(oracle)),
            Self::Offline(_) => None,
        }
    }

    /// Log which oracle is active.
    pub fn log_mode(&self) {
        match self {
            Self::Llm(oracle) => info!(?oracle, "Decision oracle online"),
            Self::Offline(_) => info!("Decision oracle offline, ticks will stand by"),
        }
    }
}

impl DecisionOracle for EngineOracle {
    async fn decide(&self, context: &OracleContext<'_>) -> Decision {
        match self {
            Self::Llm(oracle) => oracle.decide(context).await,
            Self::Offline(stub) => stub.decide(context).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use architect_core::fallback_decision;
    use architect_world::WaveTerrain;

    use super::*;

    #[tokio::test]
    async fn offline_oracle_stands_by() {
        let terrain = WaveTerrain::default();
        let context = OracleContext {
            recent_logs: &[],
            objects: &[],
            goal: "goal",
            knowledge: &[],
            terrain: &terrain,
            active_plan: None,
        };
        let oracle = EngineOracle::Offline(StubOracle);
        assert!(oracle.llm().is_none());
        assert_eq!(oracle.decide(&context).await, fallback_decision());
    }
}
