//! Engine binary for the Architect simulation.
//!
//! # Startup Sequence
//!
//! 1. Load `architect-config.yaml` (defaults when absent)
//! 2. Initialize structured logging (tracing)
//! 3. Configure the decision oracle from the environment
//! 4. Restore the session snapshot from `Dragonfly`, if reachable
//! 5. Start the Observer API server
//! 6. Run the tick loop until the operator or `Ctrl-C` stops it

mod error;
mod oracle_source;
mod persistence;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use architect_core::config::LoggingConfig;
use architect_core::operator::{OperatorState, RunMode};
use architect_core::{
    ArchitectConfig, SystemClock, TimeSource, TurnOrchestrator, bootstrap_state, run_autonomous,
};
use architect_db::{DragonflyPool, SessionStore};
use architect_observer::{AppState, ServerConfig};
use architect_types::SimulationState;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::oracle_source::EngineOracle;
use crate::persistence::SessionPersister;

/// Configuration file, relative to the working directory.
const CONFIG_PATH: &str = "architect-config.yaml";

/// How long to wait for `Dragonfly` before running without persistence.
const DRAGONFLY_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or the observer
/// server fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let config_path = Path::new(CONFIG_PATH);
    let config_found = config_path.exists();
    let config = if config_found {
        ArchitectConfig::from_file(config_path)?
    } else {
        let mut config = ArchitectConfig::default();
        config.infrastructure.apply_env_overrides();
        config
    };

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!(config_found, "architect-engine starting");
    info!(
        goal = config.simulation.goal,
        autonomous = config.simulation.autonomous,
        tick_interval_ms = config.simulation.tick_interval_ms,
        recent_log_window = config.simulation.recent_log_window,
        "Configuration loaded"
    );

    // 3. Decision oracle.
    let oracle = EngineOracle::from_env();
    oracle.log_mode();
    let llm = oracle.llm();

    // 4. Session restore.
    let clock: Arc<dyn TimeSource> = Arc::new(SystemClock);
    let store = connect_session_store(
        &config.infrastructure.dragonfly_url,
        &config.infrastructure.session_key,
    )
    .await;
    let initial = initial_state(store.as_ref(), &config.simulation.goal, clock.now()).await;

    // 5. Orchestrator and observer state.
    let mode = if config.simulation.autonomous {
        RunMode::Autonomous
    } else {
        RunMode::Manual
    };
    let operator = Arc::new(OperatorState::new(mode, config.simulation.tick_interval_ms));

    let orchestrator = TurnOrchestrator::new(oracle, initial, Arc::clone(&operator))
        .with_terrain(Arc::new(config.terrain))
        .with_clock(Arc::clone(&clock))
        .with_pacing(config.pacing)
        .with_recent_log_window(config.simulation.recent_log_window);

    let mut app_state = AppState::new(orchestrator.shared_state()).with_operator(Arc::clone(&operator));
    if let Some(llm) = llm {
        app_state = app_state.with_oracle(llm);
    }
    let app_state = Arc::new(app_state);

    let observer_callback: Arc<AppState> = Arc::clone(&app_state);
    let mut orchestrator = orchestrator.with_callback(observer_callback);
    let mut session_writer = None;
    if let Some(store) = store {
        let (persister, writer) = SessionPersister::spawn(store, Arc::clone(&clock));
        orchestrator = orchestrator.with_callback(Arc::new(persister));
        session_writer = Some(writer);
    }

    // 6. Observer server, stopped together with the loop.
    let server_config = ServerConfig {
        port: config.infrastructure.observer_port,
        ..ServerConfig::default()
    };
    let server = {
        let operator = Arc::clone(&operator);
        tokio::spawn(async move {
            architect_observer::start_server(&server_config, app_state, async move {
                operator.stopped().await;
            })
            .await
        })
    };

    // Ctrl-C requests the same clean stop as the operator API.
    {
        let operator = Arc::clone(&operator);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl-C received, stopping");
                operator.request_stop();
            }
        });
    }

    // 7. Run the loop.
    let summary = run_autonomous(&orchestrator).await;

    // The loop can also end on its own; make sure the server follows.
    operator.request_stop();
    server
        .await
        .map_err(|e| EngineError::Join {
            message: e.to_string(),
        })??;

    // Dropping the orchestrator releases the persister; the writer then
    // flushes the last snapshot and exits.
    drop(orchestrator);
    if let Some(writer) = session_writer {
        writer.await.map_err(|e| EngineError::Join {
            message: e.to_string(),
        })?;
    }

    info!(
        completed = summary.completed,
        failed = summary.failed,
        "architect-engine shutdown complete"
    );
    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Open the session store, or `None` when `Dragonfly` is unreachable.
async fn connect_session_store(url: &str, session_key: &str) -> Option<SessionStore> {
    match tokio::time::timeout(DRAGONFLY_CONNECT_TIMEOUT, DragonflyPool::connect(url)).await {
        Ok(Ok(pool)) => {
            info!(session_key, "Session persistence enabled");
            Some(SessionStore::new(pool, session_key))
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Dragonfly unavailable, running without persistence");
            None
        }
        Err(_elapsed) => {
            warn!(
                timeout_ms = DRAGONFLY_CONNECT_TIMEOUT.as_millis(),
                "Dragonfly connect timed out, running without persistence"
            );
            None
        }
    }
}

/// The saved session when there is one, otherwise a fresh world.
async fn initial_state(
    store: Option<&SessionStore>,
    goal: &str,
    now: chrono::DateTime<chrono::Utc>,
) -> SimulationState {
    let Some(store) = store else {
        return bootstrap_state(goal, now);
    };
    match store.load().await {
        Ok(Some(snapshot)) => {
            info!(
                saved_at = %snapshot.saved_at,
                ticks_settled = snapshot.state.ticks_settled,
                objects = snapshot.state.objects.len(),
                knowledge = snapshot.state.knowledge.len(),
                "Session restored"
            );
            snapshot.state
        }
        Ok(None) => {
            info!("No saved session, starting fresh");
            bootstrap_state(goal, now)
        }
        Err(e) => {
            warn!(error = %e, "Session restore failed, starting fresh");
            bootstrap_state(goal, now)
        }
    }
}
