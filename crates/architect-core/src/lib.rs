//! Turn orchestration and state machines for the Architect simulation.
//!
//! This crate owns the tick: a single-flight cycle that consults a decision
//! oracle, streams its reasoning into the log, and commits a placement
//! atomically.
//!
//! # Modules
//!
//! - [`clock`] -- Injectable wall-clock source.
//! - [`config`] -- Configuration loading from `architect-config.yaml`.
//! - [`guard`] -- The single-flight tick guard.
//! - [`knowledge`] -- Title-deduplicated knowledge ledger.
//! - [`operator`] -- Runtime controls shared with the operator API.
//! - [`oracle`] -- [`DecisionOracle`] trait, fallback, and offline oracles.
//! - [`plan`] -- Construction plan state machine.
//! - [`progression`] -- Complexity tiers and structure counts.
//! - [`runner`] -- The autonomous loop and tick callbacks.
//! - [`tick`] -- [`TurnOrchestrator`] and the placement commit.
//!
//! [`DecisionOracle`]: oracle::DecisionOracle
//! [`TurnOrchestrator`]: tick::TurnOrchestrator

pub mod clock;
pub mod config;
pub mod guard;
pub mod knowledge;
pub mod operator;
pub mod oracle;
pub mod plan;
pub mod progression;
pub mod runner;
pub mod tick;

pub use clock::{FixedClock, SystemClock, TimeSource};
pub use config::{ArchitectConfig, ConfigError};
pub use guard::{TickGuard, TickPhase};
pub use operator::{OperatorState, OperatorStatus, RunMode};
pub use oracle::{DecisionOracle, OracleContext, ScriptedOracle, StubOracle, fallback_decision};
pub use plan::{PlanError, PlanTransition};
pub use runner::{RunSummary, TickCallback, run_autonomous};
pub use tick::{TickError, TickOutcome, TickReport, TurnOrchestrator, bootstrap_state};
