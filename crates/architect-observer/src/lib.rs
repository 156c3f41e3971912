//! Observer API server for the Architect simulation.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/stream`) pushing log lines and tick
//!   summaries via [`tokio::sync::broadcast`]
//! - **REST endpoints** for reading simulation state (objects, plan,
//!   knowledge, logs, progression) and a raw oracle pass-through
//! - **Operator REST endpoints** for runtime control
//! - **Minimal HTML status page** (`GET /`)
//!
//! # Architecture
//!
//! [`AppState`] holds a read handle on the orchestrator's live state and
//! is registered with the orchestrator as its tick callback, so the
//! broadcast channel sees every log line the moment it is appended.

pub mod error;
pub mod handlers;
pub mod operator;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use error::ObserverError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::{AppState, StreamMessage, TickBroadcast};
