//! Session persistence for the Architect simulation.
//!
//! `Dragonfly` keeps the latest snapshot of each session so a restarted
//! engine resumes where it left off.
//!
//! # Modules
//!
//! - [`dragonfly`] -- connection handle and JSON get/set/delete
//! - [`session`] -- whole-state session snapshots
//! - [`error`] -- shared error type

pub mod dragonfly;
pub mod error;
pub mod session;

pub use dragonfly::DragonflyPool;
pub use error::DbError;
pub use session::{SessionSnapshot, SessionStore, session_key};
