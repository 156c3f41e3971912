//! Terrain and spatial perception for the Architect simulation.
//!
//! The world itself is just the ordered list of placed objects held in
//! [`SimulationState`]. This crate supplies the two read-only views the
//! orchestrator and the oracle adapter need over it: ground elevation and a
//! local spatial digest around the latest placement.
//!
//! # Modules
//!
//! - [`terrain`] -- The [`TerrainSampler`] contract and the default wave terrain.
//! - [`digest`] -- Elevation grid and proximity scan around the build origin.
//! - [`error`] -- Error types for terrain snapping.
//!
//! [`SimulationState`]: architect_types::SimulationState

pub mod digest;
pub mod error;
pub mod terrain;

pub use digest::{ElevationSample, NearbyObject, SCAN_RADIUS, SpatialDigest};
pub use error::WorldError;
pub use terrain::{TerrainSampler, WaveTerrain};
