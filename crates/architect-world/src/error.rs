//! Error types for the `architect-world` crate.

/// Errors that can occur while snapping positions to the terrain.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorldError {
    /// The sampler produced a height that is not a finite number.
    #[error("terrain height at ({x}, {z}) is not finite")]
    NonFiniteElevation {
        /// East-west coordinate that was sampled.
        x: f64,
        /// North-south coordinate that was sampled.
        z: f64,
    },
}
