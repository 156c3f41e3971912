//! Ground elevation.
//!
//! Every placement and relocation target has its vertical coordinate replaced
//! by the terrain height at its horizontal coordinates.

use architect_types::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Maps a ground coordinate to an elevation.
///
/// Implementations must be pure and deterministic: the same `(x, z)` always
/// yields the same height, with no side effects.
pub trait TerrainSampler: Send + Sync {
    /// Elevation at `(x, z)`.
    fn height(&self, x: f64, z: f64) -> f64;

    /// `position` with its vertical coordinate replaced by the local height.
    fn snap(&self, position: Vec3) -> Vec3 {
        position.with_y(self.height(position.x(), position.z()))
    }

    /// Like [`snap`](Self::snap), but rejects non-finite results.
    fn try_snap(&self, position: Vec3) -> Result<Vec3, WorldError> {
        let snapped = self.snap(position);
        if snapped.is_finite() {
            Ok(snapped)
        } else {
            Err(WorldError::NonFiniteElevation {
                x: position.x(),
                z: position.z(),
            })
        }
    }
}

/// Rolling terrain: `sin(x * frequency) * cos(z * frequency) * amplitude`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveTerrain {
    /// Spatial frequency of the undulation.
    #[serde(default = "default_frequency")]
    pub frequency: f64,
    /// Peak height above (and depth below) zero.
    #[serde(default = "default_amplitude")]
    pub amplitude: f64,
}

const fn default_frequency() -> f64 {
    0.2
}

const fn default_amplitude() -> f64 {
    1.2
}

impl WaveTerrain {
    /// Terrain with an explicit frequency and amplitude.
    pub const fn new(frequency: f64, amplitude: f64) -> Self {
        Self {
            frequency,
            amplitude,
        }
    }
}

impl Default for WaveTerrain {
    fn default() -> Self {
        Self::new(default_frequency(), default_amplitude())
    }
}

impl TerrainSampler for WaveTerrain {
    // Float math cannot panic; non-finite results are caught by `try_snap`.
    #[allow(clippy::arithmetic_side_effects)]
    fn height(&self, x: f64, z: f64) -> f64 {
        (x * self.frequency).sin() * (z * self.frequency).cos() * self.amplitude
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn origin_is_flat() {
        assert!(close(WaveTerrain::default().height(0.0, 0.0), 0.0));
    }

    #[test]
    fn matches_closed_form() {
        let terrain = WaveTerrain::default();
        let expected = (2.0_f64 * 0.2).sin() * (5.0_f64 * 0.2).cos() * 1.2;
        assert!(close(terrain.height(2.0, 5.0), expected));
    }

    #[test]
    fn deterministic_across_calls() {
        let terrain = WaveTerrain::default();
        let first = terrain.height(-7.25, 13.5);
        let second = terrain.height(-7.25, 13.5);
        assert!(close(first, second));
    }

    #[test]
    fn height_is_bounded_by_amplitude() {
        let terrain = WaveTerrain::default();
        for step in -50_i32..50 {
            let coord = f64::from(step) * 0.7;
            assert!(terrain.height(coord, -coord).abs() <= 1.2);
        }
    }

    #[test]
    fn snap_keeps_horizontal_coordinates() {
        let terrain = WaveTerrain::default();
        let snapped = terrain.snap(Vec3::new(2.0, 99.0, 5.0));
        assert!(close(snapped.x(), 2.0));
        assert!(close(snapped.z(), 5.0));
        assert!(close(snapped.y(), terrain.height(2.0, 5.0)));
    }

    #[test]
    fn try_snap_rejects_non_finite_heights() {
        struct Cliff;
        impl TerrainSampler for Cliff {
            fn height(&self, _x: f64, _z: f64) -> f64 {
                f64::INFINITY
            }
        }
        let err = Cliff.try_snap(Vec3::new(1.0, 0.0, 1.0)).unwrap_err();
        assert!(matches!(err, WorldError::NonFiniteElevation { .. }));
    }

    #[test]
    fn config_fields_default_independently() {
        let terrain: WaveTerrain = serde_yml::from_str("amplitude: 3.0").unwrap();
        assert!(close(terrain.frequency, 0.2));
        assert!(close(terrain.amplitude, 3.0));
    }
}
