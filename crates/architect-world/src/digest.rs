//! Local spatial digest around the build origin.
//!
//! The oracle never sees the full world. Each tick it receives a 5x5
//! elevation grid centred on the most recent placement (or the origin) and a
//! list of objects within [`SCAN_RADIUS`] of that point.

use architect_types::{Vec3, WorldObject, WorldObjectType};
use serde::Serialize;

use crate::terrain::TerrainSampler;

/// Horizontal radius of the proximity scan. Objects exactly on the boundary
/// are excluded.
pub const SCAN_RADIUS: f64 = 15.0;

/// Offsets, on each horizontal axis, of the elevation grid around the origin.
const GRID_OFFSETS: [f64; 5] = [-6.0, -3.0, 0.0, 3.0, 6.0];

/// One elevation reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElevationSample {
    /// East-west coordinate.
    pub x: f64,
    /// North-south coordinate.
    pub z: f64,
    /// Terrain height at `(x, z)`.
    pub height: f64,
}

/// An object found by the proximity scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NearbyObject {
    /// What it is.
    pub object_type: WorldObjectType,
    /// Where it stands.
    pub position: Vec3,
    /// Horizontal distance from the digest origin.
    pub distance: f64,
}

/// Elevation grid plus proximity scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpatialDigest {
    /// Centre of the digest.
    pub origin: Vec3,
    /// 25 samples, `x` offsets outer, `z` offsets inner.
    pub elevation: Vec<ElevationSample>,
    /// Objects strictly within [`SCAN_RADIUS`], in placement order.
    pub nearby: Vec<NearbyObject>,
}

impl SpatialDigest {
    /// Build the digest for `objects` as currently placed.
    #[allow(clippy::arithmetic_side_effects)]
    pub fn scan(objects: &[WorldObject], terrain: &dyn TerrainSampler) -> Self {
        let origin = objects.last().map_or(Vec3::ORIGIN, |o| o.position);

        let elevation = GRID_OFFSETS
            .iter()
            .flat_map(|dx| GRID_OFFSETS.iter().map(move |dz| (*dx, *dz)))
            .map(|(dx, dz)| {
                let x = origin.x() + dx;
                let z = origin.z() + dz;
                ElevationSample {
                    x,
                    z,
                    height: terrain.height(x, z),
                }
            })
            .collect();

        let nearby = objects
            .iter()
            .filter_map(|object| {
                let distance = object.position.horizontal_distance(origin);
                (distance < SCAN_RADIUS).then_some(NearbyObject {
                    object_type: object.object_type,
                    position: object.position,
                    distance,
                })
            })
            .collect();

        Self {
            origin,
            elevation,
            nearby,
        }
    }

    /// Elevation grid as a single prompt line.
    ///
    /// Each sample renders as `[x, z]: elev=h` with one decimal on the
    /// coordinates and two on the height.
    pub fn elevation_report(&self) -> String {
        self.elevation
            .iter()
            .map(|s| format!("[{:.1}, {:.1}]: elev={:.2}", s.x, s.z, s.height))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Proximity scan as a single prompt line, or `Sector clear.` when empty.
    pub fn scan_report(&self) -> String {
        if self.nearby.is_empty() {
            return String::from("Sector clear.");
        }
        self.nearby
            .iter()
            .map(|n| {
                format!(
                    "[{}] at {:.1},{:.1},{:.1} (dist: {:.1}m)",
                    n.object_type,
                    n.position.x(),
                    n.position.y(),
                    n.position.z(),
                    n.distance
                )
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use architect_types::WorldObjectId;
    use chrono::Utc;

    use super::*;
    use crate::terrain::WaveTerrain;

    fn object(kind: WorldObjectType, x: f64, z: f64) -> WorldObject {
        WorldObject {
            id: WorldObjectId::new(),
            object_type: kind,
            position: Vec3::new(x, 0.0, z),
            rotation: Vec3::ORIGIN,
            scale: Vec3::ONE,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_world_centres_on_origin() {
        let digest = SpatialDigest::scan(&[], &WaveTerrain::default());
        assert_eq!(digest.origin, Vec3::ORIGIN);
        assert_eq!(digest.elevation.len(), 25);
        assert_eq!(digest.scan_report(), "Sector clear.");

        let first = digest.elevation.first().unwrap();
        assert!((first.x + 6.0).abs() < f64::EPSILON);
        assert!((first.z + 6.0).abs() < f64::EPSILON);
        let second = digest.elevation.get(1).unwrap();
        assert!((second.x + 6.0).abs() < f64::EPSILON);
        assert!((second.z + 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn grid_follows_latest_placement() {
        let objects = vec![
            object(WorldObjectType::Wall, 0.0, 0.0),
            object(WorldObjectType::ModularUnit, 10.0, -4.0),
        ];
        let digest = SpatialDigest::scan(&objects, &WaveTerrain::default());
        assert!((digest.origin.x() - 10.0).abs() < f64::EPSILON);
        let centre = digest.elevation.get(12).unwrap();
        assert!((centre.x - 10.0).abs() < f64::EPSILON);
        assert!((centre.z + 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn scan_radius_is_exclusive() {
        let objects = vec![
            object(WorldObjectType::Tree, 15.0, 0.0),
            object(WorldObjectType::Well, 0.0, 14.9),
            object(WorldObjectType::Fence, 0.0, 0.0),
        ];
        let digest = SpatialDigest::scan(&objects, &WaveTerrain::default());
        let kinds: Vec<_> = digest.nearby.iter().map(|n| n.object_type).collect();
        assert_eq!(kinds, vec![WorldObjectType::Well, WorldObjectType::Fence]);
    }

    #[test]
    fn reports_use_fixed_precision() {
        let objects = vec![object(WorldObjectType::SolarPanel, 0.0, 0.0)];
        let digest = SpatialDigest::scan(&objects, &WaveTerrain::default());
        assert_eq!(
            digest.scan_report(),
            "[solar_panel] at 0.0,0.0,0.0 (dist: 0.0m)"
        );
        assert!(digest.elevation_report().starts_with("[-6.0, -6.0]: elev="));
        assert_eq!(digest.elevation_report().matches("elev=").count(), 25);
    }
}
