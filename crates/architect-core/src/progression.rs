//! Progression metrics, derived from cumulative placements.

use architect_types::{ProgressionStats, WorldObjectType};

/// Placements of this type count toward `structures_completed`.
pub const PRIMARY_STRUCTURE: WorldObjectType = WorldObjectType::ModularUnit;

/// Placements per complexity tier.
pub const BLOCKS_PER_TIER: u64 = 5;

/// Tier for a given all-time placement count: 1 for 0-4, 2 for 5-9, and so on.
pub fn complexity_level_for(total_blocks: u64) -> u32 {
    let tier = total_blocks.div_euclid(BLOCKS_PER_TIER).saturating_add(1);
    u32::try_from(tier).unwrap_or(u32::MAX)
}

/// Stats after one more successful placement of `object_type`.
///
/// Blueprints pass through untouched.
pub fn update(stats: &ProgressionStats, object_type: WorldObjectType) -> ProgressionStats {
    let total_blocks = stats.total_blocks.saturating_add(1);
    let structures_completed = if object_type == PRIMARY_STRUCTURE {
        stats.structures_completed.saturating_add(1)
    } else {
        stats.structures_completed
    };
    ProgressionStats {
        complexity_level: complexity_level_for(total_blocks),
        total_blocks,
        structures_completed,
        unlocked_blueprints: stats.unlocked_blueprints.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_step_every_five_blocks() {
        for total in 0..5 {
            assert_eq!(complexity_level_for(total), 1);
        }
        for total in 5..10 {
            assert_eq!(complexity_level_for(total), 2);
        }
        assert_eq!(complexity_level_for(10), 3);
        assert_eq!(complexity_level_for(14), 3);
        assert_eq!(complexity_level_for(15), 4);
    }

    #[test]
    fn tier_is_non_decreasing() {
        let mut previous = complexity_level_for(0);
        for total in 1..200 {
            let level = complexity_level_for(total);
            assert!(level >= previous);
            previous = level;
        }
    }

    #[test]
    fn primary_structure_counts_toward_structures() {
        let stats = ProgressionStats::default();
        let stats = update(&stats, WorldObjectType::ModularUnit);
        let stats = update(&stats, WorldObjectType::SolarPanel);
        assert_eq!(stats.total_blocks, 2);
        assert_eq!(stats.structures_completed, 1);
        assert_eq!(stats.complexity_level, 1);
    }

    #[test]
    fn fifth_placement_reaches_tier_two() {
        let mut stats = ProgressionStats::default();
        for _ in 0..5 {
            stats = update(&stats, WorldObjectType::Wall);
        }
        assert_eq!(stats.total_blocks, 5);
        assert_eq!(stats.complexity_level, 2);
        assert_eq!(stats.structures_completed, 0);
    }

    #[test]
    fn blueprints_pass_through() {
        let mut stats = ProgressionStats::default();
        stats.unlocked_blueprints.push(String::from("Vertical Farming"));
        let next = update(&stats, WorldObjectType::Crop);
        assert_eq!(next.unlocked_blueprints, stats.unlocked_blueprints);
    }

    #[test]
    fn counters_saturate() {
        let stats = ProgressionStats {
            total_blocks: u64::MAX,
            ..ProgressionStats::default()
        };
        let next = update(&stats, WorldObjectType::Wall);
        assert_eq!(next.total_blocks, u64::MAX);
    }
}
