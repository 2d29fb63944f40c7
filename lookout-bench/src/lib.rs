//! Shared fixtures for the Lookout benchmarks.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]

use lookout_core::memory::{ComponentSpec, EntitySpec};
use lookout_core::{Rarity, WorldPosition, WORLD_TO_GRID};

/// Monster paths the fixtures cycle through, one per classification branch.
pub const MONSTER_PATHS: &[&str] = &[
    "Metadata/Monsters/Zombie/Zombie",
    "Metadata/Monsters/LegionLeague/LegionKaruiSoldier",
    "Metadata/Monsters/Spirit/TormentedSmuggler",
    "Metadata/Monsters/Beasts/Rhoa",
    "Metadata/Monsters/MavenBoss/TheMavenMap",
];

/// A hostile monster `x` grid cells east of the origin.
#[must_use]
pub fn monster(id: u32, x: f32) -> EntitySpec {
    let path = MONSTER_PATHS[id as usize % MONSTER_PATHS.len()];
    EntitySpec::new(id, path)
        .with(ComponentSpec::Render(WorldPosition {
            x: x * WORLD_TO_GRID,
            y: 0.0,
            z: 0.0,
        }))
        .with(ComponentSpec::Life(100))
        .with(ComponentSpec::Positioned(0))
        .with(ComponentSpec::ObjectMagicProperties {
            rarity: Rarity::Magic,
            mods: vec!["MonsterSplits".into()],
            mod_stats: vec![],
        })
        .with(ComponentSpec::Stats(vec![]))
        .with(ComponentSpec::Buffs(vec!["frozen_in_time".into()]))
        .with(ComponentSpec::Opaque("Mods".into()))
        .with(ComponentSpec::Opaque("Pathfinding".into()))
}

/// A closed chest `x` grid cells east of the origin.
#[must_use]
pub fn chest(id: u32, x: f32) -> EntitySpec {
    EntitySpec::new(id, "Metadata/Chests/Barrel1")
        .with(ComponentSpec::Render(WorldPosition {
            x: x * WORLD_TO_GRID,
            y: 0.0,
            z: 0.0,
        }))
        .with(ComponentSpec::Chest {
            opened: false,
            label_visible: id % 2 == 0,
            strongbox: false,
        })
}

/// The local player at the origin.
#[must_use]
pub fn player() -> EntitySpec {
    EntitySpec::new(1, "Metadata/Characters/Int/Int")
        .with(ComponentSpec::Render(WorldPosition::default()))
        .with(ComponentSpec::Player("Bench".into()))
        .with(ComponentSpec::Life(100))
        .with(ComponentSpec::Positioned(1))
}
