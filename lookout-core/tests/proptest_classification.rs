//! Property-Based Tests for the classification pipeline.
//!
//! Uses `proptest` to check the invariants that must hold whatever the game
//! throws at us: zones nest, type and subtype never change once decided, and
//! point-of-interest filters are applied first-match.

use std::sync::Arc;

use proptest::prelude::*;

use lookout_core::config::{LookoutConfig, PoiFilter, PoiFilterKind, ZoneConfig};
use lookout_core::memory::{ComponentSpec, EntitySpec};
use lookout_core::zone::assess;
use lookout_core::{
    Entity, EntityId, GridPosition, NearbyZones, Rarity, RefreshContext, SnapshotMemory,
    WorldPosition,
};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_radii() -> impl Strategy<Value = ZoneConfig> {
    (1u32..200, 0u32..200).prop_map(|(inner, extra)| ZoneConfig {
        inner_radius: inner,
        outer_radius: inner + extra,
    })
}

const BUFFS: &[&str] = &[
    "frozen_in_time",
    "hidden_monster",
    "capture_monster_trapped",
    "legion_reward_display",
];

fn arb_buffs() -> impl Strategy<Value = Vec<String>> {
    proptest::sample::subsequence(BUFFS, 0..=BUFFS.len())
        .prop_map(|names| names.into_iter().map(ToString::to_string).collect())
}

const MONSTER_PATHS: &[&str] = &[
    "Metadata/Monsters/LegionLeague/LegionKaruiSoldier",
    "Metadata/Monsters/Beasts/Rhoa",
    "Metadata/Monsters/Zombie/Zombie",
    "Metadata/Monsters/Spirit/TormentedSmuggler",
    "Metadata/Monsters/AtlasBosses/TheShaperBoss",
];

fn monster(path: &str, buffs: Vec<String>) -> EntitySpec {
    EntitySpec::new(77, path)
        .with(ComponentSpec::Render(WorldPosition::default()))
        .with(ComponentSpec::Life(100))
        .with(ComponentSpec::Positioned(0))
        .with(ComponentSpec::ObjectMagicProperties {
            rarity: Rarity::Rare,
            mods: vec![],
            mod_stats: vec![],
        })
        .with(ComponentSpec::Stats(vec![]))
        .with(ComponentSpec::Buffs(buffs))
}

fn ctx(config: &LookoutConfig) -> RefreshContext<'_> {
    RefreshContext {
        config,
        local_player_id: Some(EntityId(1)),
        address_changed: false,
    }
}

// ---------------------------------------------------------------------------
// Property: zones nest and shrink with distance
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn inner_implies_outer(distance in 0u32..1000, radii in arb_radii()) {
        let zones = assess(distance, &radii);
        if zones.contains(NearbyZones::INNER) {
            prop_assert!(zones.contains(NearbyZones::OUTER));
        }
    }

    #[test]
    fn zones_never_grow_with_distance(a in 0u32..1000, b in 0u32..1000, radii in arb_radii()) {
        let (near, far) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(assess(near, &radii).contains(assess(far, &radii)));
    }

    #[test]
    fn grid_distance_is_symmetric(
        ax in -1.0e4f32..1.0e4, ay in -1.0e4f32..1.0e4,
        bx in -1.0e4f32..1.0e4, by in -1.0e4f32..1.0e4,
    ) {
        let a = GridPosition::new(ax, ay);
        let b = GridPosition::new(bx, by);
        prop_assert_eq!(a.distance(b), b.distance(a));
        prop_assert_eq!(a.distance(a), 0);
    }
}

// ---------------------------------------------------------------------------
// Property: type and subtype are sticky
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn type_and_subtype_never_change(
        path in proptest::sample::select(MONSTER_PATHS),
        first in arb_buffs(),
        later in proptest::collection::vec(arb_buffs(), 1..8),
    ) {
        let mem = Arc::new(SnapshotMemory::new());
        let config = LookoutConfig::default();
        let written = monster(path, first).write(&mem);
        let mut entity = Entity::new(written.address, mem.clone(), &config);
        entity.refresh(&ctx(&config));
        let entity_type = entity.entity_type();
        let subtype = entity.subtype();
        prop_assert!(entity_type.is_some());

        for buffs in later {
            written.update(&mem, &ComponentSpec::Buffs(buffs));
            entity.refresh(&ctx(&config));
            prop_assert_eq!(entity.entity_type(), entity_type);
            prop_assert_eq!(entity.subtype(), subtype);
        }
    }

    #[test]
    fn terminal_state_is_final(
        path in proptest::sample::select(MONSTER_PATHS),
        later in proptest::collection::vec(arb_buffs(), 1..8),
    ) {
        let mem = Arc::new(SnapshotMemory::new());
        let config = LookoutConfig::default();
        let written = monster(path, vec![]).write(&mem);
        let mut entity = Entity::new(written.address, mem.clone(), &config);
        entity.refresh(&ctx(&config));
        written.update(&mem, &ComponentSpec::Life(0));
        entity.refresh(&ctx(&config));
        let terminal = entity.state();
        prop_assert!(terminal.is_terminal());

        written.update(&mem, &ComponentSpec::Life(100));
        for buffs in later {
            written.update(&mem, &ComponentSpec::Buffs(buffs));
            entity.refresh(&ctx(&config));
            prop_assert_eq!(entity.state(), terminal);
        }
    }
}

// ---------------------------------------------------------------------------
// Property: the first matching point-of-interest filter wins
// ---------------------------------------------------------------------------

const PREFIXES: &[&str] = &[
    "Metadata/",
    "Metadata/Monsters/",
    "Metadata/Monsters/Zombie/",
    "Metadata/Monsters/Beasts/",
    "Metadata/Chests/",
];

fn arb_filters() -> impl Strategy<Value = Vec<PoiFilter>> {
    proptest::collection::vec((proptest::sample::select(PREFIXES), 1i32..100), 0..6).prop_map(|raw| {
        raw.into_iter()
            .map(|(prefix, group)| PoiFilter {
                kind: PoiFilterKind::Path,
                value: prefix.to_string(),
                rarity: None,
                stat: None,
                group,
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn first_matching_filter_decides_the_group(filters in arb_filters()) {
        let path = "Metadata/Monsters/Zombie/Zombie";
        let expected = filters
            .iter()
            .find(|f| path.starts_with(f.value.as_str()))
            .map(|f| f.group);

        let mut config = LookoutConfig::default();
        config.classifier.poi_filters = filters;
        let mem = Arc::new(SnapshotMemory::new());
        let written = monster(path, vec![]).write(&mem);
        let mut entity = Entity::new(written.address, mem.clone(), &config);
        entity.refresh(&ctx(&config));

        prop_assert_eq!(entity.custom_group(), expected.unwrap_or(0));
        prop_assert_eq!(entity.original_subtype(), lookout_core::EntitySubtype::None);
        if expected.is_some() {
            prop_assert_eq!(entity.subtype(), lookout_core::EntitySubtype::PoiMonster);
        }
    }
}
