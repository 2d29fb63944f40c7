//! Property-Based Tests for the area driver.
//!
//! Random populations come and go across ticks; whatever the order, every
//! listed entity is tracked, unlisted ones are either dropped or kept
//! invalid for a reason, and an area change always starts from scratch.

use std::sync::Arc;

use proptest::prelude::*;

use lookout_area::{AreaManager, AreaSnapshot, EntityKey, RawEntity};
use lookout_core::config::LookoutConfig;
use lookout_core::memory::{ComponentSpec, EntitySpec};
use lookout_core::{Address, Rarity, SnapshotMemory, WorldPosition};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Kind {
    Monster,
    FrozenLegion,
    Chest,
}

fn arb_kind() -> impl Strategy<Value = Kind> {
    prop_oneof![Just(Kind::Monster), Just(Kind::FrozenLegion), Just(Kind::Chest)]
}

fn spec(id: u32, kind: Kind) -> EntitySpec {
    let render = ComponentSpec::Render(WorldPosition {
        x: id as f32 * 20.0,
        y: 0.0,
        z: 0.0,
    });
    match kind {
        Kind::Chest => EntitySpec::new(id, "Metadata/Chests/Barrel1").with(render).with(ComponentSpec::Chest {
            opened: false,
            label_visible: false,
            strongbox: false,
        }),
        Kind::Monster | Kind::FrozenLegion => {
            let (path, buffs) = match kind {
                Kind::FrozenLegion => (
                    "Metadata/Monsters/LegionLeague/LegionKaruiSoldier",
                    vec!["frozen_in_time".to_string()],
                ),
                _ => ("Metadata/Monsters/Zombie/Zombie", vec![]),
            };
            EntitySpec::new(id, path)
                .with(render)
                .with(ComponentSpec::Life(100))
                .with(ComponentSpec::Positioned(0))
                .with(ComponentSpec::ObjectMagicProperties {
                    rarity: Rarity::Normal,
                    mods: vec![],
                    mod_stats: vec![],
                })
                .with(ComponentSpec::Stats(vec![]))
                .with(ComponentSpec::Buffs(buffs))
        }
    }
}

struct Population {
    mem: Arc<SnapshotMemory>,
    player: Address,
    entities: Vec<(u64, Address)>,
}

impl Population {
    fn new(kinds: &[Kind]) -> Self {
        let mem = Arc::new(SnapshotMemory::new());
        let player = EntitySpec::new(1, "Metadata/Characters/Dex/Dex")
            .with(ComponentSpec::Render(WorldPosition::default()))
            .with(ComponentSpec::Player("Me".into()))
            .with(ComponentSpec::Life(100))
            .with(ComponentSpec::Positioned(1))
            .write(&mem)
            .address;
        let entities = kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| {
                let id = i as u32 + 2;
                (u64::from(id), spec(id, *kind).write(&mem).address)
            })
            .collect();
        Self { mem, player, entities }
    }

    fn snapshot(&self, area_hash: u64, listed: &[bool]) -> AreaSnapshot {
        AreaSnapshot {
            area_hash,
            player: Some(RawEntity::new(1, self.player)),
            entities: self
                .entities
                .iter()
                .zip(listed)
                .filter(|(_, on)| **on)
                .map(|((key, at), _)| RawEntity::new(*key, *at))
                .collect(),
        }
    }
}

fn arb_world() -> impl Strategy<Value = (Vec<Kind>, Vec<Vec<bool>>)> {
    prop::collection::vec(arb_kind(), 1..12).prop_flat_map(|kinds| {
        let n = kinds.len();
        (
            Just(kinds),
            prop::collection::vec(prop::collection::vec(any::<bool>(), n), 1..6),
        )
    })
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Listed entities are tracked and valid; unlisted survivors are invalid
    /// and not droppable.
    #[test]
    fn listed_are_tracked_and_survivors_are_kept_for_a_reason((kinds, ticks) in arb_world()) {
        let config = LookoutConfig::default();
        let population = Population::new(&kinds);
        let mut manager = AreaManager::new(population.mem.clone(), &config);

        for listed in &ticks {
            manager.tick(&config, &population.snapshot(7, listed));
            let area = manager.current().expect("area");
            for ((key, _), on) in population.entities.iter().zip(listed) {
                let entity = area.get(EntityKey(*key));
                if *on {
                    prop_assert!(entity.is_some_and(lookout_core::Entity::is_valid));
                } else if let Some(entity) = entity {
                    prop_assert!(!entity.is_valid());
                    prop_assert!(!entity.can_be_dropped());
                }
            }
        }
    }

    /// After an area change only this tick's entities remain.
    #[test]
    fn area_change_starts_from_scratch((kinds, ticks) in arb_world(), last in prop::collection::vec(any::<bool>(), 12)) {
        let config = LookoutConfig::default();
        let population = Population::new(&kinds);
        let mut manager = AreaManager::new(population.mem.clone(), &config);
        for listed in &ticks {
            manager.tick(&config, &population.snapshot(7, listed));
        }

        let listed = &last[..kinds.len()];
        let report = manager.tick(&config, &population.snapshot(8, listed));
        prop_assert_eq!(report.tick, 1);
        let area = manager.current().expect("area");
        prop_assert_eq!(area.area_hash(), 8);
        prop_assert_eq!(area.len(), listed.iter().filter(|on| **on).count());
    }
}
