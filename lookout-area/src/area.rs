//! One area instance and its per-tick refresh pass.
//!
//! The game hands us, every tick, the local player and a list of raw entity
//! entries keyed by the game's own entity-list key. [`AreaInstance::tick`]
//! keeps one [`Entity`] per key alive across ticks so that classification
//! work is done once per entity, not once per frame.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use lookout_core::config::LookoutConfig;
use lookout_core::metrics::{spans, LookoutCounters};
use lookout_core::{
    offsets, Address, Entity, EntityId, EntitySummary, EntityType, NearbyZones, Reader,
    RefreshContext, RefreshOutcome, RemoteMemory, COUNTERS,
};

use crate::events::AreaEvent;

/// Key of an entry in the game's entity list. Stable for the lifetime of
/// the entity within one area instance, unlike its address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityKey(pub u64);

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of the game's entity list as read this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEntity {
    /// Entity-list key.
    pub key: EntityKey,
    /// Current backing address.
    pub address: Address,
    /// The game reports that the entry moved since the previous tick.
    pub address_changed: bool,
}

impl RawEntity {
    /// An entry that has not moved.
    #[must_use]
    pub fn new(key: u64, address: Address) -> Self {
        Self {
            key: EntityKey(key),
            address,
            address_changed: false,
        }
    }
}

/// Everything the driver needs from the game for one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AreaSnapshot {
    /// Hash identifying the current area instance.
    pub area_hash: u64,
    /// The local player, once the game has spawned it.
    pub player: Option<RawEntity>,
    /// Every other entity in network range.
    pub entities: Vec<RawEntity>,
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickReport {
    /// Tick number within the area, starting at 1.
    pub tick: u64,
    /// Entities refreshed, player included.
    pub refreshed: usize,
    /// Refreshes that ended classified.
    pub classified: usize,
    /// Refreshes deferred to a later tick.
    pub retried: usize,
    /// Refreshes of terminal entities.
    pub terminal: usize,
    /// Entities flagged invalid by the game.
    pub invalid: usize,
    /// Entities dropped from the table.
    pub pruned: usize,
    /// Per-entity changes, in processing order.
    pub events: Vec<AreaEvent>,
}

impl TickReport {
    fn count(&mut self, outcome: RefreshOutcome) {
        self.refreshed += 1;
        match outcome {
            RefreshOutcome::Classified => self.classified += 1,
            RefreshOutcome::Retry => self.retried += 1,
            RefreshOutcome::Terminal => self.terminal += 1,
            RefreshOutcome::Invalid => self.invalid += 1,
            RefreshOutcome::Skipped => {}
        }
    }
}

/// The entity table of one area instance.
pub struct AreaInstance {
    area_hash: u64,
    memory: Arc<dyn RemoteMemory>,
    player_key: Option<EntityKey>,
    player: Option<Entity>,
    entities: BTreeMap<EntityKey, Entity>,
    ticks: u64,
}

impl AreaInstance {
    /// An empty instance reading from `memory`.
    #[must_use]
    pub fn new(area_hash: u64, memory: Arc<dyn RemoteMemory>) -> Self {
        Self {
            area_hash,
            memory,
            player_key: None,
            player: None,
            entities: BTreeMap::new(),
            ticks: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Refresh the player, then every listed entity, then recompute zones and
    /// prune entities that left the list for good.
    pub fn tick(&mut self, config: &LookoutConfig, snapshot: &AreaSnapshot) -> TickReport {
        self.ticks += 1;
        let _span = tracing::debug_span!(spans::AREA_TICK, area = self.area_hash, tick = self.ticks).entered();
        let mut report = TickReport {
            tick: self.ticks,
            ..TickReport::default()
        };
        if !config.general.enabled {
            return report;
        }

        let local_player_id = snapshot
            .player
            .as_ref()
            .and_then(|raw| self.read_id(raw.address, config));
        if let Some(raw) = &snapshot.player {
            self.refresh_player(raw, config, local_player_id, &mut report);
        }

        let mut seen = HashSet::with_capacity(snapshot.entities.len());
        for raw in &snapshot.entities {
            if self.player_key == Some(raw.key) {
                continue;
            }
            seen.insert(raw.key);
            let entity = match self.entities.entry(raw.key) {
                Entry::Occupied(slot) => {
                    let entity = slot.into_mut();
                    entity.relocate(raw.address);
                    entity
                }
                Entry::Vacant(slot) => {
                    report.events.push(AreaEvent::Appeared { key: raw.key });
                    slot.insert(Entity::new(raw.address, self.memory.clone(), config))
                }
            };
            let ctx = RefreshContext {
                config,
                local_player_id,
                address_changed: raw.address_changed,
            };
            refresh_one(raw.key, entity, &ctx, &mut report);

            if let Some(player) = &self.player {
                let before = entity.zones();
                entity.update_zones(player, &config.zones);
                let after = entity.zones();
                if before != after {
                    report.events.push(AreaEvent::ZonesChanged {
                        key: raw.key,
                        from: before,
                        to: after,
                    });
                }
            }
        }

        self.prune(&seen, &mut report);
        debug!(
            area = self.area_hash,
            tick = self.ticks,
            refreshed = report.refreshed,
            pruned = report.pruned,
            events = report.events.len(),
            "area tick complete"
        );
        report
    }

    fn read_id(&self, address: Address, config: &LookoutConfig) -> Option<EntityId> {
        Reader::new(self.memory.as_ref(), config.limits)
            .read_u32(address.offset(offsets::entity::ID))
            .ok()
            .map(EntityId)
    }

    fn refresh_player(
        &mut self,
        raw: &RawEntity,
        config: &LookoutConfig,
        local_player_id: Option<EntityId>,
        report: &mut TickReport,
    ) {
        if self.player_key != Some(raw.key) {
            debug!(key = %raw.key, address = %raw.address, "local player spawned");
            self.player_key = Some(raw.key);
            self.player = Some(Entity::new(raw.address, self.memory.clone(), config));
            self.entities.remove(&raw.key);
            report.events.push(AreaEvent::Appeared { key: raw.key });
        }
        let Some(player) = self.player.as_mut() else {
            return;
        };
        player.relocate(raw.address);
        let ctx = RefreshContext {
            config,
            local_player_id,
            address_changed: raw.address_changed,
        };
        refresh_one(raw.key, player, &ctx, report);
    }

    /// Invalidate entities missing from this tick's list and drop those the
    /// game may have removed.
    fn prune(&mut self, seen: &HashSet<EntityKey>, report: &mut TickReport) {
        let mut dropped = Vec::new();
        for (key, entity) in &mut self.entities {
            if seen.contains(key) {
                continue;
            }
            entity.invalidate();
            if entity.can_be_dropped() {
                dropped.push(*key);
            }
        }
        for key in dropped {
            if let Some(entity) = self.entities.remove(&key) {
                trace!(key = %key, path = entity.path(), "entity pruned");
                LookoutCounters::bump(&COUNTERS.entities_pruned);
                report.pruned += 1;
                report.events.push(AreaEvent::Removed { key });
            }
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Hash of the area this instance belongs to.
    #[must_use]
    pub fn area_hash(&self) -> u64 {
        self.area_hash
    }

    /// Ticks run so far.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// The local player.
    #[must_use]
    pub fn player(&self) -> Option<&Entity> {
        self.player.as_ref()
    }

    /// Entity by key. The player is not in the table.
    #[must_use]
    pub fn get(&self, key: EntityKey) -> Option<&Entity> {
        self.entities.get(&key)
    }

    /// Every tracked entity, in key order.
    pub fn entities(&self) -> impl Iterator<Item = (EntityKey, &Entity)> {
        self.entities.iter().map(|(k, e)| (*k, e))
    }

    /// Tracked entities, player excluded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether no entity is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities of one type.
    pub fn by_type(&self, entity_type: EntityType) -> impl Iterator<Item = &Entity> {
        self.entities
            .values()
            .filter(move |e| e.entity_type() == Some(entity_type))
    }

    /// Number of valid entities inside every zone in `zone`.
    #[must_use]
    pub fn nearby(&self, zone: NearbyZones) -> usize {
        self.entities
            .values()
            .filter(|e| e.is_valid() && !e.zones().is_empty() && e.zones().contains(zone))
            .count()
    }

    /// The whole table as JSON, for debugging dumps.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn dump_json(&self) -> serde_json::Result<String> {
        let dump = AreaDump {
            area_hash: self.area_hash,
            tick: self.ticks,
            player: self.player.as_ref().map(Entity::summary),
            entities: self
                .entities
                .iter()
                .map(|(key, e)| KeyedSummary {
                    key: *key,
                    entity: e.summary(),
                })
                .collect(),
        };
        serde_json::to_string_pretty(&dump)
    }
}

impl fmt::Debug for AreaInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AreaInstance")
            .field("area_hash", &self.area_hash)
            .field("player_key", &self.player_key)
            .field("entities", &self.entities.len())
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct AreaDump {
    area_hash: u64,
    tick: u64,
    player: Option<EntitySummary>,
    entities: Vec<KeyedSummary>,
}

#[derive(Serialize)]
struct KeyedSummary {
    key: EntityKey,
    entity: EntitySummary,
}

/// Refresh one entity and record what changed.
fn refresh_one(key: EntityKey, entity: &mut Entity, ctx: &RefreshContext<'_>, report: &mut TickReport) {
    let had_subtype = entity.has_subtype();
    let state_before = entity.state();

    let outcome = entity.refresh(ctx);
    report.count(outcome);

    if let (false, true, Some(entity_type)) = (had_subtype, entity.has_subtype(), entity.entity_type()) {
        report.events.push(AreaEvent::Classified {
            key,
            id: entity.id(),
            path: entity.path().to_string(),
            entity_type,
            subtype: entity.subtype(),
        });
    }
    if entity.state() != state_before {
        report.events.push(AreaEvent::StateChanged {
            key,
            from: state_before,
            to: entity.state(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookout_core::memory::{ComponentSpec, EntitySpec, WrittenEntity};
    use lookout_core::{EntityState, EntitySubtype, SnapshotMemory, WorldPosition, WORLD_TO_GRID};

    fn render_at(x: f32) -> ComponentSpec {
        ComponentSpec::Render(WorldPosition {
            x: x * WORLD_TO_GRID,
            y: 0.0,
            z: 0.0,
        })
    }

    fn player_spec() -> EntitySpec {
        EntitySpec::new(1, "Metadata/Characters/Dex/Dex")
            .with(render_at(0.5))
            .with(ComponentSpec::Player("Me".into()))
            .with(ComponentSpec::Life(100))
            .with(ComponentSpec::Positioned(1))
    }

    fn barrel(id: u32, x: f32) -> EntitySpec {
        EntitySpec::new(id, "Metadata/Chests/Barrel1")
            .with(render_at(x))
            .with(ComponentSpec::Chest {
                opened: false,
                label_visible: false,
                strongbox: false,
            })
    }

    struct Fixture {
        mem: Arc<SnapshotMemory>,
        config: LookoutConfig,
        area: AreaInstance,
        player: WrittenEntity,
    }

    impl Fixture {
        fn new() -> Self {
            let mem = Arc::new(SnapshotMemory::new());
            let player = player_spec().write(&mem);
            Self {
                area: AreaInstance::new(0xA1, mem.clone()),
                mem,
                config: LookoutConfig::default(),
                player,
            }
        }

        fn snapshot(&self, entities: &[(u64, &WrittenEntity)]) -> AreaSnapshot {
            AreaSnapshot {
                area_hash: 0xA1,
                player: Some(RawEntity::new(1, self.player.address)),
                entities: entities
                    .iter()
                    .map(|(key, w)| RawEntity::new(*key, w.address))
                    .collect(),
            }
        }
    }

    #[test]
    fn player_is_refreshed_as_self() {
        let mut fx = Fixture::new();
        let snapshot = fx.snapshot(&[]);
        let report = fx.area.tick(&fx.config, &snapshot);
        let player = fx.area.player().expect("player");
        assert_eq!(player.subtype(), EntitySubtype::PlayerSelf);
        assert_eq!(report.refreshed, 1);
        assert!(fx.area.is_empty());
    }

    #[test]
    fn zones_follow_the_player() {
        let mut fx = Fixture::new();
        let near = barrel(10, 5.5).write(&fx.mem);
        let mid = barrel(11, 45.5).write(&fx.mem);
        let far = barrel(12, 90.5).write(&fx.mem);
        let snapshot = fx.snapshot(&[(10, &near), (11, &mid), (12, &far)]);
        let report = fx.area.tick(&fx.config, &snapshot);

        assert_eq!(fx.area.len(), 3);
        assert_eq!(report.classified, 4);
        assert_eq!(fx.area.get(EntityKey(10)).map(Entity::zones), Some(NearbyZones::all()));
        assert_eq!(fx.area.get(EntityKey(11)).map(Entity::zones), Some(NearbyZones::OUTER));
        assert_eq!(fx.area.get(EntityKey(12)).map(Entity::zones), Some(NearbyZones::empty()));
        assert_eq!(fx.area.nearby(NearbyZones::INNER), 1);
        assert_eq!(fx.area.nearby(NearbyZones::OUTER), 2);
        assert_eq!(fx.area.by_type(EntityType::Chest).count(), 3);
    }

    #[test]
    fn first_tick_emits_appear_and_classify_events() {
        let mut fx = Fixture::new();
        let chest = barrel(10, 5.5).write(&fx.mem);
        let report = fx.area.tick(&fx.config, &fx.snapshot(&[(10, &chest)]));
        let for_chest: Vec<_> = report.events.iter().filter(|e| e.key() == EntityKey(10)).collect();
        assert!(matches!(for_chest[0], AreaEvent::Appeared { .. }));
        assert!(matches!(
            for_chest[1],
            AreaEvent::Classified {
                entity_type: EntityType::Chest,
                ..
            }
        ));

        let again = fx.area.tick(&fx.config, &fx.snapshot(&[(10, &chest)]));
        assert!(again.events.is_empty());
    }

    #[test]
    fn missing_chest_is_kept_but_invalid() {
        let mut fx = Fixture::new();
        let chest = barrel(10, 5.5).write(&fx.mem);
        fx.area.tick(&fx.config, &fx.snapshot(&[(10, &chest)]));
        let report = fx.area.tick(&fx.config, &fx.snapshot(&[]));

        assert_eq!(report.pruned, 0);
        let kept = fx.area.get(EntityKey(10)).expect("chest stays");
        assert!(!kept.is_valid());
        assert_eq!(kept.zones(), NearbyZones::empty());
        assert_eq!(fx.area.nearby(NearbyZones::OUTER), 0);

        // It comes back when it is in range again.
        fx.area.tick(&fx.config, &fx.snapshot(&[(10, &chest)]));
        assert!(fx.area.get(EntityKey(10)).is_some_and(Entity::is_valid));
    }

    #[test]
    fn missing_monster_is_pruned() {
        let mut fx = Fixture::new();
        let rat = EntitySpec::new(20, "Metadata/Monsters/Rat/Rat")
            .with(render_at(3.5))
            .with(ComponentSpec::Life(10))
            .with(ComponentSpec::Positioned(0))
            .with(ComponentSpec::ObjectMagicProperties {
                rarity: lookout_core::Rarity::Normal,
                mods: vec![],
                mod_stats: vec![],
            })
            .with(ComponentSpec::Stats(vec![]))
            .with(ComponentSpec::Buffs(vec![]))
            .write(&fx.mem);
        fx.area.tick(&fx.config, &fx.snapshot(&[(20, &rat)]));
        assert_eq!(fx.area.by_type(EntityType::Monster).count(), 1);

        let report = fx.area.tick(&fx.config, &fx.snapshot(&[]));
        assert_eq!(report.pruned, 1);
        assert_eq!(report.events, vec![AreaEvent::Removed { key: EntityKey(20) }]);
        assert!(fx.area.get(EntityKey(20)).is_none());
    }

    #[test]
    fn state_change_is_reported() {
        let mut fx = Fixture::new();
        let chest = barrel(10, 5.5).write(&fx.mem);
        fx.area.tick(&fx.config, &fx.snapshot(&[(10, &chest)]));
        chest.update(
            &fx.mem,
            &ComponentSpec::Chest {
                opened: true,
                label_visible: false,
                strongbox: false,
            },
        );
        let report = fx.area.tick(&fx.config, &fx.snapshot(&[(10, &chest)]));
        assert!(report.events.contains(&AreaEvent::StateChanged {
            key: EntityKey(10),
            from: EntityState::None,
            to: EntityState::Useless,
        }));
        assert!(report.events.contains(&AreaEvent::ZonesChanged {
            key: EntityKey(10),
            from: NearbyZones::all(),
            to: NearbyZones::empty(),
        }));
    }

    #[test]
    fn disabled_config_does_nothing() {
        let mut fx = Fixture::new();
        fx.config.general.enabled = false;
        let chest = barrel(10, 5.5).write(&fx.mem);
        let report = fx.area.tick(&fx.config, &fx.snapshot(&[(10, &chest)]));
        assert_eq!(report.refreshed, 0);
        assert!(fx.area.is_empty());
        assert!(fx.area.player().is_none());
    }

    #[test]
    fn dump_lists_every_entity() {
        let mut fx = Fixture::new();
        let chest = barrel(10, 5.5).write(&fx.mem);
        fx.area.tick(&fx.config, &fx.snapshot(&[(10, &chest)]));
        let dump: serde_json::Value = serde_json::from_str(&fx.area.dump_json().expect("dump")).expect("json");
        assert_eq!(dump["area_hash"], 0xA1);
        assert_eq!(dump["entities"][0]["key"], 10);
        assert_eq!(dump["entities"][0]["entity"]["entity_type"], "Chest");
        assert_eq!(dump["player"]["subtype"], "PlayerSelf");
    }
}
