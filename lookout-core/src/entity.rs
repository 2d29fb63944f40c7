//! The local mirror of one remote entity.
//!
//! An [`Entity`] is refreshed once per tick. Refresh re-reads validity and id,
//! keeps the component registry current, and runs whichever classification
//! stages are still pending:
//!
//! - **Type** is decided once and never changes.
//! - **Subtype** is decided once. A point-of-interest filter may replace the
//!   *displayed* subtype with [`EntitySubtype::PoiMonster`]; the resolved one
//!   stays available through [`Entity::original_subtype`].
//! - **State** is re-evaluated every tick until it becomes terminal.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace};

use crate::category::{EntityState, EntitySubtype, EntityType};
use crate::classify::state::StateInput;
use crate::classify::{entity_type, state, subtype, Probe, Verdict};
use crate::components::Render;
use crate::config::{LookoutConfig, ZoneConfig};
use crate::memory::RemoteMemory;
use crate::metrics::{spans, LookoutCounters};
use crate::offsets;
use crate::registry::ComponentRegistry;
use crate::types::{Address, EntityId, GridPosition};
use crate::zone::{self, NearbyZones};
use crate::COUNTERS;

/// Inputs to one refresh that come from outside the entity.
#[derive(Debug, Clone, Copy)]
pub struct RefreshContext<'a> {
    /// Configuration snapshot for this tick.
    pub config: &'a LookoutConfig,
    /// Id of the local player, once known.
    pub local_player_id: Option<EntityId>,
    /// The entity list reports a different backing address than last tick.
    pub address_changed: bool,
}

/// What a refresh did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RefreshOutcome {
    /// Processing is disabled in config.
    Skipped,
    /// The entity is flagged invalid; nothing else was read.
    Invalid,
    /// The entity is (or just became) terminal.
    Terminal,
    /// Something needed was unreadable; try again next tick.
    Retry,
    /// Type and subtype are known and the state is current.
    Classified,
}

/// Resolved subtype plus the point-of-interest override, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SubtypeSlot {
    resolved: Option<EntitySubtype>,
    poi_group: Option<i32>,
}

impl SubtypeSlot {
    fn displayed(self) -> Option<EntitySubtype> {
        if self.poi_group.is_some() {
            Some(EntitySubtype::PoiMonster)
        } else {
            self.resolved
        }
    }
}

/// One remote entity.
#[derive(Debug)]
pub struct Entity {
    address: Address,
    path: String,
    id: EntityId,
    valid: bool,
    entity_type: Option<EntityType>,
    subtype: SubtypeSlot,
    state: EntityState,
    zones: NearbyZones,
    registry: Arc<ComponentRegistry>,
    needs_rebuild: bool,
}

impl Entity {
    /// A fresh, unclassified entity backed by `address`.
    #[must_use]
    pub fn new(address: Address, memory: Arc<dyn RemoteMemory>, config: &LookoutConfig) -> Self {
        Self {
            address,
            path: String::new(),
            id: EntityId::default(),
            valid: false,
            entity_type: None,
            subtype: SubtypeSlot::default(),
            state: EntityState::None,
            zones: NearbyZones::empty(),
            registry: Arc::new(ComponentRegistry::new(memory, config.limits)),
            needs_rebuild: true,
        }
    }

    /// Point the entity at a new backing address. The next refresh rebuilds
    /// the component registry from scratch.
    pub fn relocate(&mut self, address: Address) {
        if address != self.address {
            self.address = address;
            self.needs_rebuild = true;
        }
    }

    // -----------------------------------------------------------------------
    // Refresh
    // -----------------------------------------------------------------------

    /// Bring the entity up to date with remote memory. Never fails; the
    /// outcome is informational.
    pub fn refresh(&mut self, ctx: &RefreshContext<'_>) -> RefreshOutcome {
        if !ctx.config.general.enabled {
            return RefreshOutcome::Skipped;
        }
        let _span = tracing::trace_span!(spans::ENTITY_REFRESH, address = %self.address).entered();
        LookoutCounters::bump(&COUNTERS.entities_refreshed);

        if ctx.address_changed {
            self.needs_rebuild = true;
        }
        if !self.read_header() {
            return RefreshOutcome::Invalid;
        }
        if self.state.is_terminal() {
            return RefreshOutcome::Terminal;
        }
        if !self.refresh_registry() {
            return self.retry("component table unreadable");
        }

        let probe = Probe::new(
            &self.path,
            self.id,
            &self.registry,
            ctx.config,
            ctx.local_player_id,
        );

        let entity_type = match self.entity_type {
            Some(t) => t,
            None => match entity_type::classify(&probe) {
                Verdict::Resolved(assignment) => {
                    LookoutCounters::bump(&COUNTERS.types_resolved);
                    debug!(path = %self.path, id = %self.id, entity_type = ?assignment.entity_type, "type resolved");
                    self.entity_type = Some(assignment.entity_type);
                    if let Some(preset) = assignment.preset_subtype {
                        self.subtype.resolved = Some(preset);
                    }
                    assignment.entity_type
                }
                Verdict::Retry => return self.retry("type"),
                Verdict::Miss => {
                    self.state = EntityState::Unclassifiable;
                    self.zones = NearbyZones::empty();
                    return self.missed("type");
                }
            },
        };

        if self.subtype.resolved.is_none() {
            match subtype::classify(&probe, entity_type) {
                Verdict::Resolved(assignment) => {
                    LookoutCounters::bump(&COUNTERS.subtypes_resolved);
                    debug!(path = %self.path, id = %self.id, subtype = ?assignment.subtype, poi_group = ?assignment.poi_group, "subtype resolved");
                    self.subtype = SubtypeSlot {
                        resolved: Some(assignment.subtype),
                        poi_group: assignment.poi_group,
                    };
                }
                Verdict::Retry => return self.retry("subtype"),
                Verdict::Miss => {
                    self.state = EntityState::Unclassifiable;
                    self.zones = NearbyZones::empty();
                    return self.missed("subtype");
                }
            }
        }

        let next = state::classify(
            StateInput {
                current: self.state,
                entity_type,
                displayed: self.subtype(),
                original: self.original_subtype(),
            },
            &probe,
        );
        if next != self.state {
            trace!(path = %self.path, id = %self.id, from = ?self.state, to = ?next, "state changed");
            self.state = next;
        }
        if self.state.is_terminal() {
            self.zones = NearbyZones::empty();
            RefreshOutcome::Terminal
        } else {
            RefreshOutcome::Classified
        }
    }

    /// Read the validity flag and id. Returns whether the entity is valid.
    fn read_header(&mut self) -> bool {
        let reader = self.registry.reader();
        let flags = reader.read_u8(self.address.offset(offsets::entity::FLAGS));
        let id = reader.read_u32(self.address.offset(offsets::entity::ID));
        match (flags, id) {
            (Ok(flags), Ok(id)) if flags & offsets::entity::INVALID_BIT == 0 => {
                self.valid = true;
                self.id = EntityId(id);
            }
            _ => self.valid = false,
        }
        self.valid
    }

    fn refresh_registry(&mut self) -> bool {
        if !self.needs_rebuild && self.registry.revalidate(self.address) {
            return true;
        }
        match self.registry.rebuild(self.address) {
            Ok(path) => {
                self.path = path;
                self.needs_rebuild = false;
                true
            }
            Err(_) => false,
        }
    }

    fn retry(&self, stage: &'static str) -> RefreshOutcome {
        LookoutCounters::bump(&COUNTERS.classification_retries);
        trace!(path = %self.path, id = %self.id, stage, "classification deferred");
        RefreshOutcome::Retry
    }

    fn missed(&self, stage: &'static str) -> RefreshOutcome {
        LookoutCounters::bump(&COUNTERS.classification_misses);
        debug!(path = %self.path, id = %self.id, stage, "no classification rule matched");
        RefreshOutcome::Terminal
    }

    // -----------------------------------------------------------------------
    // Spatial
    // -----------------------------------------------------------------------

    /// Grid position from the `Render` capability.
    #[must_use]
    pub fn grid_position(&self) -> Option<GridPosition> {
        self.registry.try_get::<Render>(true).map(|r| r.grid_position())
    }

    /// Whole grid cells between this entity and `other`; `None` unless both
    /// have a readable `Render`.
    #[must_use]
    pub fn distance_to(&self, other: &Entity) -> Option<u32> {
        Some(self.grid_position()?.distance(other.grid_position()?))
    }

    /// Recompute proximity zones relative to `player`.
    pub fn update_zones(&mut self, player: &Entity, radii: &ZoneConfig) {
        self.zones = if self.state.is_terminal() {
            NearbyZones::empty()
        } else {
            self.distance_to(player)
                .map_or(NearbyZones::empty(), |d| zone::assess(d, radii))
        };
    }

    /// Mark the entity invalid without touching remote memory, e.g. when it
    /// dropped out of the area's entity list.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Backing address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Metadata path; empty until the first successful refresh.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Id, unique within the current area instance.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Whether the game still considers the entity alive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Type, once decided.
    #[must_use]
    pub fn entity_type(&self) -> Option<EntityType> {
        self.entity_type
    }

    /// Displayed subtype, once decided.
    #[must_use]
    pub fn subtype(&self) -> EntitySubtype {
        self.subtype.displayed().unwrap_or_default()
    }

    /// Whether a subtype has been decided.
    #[must_use]
    pub fn has_subtype(&self) -> bool {
        self.subtype.resolved.is_some()
    }

    /// Subtype the rules resolved, before any point-of-interest override.
    #[must_use]
    pub fn original_subtype(&self) -> EntitySubtype {
        self.subtype.resolved.unwrap_or_default()
    }

    /// Group of the matching point-of-interest filter; 0 unless the
    /// displayed subtype is `PoiMonster`.
    #[must_use]
    pub fn custom_group(&self) -> i32 {
        self.subtype.poi_group.unwrap_or(0)
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> EntityState {
        self.state
    }

    /// Proximity zones; empty for invalid entities.
    #[must_use]
    pub fn zones(&self) -> NearbyZones {
        if self.valid { self.zones } else { NearbyZones::empty() }
    }

    /// The component registry, shareable with other threads.
    #[must_use]
    pub fn components(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    /// Whether the subtype is, or was before a point-of-interest override,
    /// `subtype`.
    #[must_use]
    pub fn is_or_was_monster_subtype(&self, subtype: EntitySubtype) -> bool {
        self.subtype.resolved == Some(subtype)
    }

    /// Whether the game may explode or remove this entity while it is still
    /// in range, so that disappearing from the entity list means it is gone.
    #[must_use]
    pub fn can_be_dropped(&self) -> bool {
        if self.state.is_terminal() {
            return true;
        }
        match self.entity_type {
            Some(
                EntityType::Renderable
                | EntityType::ImportantMiscellaneousObject
                | EntityType::DeliriumSpawner
                | EntityType::DeliriumBomb,
            ) => true,
            // Legion members killed while frozen come back for their loot.
            Some(EntityType::Monster) => self.state != EntityState::LegionStage1Dead,
            _ => false,
        }
    }

    /// A serializable view for dumps and debugging.
    #[must_use]
    pub fn summary(&self) -> EntitySummary {
        EntitySummary {
            address: self.address,
            id: self.id,
            path: self.path.clone(),
            valid: self.valid,
            entity_type: self.entity_type,
            subtype: self.subtype.displayed(),
            original_subtype: self.subtype.resolved,
            custom_group: self.custom_group(),
            state: self.state,
            zones: self.zones(),
            components: self.registry.names(),
        }
    }
}

/// Plain-data view of an [`Entity`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySummary {
    /// Backing address.
    pub address: Address,
    /// Id.
    pub id: EntityId,
    /// Metadata path.
    pub path: String,
    /// Validity flag.
    pub valid: bool,
    /// Type.
    pub entity_type: Option<EntityType>,
    /// Displayed subtype.
    pub subtype: Option<EntitySubtype>,
    /// Subtype before any point-of-interest override.
    pub original_subtype: Option<EntitySubtype>,
    /// Point-of-interest group.
    pub custom_group: i32,
    /// State.
    pub state: EntityState,
    /// Proximity zones.
    pub zones: NearbyZones,
    /// Capability names in the address table.
    pub components: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{ComponentSpec, EntitySpec, SnapshotMemory};
    use crate::types::{Rarity, WorldPosition};

    fn at(x: f32) -> ComponentSpec {
        ComponentSpec::Render(WorldPosition {
            x: x * crate::types::WORLD_TO_GRID,
            y: 0.0,
            z: 0.0,
        })
    }

    fn ctx(config: &LookoutConfig) -> RefreshContext<'_> {
        RefreshContext {
            config,
            local_player_id: Some(EntityId(1)),
            address_changed: false,
        }
    }

    fn spawn(mem: &Arc<SnapshotMemory>, spec: &EntitySpec, config: &LookoutConfig) -> Entity {
        let written = spec.write(mem);
        Entity::new(written.address, mem.clone(), config)
    }

    fn monster(path: &str) -> EntitySpec {
        EntitySpec::new(9, path)
            .with(at(3.0))
            .with(ComponentSpec::Life(100))
            .with(ComponentSpec::Positioned(0))
            .with(ComponentSpec::ObjectMagicProperties {
                rarity: Rarity::Rare,
                mods: vec![],
                mod_stats: vec![],
            })
            .with(ComponentSpec::Stats(vec![]))
            .with(ComponentSpec::Buffs(vec![]))
    }

    #[test]
    fn invalid_entity_is_not_classified() {
        let mem = Arc::new(SnapshotMemory::new());
        let config = LookoutConfig::default();
        let mut spec = monster("Metadata/Monsters/Rat");
        spec.valid = false;
        let mut e = spawn(&mem, &spec, &config);
        assert_eq!(e.refresh(&ctx(&config)), RefreshOutcome::Invalid);
        assert!(!e.is_valid());
        assert_eq!(e.entity_type(), None);
        assert_eq!(e.zones(), NearbyZones::empty());
    }

    #[test]
    fn disabled_config_skips() {
        let mem = Arc::new(SnapshotMemory::new());
        let mut config = LookoutConfig::default();
        config.general.enabled = false;
        let mut e = spawn(&mem, &monster("Metadata/Monsters/Rat"), &config);
        assert_eq!(e.refresh(&ctx(&config)), RefreshOutcome::Skipped);
        assert_eq!(e.path(), "");
    }

    #[test]
    fn plain_monster_classifies() {
        let mem = Arc::new(SnapshotMemory::new());
        let config = LookoutConfig::default();
        let mut e = spawn(&mem, &monster("Metadata/Monsters/Rat"), &config);
        assert_eq!(e.refresh(&ctx(&config)), RefreshOutcome::Classified);
        assert_eq!(e.entity_type(), Some(EntityType::Monster));
        assert_eq!(e.subtype(), EntitySubtype::None);
        assert_eq!(e.id(), EntityId(9));
        assert_eq!(e.custom_group(), 0);
        assert!(e.can_be_dropped());
    }

    #[test]
    fn missing_positioned_is_retried_not_terminal() {
        let mem = Arc::new(SnapshotMemory::new());
        let config = LookoutConfig::default();
        let spec = EntitySpec::new(4, "Metadata/Monsters/Rat")
            .with(at(0.0))
            .with(ComponentSpec::Life(10));
        let mut e = spawn(&mem, &spec, &config);
        assert_eq!(e.refresh(&ctx(&config)), RefreshOutcome::Retry);
        assert_eq!(e.refresh(&ctx(&config)), RefreshOutcome::Retry);
        assert_eq!(e.state(), EntityState::None);
        assert_eq!(e.entity_type(), None);
    }

    #[test]
    fn no_render_is_unclassifiable() {
        let mem = Arc::new(SnapshotMemory::new());
        let config = LookoutConfig::default();
        let spec = EntitySpec::new(4, "Metadata/Effects/Spark").with(ComponentSpec::Opaque("Mods".into()));
        let mut e = spawn(&mem, &spec, &config);
        assert_eq!(e.refresh(&ctx(&config)), RefreshOutcome::Terminal);
        assert_eq!(e.state(), EntityState::Unclassifiable);
        assert!(e.can_be_dropped());
    }

    #[test]
    fn unreadable_table_retries() {
        let mem = Arc::new(SnapshotMemory::new());
        let config = LookoutConfig::default();
        let written = monster("Metadata/Monsters/Rat").write(&mem);
        written.clear_path(&mem);
        let mut e = Entity::new(written.address, mem.clone(), &config);
        assert_eq!(e.refresh(&ctx(&config)), RefreshOutcome::Retry);
        assert_eq!(e.entity_type(), None);
    }

    #[test]
    fn distance_needs_render_on_both() {
        let mem = Arc::new(SnapshotMemory::new());
        let config = LookoutConfig::default();
        let mut a = spawn(&mem, &monster("Metadata/Monsters/A"), &config);
        let mut b = spawn(&mem, &EntitySpec::new(2, "Metadata/Monsters/B").with(at(8.5)).with(ComponentSpec::Life(1)), &config);
        let mut c = spawn(&mem, &EntitySpec::new(3, "Metadata/Effects/C").with(ComponentSpec::Life(1)), &config);
        for e in [&mut a, &mut b, &mut c] {
            e.refresh(&ctx(&config));
        }
        assert_eq!(a.distance_to(&b), Some(5));
        assert_eq!(a.distance_to(&c), None);
    }

    #[test]
    fn summary_serializes() {
        let mem = Arc::new(SnapshotMemory::new());
        let config = LookoutConfig::default();
        let mut e = spawn(&mem, &monster("Metadata/Monsters/Rat"), &config);
        e.refresh(&ctx(&config));
        let s = e.summary();
        assert_eq!(s.entity_type, Some(EntityType::Monster));
        assert!(s.components.contains(&"Life".to_string()));
    }
}
