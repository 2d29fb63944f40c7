//! Type, subtype and state classification.
//!
//! The three stages run against a [`Probe`]: a read-only view of one entity
//! (path, id, capability registry) plus the configuration snapshot of the
//! current refresh. Each stage is a table of [`rules::Rule`]s evaluated
//! first-match.

pub mod entity_type;
pub mod poi;
pub mod rules;
pub mod state;
pub mod subtype;

pub use entity_type::TypeAssignment;
pub use rules::Verdict;
pub use subtype::SubtypeAssignment;

use std::sync::Arc;

use crate::components::{Capability, ComponentKind, ObjectMagicProperties, Stats};
use crate::config::LookoutConfig;
use crate::registry::ComponentRegistry;
use crate::types::{EntityId, StatKey};

/// Everything a rule may look at.
pub struct Probe<'a> {
    /// Entity metadata path.
    pub path: &'a str,
    /// Entity id.
    pub id: EntityId,
    /// Capability registry of the entity.
    pub registry: &'a ComponentRegistry,
    /// Configuration for this refresh.
    pub config: &'a LookoutConfig,
    /// Id of the local player, when known.
    pub local_player_id: Option<EntityId>,
    magic: Option<Arc<ObjectMagicProperties>>,
    stats: Option<Arc<Stats>>,
}

impl<'a> Probe<'a> {
    /// A probe over one entity.
    #[must_use]
    pub fn new(
        path: &'a str,
        id: EntityId,
        registry: &'a ComponentRegistry,
        config: &'a LookoutConfig,
        local_player_id: Option<EntityId>,
    ) -> Self {
        Self {
            path,
            id,
            registry,
            config,
            local_player_id,
            magic: None,
            stats: None,
        }
    }

    /// Attach the monster facts the monster subtype rules read.
    #[must_use]
    pub fn with_monster_facts(mut self, magic: Arc<ObjectMagicProperties>, stats: Arc<Stats>) -> Self {
        self.magic = Some(magic);
        self.stats = Some(stats);
        self
    }

    /// Decoded capability `C`, cached on the registry.
    #[must_use]
    pub fn get<C: Capability>(&self) -> Option<Arc<C>> {
        self.registry.try_get::<C>(true)
    }

    /// Whether capability `C` decodes.
    #[must_use]
    pub fn has<C: Capability>(&self) -> bool {
        self.get::<C>().is_some()
    }

    /// Whether the address table lists `kind`, decoded or not.
    #[must_use]
    pub fn lists(&self, kind: ComponentKind) -> bool {
        self.registry.contains(kind)
    }

    /// Path starts with any of `prefixes`.
    #[must_use]
    pub fn path_starts_with_any(&self, prefixes: &[&str]) -> bool {
        prefixes.iter().any(|p| self.path.starts_with(p))
    }

    /// Monster has a mod with this id. False without monster facts.
    #[must_use]
    pub fn has_mod(&self, name: &str) -> bool {
        self.magic.as_ref().is_some_and(|m| m.has_mod(name))
    }

    /// Mod-granted stat value. `None` without monster facts.
    #[must_use]
    pub fn mod_stat(&self, key: StatKey) -> Option<i32> {
        self.magic.as_ref().and_then(|m| m.mod_stat(key))
    }

    /// Own stat value. `None` without monster facts.
    #[must_use]
    pub fn stat(&self, key: StatKey) -> Option<i32> {
        self.stats.as_ref().and_then(|s| s.get(key))
    }

    /// Monster magic properties, when attached.
    #[must_use]
    pub fn magic(&self) -> Option<&ObjectMagicProperties> {
        self.magic.as_deref()
    }

    /// Monster stats, when attached.
    #[must_use]
    pub fn stats(&self) -> Option<&Stats> {
        self.stats.as_deref()
    }
}
