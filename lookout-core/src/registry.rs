//! Per-entity component registry.
//!
//! Maps capability names to remote addresses and caches decoded capability
//! objects. The address table and the cache form one *generation*; a
//! rebuild publishes a fresh generation with a single pointer swap, so
//! readers on other threads either see the old table or the new one, never a
//! mix. Decoded capabilities are handed out as `Arc` snapshots and are never
//! mutated afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::components::{self, Capability, Component, ComponentKind};
use crate::config::LimitsConfig;
use crate::error::{DecodeError, DecodeResult};
use crate::memory::{le_i32, le_u64, Reader, RemoteMemory};
use crate::metrics::{spans, LookoutCounters};
use crate::offsets::{details, entity, lookup};
use crate::types::Address;
use crate::COUNTERS;

#[derive(Default)]
struct Generation {
    addresses: HashMap<String, Address>,
    cache: RwLock<HashMap<ComponentKind, Component>>,
}

/// Component address table plus decoded-object cache for one entity.
pub struct ComponentRegistry {
    memory: Arc<dyn RemoteMemory>,
    limits: LimitsConfig,
    current: RwLock<Arc<Generation>>,
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let generation = self.generation();
        f.debug_struct("ComponentRegistry")
            .field("components", &generation.addresses.len())
            .field("cached", &generation.cache.read().len())
            .finish_non_exhaustive()
    }
}

impl ComponentRegistry {
    /// An empty registry reading from `memory`.
    #[must_use]
    pub fn new(memory: Arc<dyn RemoteMemory>, limits: LimitsConfig) -> Self {
        Self {
            memory,
            limits,
            current: RwLock::new(Arc::new(Generation::default())),
        }
    }

    /// A typed reader over this registry's memory.
    #[must_use]
    pub fn reader(&self) -> Reader<'_> {
        Reader::new(self.memory.as_ref(), self.limits)
    }

    fn generation(&self) -> Arc<Generation> {
        Arc::clone(&self.current.read())
    }

    fn publish(&self, generation: Generation) {
        *self.current.write() = Arc::new(generation);
    }

    /// Decode capability `C`, memoizing it when `cache` is set.
    ///
    /// Returns `None` when the entity has no such capability, its address is
    /// null, or decoding fails.
    #[must_use]
    pub fn try_get<C: Capability>(&self, cache: bool) -> Option<Arc<C>> {
        let generation = self.generation();
        if let Some(hit) = generation.cache.read().get(&C::KIND) {
            return C::from_component(hit);
        }

        let address = generation
            .addresses
            .get(C::KIND.name())
            .copied()
            .filter(|a| !a.is_null())?;
        match C::decode(&self.reader(), address) {
            Ok(decoded) => {
                let decoded = Arc::new(decoded);
                if cache {
                    generation
                        .cache
                        .write()
                        .insert(C::KIND, Arc::clone(&decoded).into_component());
                }
                Some(decoded)
            }
            Err(error) => {
                LookoutCounters::bump(&COUNTERS.decode_failures);
                trace!(component = C::KIND.name(), %address, %error, "component decode failed");
                None
            }
        }
    }

    /// Whether the address table lists this capability, without decoding it.
    #[must_use]
    pub fn contains(&self, kind: ComponentKind) -> bool {
        self.contains_name(kind.name())
    }

    /// Whether the address table lists a capability by its game name. Also
    /// covers capabilities the pipeline does not decode.
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.generation().addresses.contains_key(name)
    }

    /// Names in the address table, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.generation().addresses.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Kinds currently held in the decoded cache.
    #[must_use]
    pub fn cached_kinds(&self) -> Vec<ComponentKind> {
        let mut kinds: Vec<ComponentKind> = self.generation().cache.read().keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }

    /// Drop the address table and cache.
    pub fn clear(&self) {
        self.publish(Generation::default());
    }

    /// Re-read the address table for the entity at `entity` and clear the
    /// cache. Returns the entity's path.
    ///
    /// On failure the registry is left empty.
    ///
    /// # Errors
    /// Any [`DecodeError`] from reading the entity's details, lookup table or
    /// component list, or `Implausible` for an empty path or an oversized
    /// lookup table.
    pub fn rebuild(&self, entity: Address) -> DecodeResult<String> {
        let _span = tracing::trace_span!(spans::REGISTRY_REBUILD, %entity).entered();
        LookoutCounters::bump(&COUNTERS.registry_rebuilds);
        match self.read_table(entity) {
            Ok((path, addresses)) => {
                trace!(%entity, components = addresses.len(), "address table rebuilt");
                self.publish(Generation {
                    addresses,
                    cache: RwLock::default(),
                });
                Ok(path)
            }
            Err(error) => {
                LookoutCounters::bump(&COUNTERS.decode_failures);
                debug!(%entity, %error, "address table rebuild failed");
                self.clear();
                Err(error)
            }
        }
    }

    fn read_table(&self, entity_at: Address) -> DecodeResult<(String, HashMap<String, Address>)> {
        let reader = self.reader();
        let details_at = reader.read_non_null(entity_at.offset(entity::DETAILS_PTR), "entity details")?;
        let path = reader.read_std_wstring(details_at.offset(details::PATH))?;
        if path.is_empty() {
            return Err(DecodeError::Implausible {
                what: "empty entity path",
                value: entity_at.0,
            });
        }

        let lookup_at = reader.read_non_null(details_at.offset(details::LOOKUP_PTR), "component lookup")?;
        let entries = reader.read_std_vector(lookup_at.offset(lookup::ENTRIES))?;
        let capacity = entries.end.0.saturating_sub(entries.first.0) / lookup::ENTRY_STRIDE as u64;
        if capacity > self.limits.max_components_per_entity as u64 {
            return Err(DecodeError::Implausible {
                what: "component lookup capacity",
                value: capacity,
            });
        }
        let entries = reader.read_records(entries, lookup::ENTRY_STRIDE)?;

        let list = reader.read_std_vector(entity_at.offset(entity::COMPONENT_LIST))?;
        let components = reader.read_ptr_vec(list)?;

        let mut addresses = HashMap::with_capacity(entries.len());
        for entry in &entries {
            let Some(component) = usize::try_from(le_i32(entry, lookup::ENTRY_INDEX))
                .ok()
                .and_then(|i| components.get(i))
            else {
                continue;
            };
            let name_ptr = Address(le_u64(entry, lookup::ENTRY_NAME_PTR));
            let Ok(name) = reader.read_cstring(name_ptr) else {
                continue;
            };
            if !name.is_empty() {
                addresses.entry(name).or_insert(*component);
            }
        }
        Ok((path, addresses))
    }

    /// Re-decode every cached capability and check it still belongs to
    /// `entity`. Returns `false` on the first decode failure or owner
    /// mismatch, leaving the registry untouched for the caller to rebuild.
    pub fn revalidate(&self, entity: Address) -> bool {
        let generation = self.generation();
        let cached: Vec<ComponentKind> = generation.cache.read().keys().copied().collect();
        if cached.is_empty() {
            return true;
        }

        let reader = self.reader();
        let mut fresh = HashMap::with_capacity(cached.len());
        for kind in cached {
            let Some(address) = generation.addresses.get(kind.name()).copied() else {
                return self.broken(entity, kind, "address missing");
            };
            match components::decode(kind, &reader, address) {
                Ok(component) if component.owner() == entity => {
                    fresh.insert(kind, component);
                }
                Ok(_) => return self.broken(entity, kind, "owner mismatch"),
                Err(_) => return self.broken(entity, kind, "decode failed"),
            }
        }
        *generation.cache.write() = fresh;
        true
    }

    fn broken(&self, entity: Address, kind: ComponentKind, reason: &'static str) -> bool {
        LookoutCounters::bump(&COUNTERS.revalidation_breaks);
        debug!(%entity, component = kind.name(), reason, "cached component no longer valid");
        false
    }
}
