//! Lays out entities in a [`SnapshotMemory`] exactly as the game does.
//!
//! Used by the integration tests and the benchmarks to build a "game" to read
//! from, and to mutate it between ticks (open a chest, kill a monster, swap
//! buffs).

use super::{std_wstring, SnapshotMemory, StdVector};
use crate::offsets::{
    animated, buffs, chest, details, entity, header, life, lookup, minimap_icon, npc, omp, player,
    positioned, shrine, stats, targetable, transitionable, triggerable_blockage,
};
use crate::types::{Address, EntityId, Rarity, StatKey, WorldPosition};

/// Bytes reserved for every component object.
const COMPONENT_SIZE: usize = 0x280;
const ENTITY_SIZE: usize = 0x90;

/// Content of one capability to lay out.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentSpec {
    /// `Render` at a world position.
    Render(WorldPosition),
    /// `Chest`.
    Chest {
        /// Opened.
        opened: bool,
        /// Label visible.
        label_visible: bool,
        /// Backed by a strongbox row.
        strongbox: bool,
    },
    /// `Player` with a character name.
    Player(String),
    /// `Shrine`, used or not.
    Shrine(bool),
    /// `Life` with current health.
    Life(i32),
    /// `TriggerableBlockage`, blocked or not.
    TriggerableBlockage(bool),
    /// `Positioned` with a raw reaction byte.
    Positioned(u8),
    /// `ObjectMagicProperties`.
    ObjectMagicProperties {
        /// Rarity.
        rarity: Rarity,
        /// Mod ids, all placed in the explicit mod list.
        mods: Vec<String>,
        /// Stats granted by mods.
        mod_stats: Vec<(StatKey, i32)>,
    },
    /// `DiesAfterTime`.
    DiesAfterTime,
    /// `Targetable`, targetable or not.
    Targetable(bool),
    /// `NPC`.
    Npc,
    /// `Buffs` with these status effect ids.
    Buffs(Vec<String>),
    /// `Stats` with these key/value pairs.
    Stats(Vec<(StatKey, i32)>),
    /// `MinimapIcon` with an icon id.
    MinimapIcon(String),
    /// `Animated`, driven by an entity with this path.
    Animated(String),
    /// `Transitionable` in a state.
    Transitionable(i16),
    /// A capability the pipeline does not decode, by lookup name.
    Opaque(String),
}

impl ComponentSpec {
    /// Name in the entity's component lookup table.
    #[must_use]
    pub fn lookup_name(&self) -> &str {
        match self {
            Self::Render(_) => "Render",
            Self::Chest { .. } => "Chest",
            Self::Player(_) => "Player",
            Self::Shrine(_) => "Shrine",
            Self::Life(_) => "Life",
            Self::TriggerableBlockage(_) => "TriggerableBlockage",
            Self::Positioned(_) => "Positioned",
            Self::ObjectMagicProperties { .. } => "ObjectMagicProperties",
            Self::DiesAfterTime => "DiesAfterTime",
            Self::Targetable(_) => "Targetable",
            Self::Npc => "NPC",
            Self::Buffs(_) => "Buffs",
            Self::Stats(_) => "Stats",
            Self::MinimapIcon(_) => "MinimapIcon",
            Self::Animated(_) => "Animated",
            Self::Transitionable(_) => "Transitionable",
            Self::Opaque(name) => name,
        }
    }

    /// Write this capability's fields into the component object at
    /// `address`, owned by `owner`. Safe to call again to change values.
    pub fn write_at(&self, mem: &SnapshotMemory, address: Address, owner: Address) {
        mem.write_ptr(address.offset(header::OWNER), owner);
        match self {
            Self::Render(pos) => {
                let at = address.offset(crate::offsets::render::WORLD_POSITION);
                mem.write_f32(at, pos.x);
                mem.write_f32(at.offset(4), pos.y);
                mem.write_f32(at.offset(8), pos.z);
            }
            Self::Chest {
                opened,
                label_visible,
                strongbox,
            } => {
                mem.write_u8(address.offset(chest::IS_OPENED), u8::from(*opened));
                let data = mem.alloc(0x60);
                mem.write_u8(data.offset(chest::DATA_IS_LABEL_VISIBLE), u8::from(*label_visible));
                let row = if *strongbox { mem.alloc(0x10) } else { Address::NULL };
                mem.write_ptr(data.offset(chest::DATA_STRONGBOX_DAT), row);
                mem.write_ptr(address.offset(chest::DATA_PTR), data);
            }
            Self::Player(name) => mem.write_std_wstring(address.offset(player::NAME), name),
            Self::Shrine(used) => mem.write_u8(address.offset(shrine::IS_USED), u8::from(*used)),
            Self::Life(current) => {
                mem.write_i32(address.offset(life::HEALTH_MAX), (*current).max(1));
                mem.write_i32(address.offset(life::HEALTH_CURRENT), *current);
            }
            Self::TriggerableBlockage(blocked) => {
                mem.write_u8(address.offset(triggerable_blockage::IS_BLOCKED), u8::from(*blocked));
            }
            Self::Positioned(reaction) => mem.write_u8(address.offset(positioned::REACTION), *reaction),
            Self::ObjectMagicProperties {
                rarity,
                mods,
                mod_stats,
            } => write_magic(mem, address.offset(omp::DETAILS), *rarity, mods, mod_stats),
            Self::DiesAfterTime | Self::Opaque(_) => {}
            Self::Npc => mem.write_u8(address.offset(npc::MINIMAP_LABEL_VISIBLE), 1),
            Self::Targetable(on) => mem.write_u32(address.offset(targetable::FLAGS), u32::from(*on)),
            Self::Buffs(names) => {
                let ptrs: Vec<Address> = names
                    .iter()
                    .map(|name| {
                        let definition = mem.alloc(0x10);
                        mem.write_ptr(
                            definition.offset(buffs::DEFINITION_NAME_PTR),
                            mem.alloc_wide_cstring(name),
                        );
                        let buff = mem.alloc(0x50);
                        mem.write_ptr(buff.offset(buffs::BUFF_DEFINITION_PTR), definition);
                        mem.write_f32(buff.offset(buffs::BUFF_TIME_LEFT), f32::INFINITY);
                        mem.write_u16(buff.offset(buffs::BUFF_CHARGES), 1);
                        buff
                    })
                    .collect();
                mem.write_ptr_vector(address.offset(buffs::EFFECTS), &ptrs);
            }
            Self::Stats(pairs) => {
                let data = mem.alloc(0x110);
                let raw: Vec<(i32, i32)> = pairs.iter().map(|(k, v)| (k.0, *v)).collect();
                mem.write_pair_vector(data.offset(stats::DATA_STATS), &raw);
                mem.write_ptr(address.offset(stats::DATA_PTR), data);
            }
            Self::MinimapIcon(name) => {
                let row = mem.alloc(0x10);
                mem.write_ptr(row, mem.alloc_wide_cstring(name));
                mem.write_ptr(address.offset(minimap_icon::NAME_PTR), row);
            }
            Self::Animated(path) => {
                let target = mem.alloc(ENTITY_SIZE);
                let target_details = mem.alloc(0x40);
                mem.write_std_wstring(target_details.offset(details::PATH), path);
                mem.write_ptr(target.offset(entity::DETAILS_PTR), target_details);
                mem.write_ptr(address.offset(animated::ENTITY_PTR), target);
            }
            Self::Transitionable(state) => {
                mem.write_i16(address.offset(transitionable::STATE), *state);
            }
        }
    }
}

fn write_magic(
    mem: &SnapshotMemory,
    block: Address,
    rarity: Rarity,
    mods: &[String],
    mod_stats: &[(StatKey, i32)],
) {
    mem.write_i32(block.offset(omp::RARITY), rarity.to_raw());
    let mut records = vec![0u8; mods.len() * omp::MOD_RECORD_STRIDE];
    for (i, name) in mods.iter().enumerate() {
        let row = mem.alloc(0x10);
        mem.write_ptr(row.offset(omp::MOD_ROW_NAME_PTR), mem.alloc_wide_cstring(name));
        let at = i * omp::MOD_RECORD_STRIDE + omp::MOD_RECORD_ROW_PTR;
        records[at..at + 8].copy_from_slice(&row.0.to_le_bytes());
    }
    for i in 0..omp::MOD_VECTOR_COUNT {
        let header_at = block.offset(omp::MOD_VECTORS + i * StdVector::SIZE);
        // Every mod goes into the explicit list, the second one.
        if i == 1 {
            mem.write_vector_bytes(header_at, &records);
        } else {
            mem.write_vector_header(header_at, StdVector::default());
        }
    }
    let raw: Vec<(i32, i32)> = mod_stats.iter().map(|(k, v)| (k.0, *v)).collect();
    mem.write_pair_vector(block.offset(omp::STATS_FROM_MODS), &raw);
}

/// An entity to lay out.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySpec {
    /// Id.
    pub id: EntityId,
    /// Metadata path.
    pub path: String,
    /// Validity flag.
    pub valid: bool,
    /// Capabilities, in component-list order.
    pub components: Vec<ComponentSpec>,
}

impl EntitySpec {
    /// A valid entity with no capabilities.
    #[must_use]
    pub fn new(id: u32, path: impl Into<String>) -> Self {
        Self {
            id: EntityId(id),
            path: path.into(),
            valid: true,
            components: Vec::new(),
        }
    }

    /// Add a capability.
    #[must_use]
    pub fn with(mut self, component: ComponentSpec) -> Self {
        self.components.push(component);
        self
    }

    /// Write the entity into `mem`.
    pub fn write(&self, mem: &SnapshotMemory) -> WrittenEntity {
        let address = mem.alloc(ENTITY_SIZE);
        mem.write_u32(address.offset(entity::ID), self.id.0);
        set_valid(mem, address, self.valid);

        let details_at = mem.alloc(0x40);
        mem.write_std_wstring(details_at.offset(details::PATH), &self.path);
        mem.write_ptr(address.offset(entity::DETAILS_PTR), details_at);

        let mut components = Vec::with_capacity(self.components.len());
        let mut entries = vec![0u8; self.components.len() * lookup::ENTRY_STRIDE];
        for (i, spec) in self.components.iter().enumerate() {
            let at = mem.alloc(COMPONENT_SIZE);
            spec.write_at(mem, at, address);
            let name_ptr = mem.alloc_cstring(spec.lookup_name());
            let entry = i * lookup::ENTRY_STRIDE;
            entries[entry + lookup::ENTRY_NAME_PTR..entry + lookup::ENTRY_NAME_PTR + 8]
                .copy_from_slice(&name_ptr.0.to_le_bytes());
            let index = i32::try_from(i).unwrap_or(i32::MAX);
            entries[entry + lookup::ENTRY_INDEX..entry + lookup::ENTRY_INDEX + 4]
                .copy_from_slice(&index.to_le_bytes());
            components.push((spec.lookup_name().to_string(), at));
        }

        let lookup_at = mem.alloc(0x40);
        mem.write_vector_bytes(lookup_at.offset(lookup::ENTRIES), &entries);
        mem.write_ptr(details_at.offset(details::LOOKUP_PTR), lookup_at);

        let ptrs: Vec<Address> = components.iter().map(|(_, a)| *a).collect();
        mem.write_ptr_vector(address.offset(entity::COMPONENT_LIST), &ptrs);

        WrittenEntity {
            address,
            details: details_at,
            components,
        }
    }
}

/// Where an [`EntitySpec`] landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenEntity {
    /// Entity object.
    pub address: Address,
    /// Entity details object.
    pub details: Address,
    /// Lookup name and address of each capability, in list order.
    pub components: Vec<(String, Address)>,
}

impl WrittenEntity {
    /// Address of the first capability with this lookup name.
    #[must_use]
    pub fn component(&self, name: &str) -> Option<Address> {
        self.components
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, a)| *a)
    }

    /// Overwrite a capability's values in place.
    pub fn update(&self, mem: &SnapshotMemory, spec: &ComponentSpec) -> bool {
        match self.component(spec.lookup_name()) {
            Some(at) => {
                spec.write_at(mem, at, self.address);
                true
            }
            None => false,
        }
    }

    /// Flip the entity's validity flag.
    pub fn set_valid(&self, mem: &SnapshotMemory, valid: bool) {
        set_valid(mem, self.address, valid);
    }

    /// Corrupt the path so that the next rebuild fails.
    pub fn clear_path(&self, mem: &SnapshotMemory) {
        mem.write_u64(self.details.offset(details::PATH + std_wstring::LENGTH), 0);
    }
}

fn set_valid(mem: &SnapshotMemory, address: Address, valid: bool) {
    let flags = if valid { 0 } else { entity::INVALID_BIT };
    mem.write_u8(address.offset(entity::FLAGS), flags);
}
