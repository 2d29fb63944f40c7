//! Remote structure layouts.
//!
//! Byte offsets of every field the pipeline reads. These track the game
//! client and move between patches; keep them here and nowhere else.

/// Entity object.
pub mod entity {
    /// Pointer to [`super::details`].
    pub const DETAILS_PTR: u64 = 0x08;
    /// `std::vector<Component*>`.
    pub const COMPONENT_LIST: u64 = 0x10;
    /// `u32` id, unique within an area instance.
    pub const ID: u64 = 0x80;
    /// `u8` flag byte.
    pub const FLAGS: u64 = 0x84;
    /// Set in [`FLAGS`] when the game has released the entity.
    pub const INVALID_BIT: u8 = 0x01;
}

/// Shared entity details (one per entity archetype).
pub mod details {
    /// `std::wstring` metadata path.
    pub const PATH: u64 = 0x08;
    /// Pointer to [`super::lookup`].
    pub const LOOKUP_PTR: u64 = 0x30;
}

/// Component name to index lookup table.
pub mod lookup {
    /// `std::vector<Entry>`.
    pub const ENTRIES: u64 = 0x28;
    /// Size of one entry.
    pub const ENTRY_STRIDE: usize = 0x10;
    /// Entry: pointer to the narrow component name.
    pub const ENTRY_NAME_PTR: usize = 0x00;
    /// Entry: `i32` index into the entity's component list.
    pub const ENTRY_INDEX: usize = 0x08;
}

/// Header shared by every component.
pub mod header {
    /// Pointer back to the owning entity.
    pub const OWNER: u64 = 0x08;
}

/// `Render`.
pub mod render {
    /// Three `f32`: x, y, z.
    pub const WORLD_POSITION: u64 = 0x138;
    /// `f32` terrain height under the entity.
    pub const TERRAIN_HEIGHT: u64 = 0x144;
}

/// `Chest`.
pub mod chest {
    /// Pointer to the chest data block.
    pub const DATA_PTR: u64 = 0x158;
    /// `u8` non-zero once opened.
    pub const IS_OPENED: u64 = 0x160;
    /// Chest data: `u8` label visible.
    pub const DATA_IS_LABEL_VISIBLE: u64 = 0x21;
    /// Chest data: pointer to the strongbox row, null for ordinary chests.
    pub const DATA_STRONGBOX_DAT: u64 = 0x50;
}

/// `Player`.
pub mod player {
    /// `std::wstring` character name.
    pub const NAME: u64 = 0x1B0;
}

/// `Shrine`.
pub mod shrine {
    /// `u8` non-zero once used.
    pub const IS_USED: u64 = 0x24;
}

/// `Life`.
pub mod life {
    /// `i32` maximum health.
    pub const HEALTH_MAX: u64 = 0x1D4;
    /// `i32` current health.
    pub const HEALTH_CURRENT: u64 = 0x1D8;
}

/// `TriggerableBlockage`.
pub mod triggerable_blockage {
    /// `u8` non-zero while blocking.
    pub const IS_BLOCKED: u64 = 0x30;
}

/// `Positioned`.
pub mod positioned {
    /// `u8` reaction (team) byte.
    pub const REACTION: u64 = 0x1E0;
    /// Team bits of [`REACTION`].
    pub const TEAM_MASK: u8 = 0x7F;
    /// Team value of the player's side.
    pub const FRIENDLY_TEAM: u8 = 0x01;
}

/// `ObjectMagicProperties`.
pub mod omp {
    /// Start of the embedded mods block.
    pub const DETAILS: u64 = 0x90;
    /// Block: `i32` rarity.
    pub const RARITY: u64 = 0xB4;
    /// Block: five consecutive `std::vector<ModRecord>`.
    pub const MOD_VECTORS: u64 = 0xC0;
    /// Number of mod vectors.
    pub const MOD_VECTOR_COUNT: u64 = 5;
    /// Block: `std::vector<(i32, i32)>` stats granted by mods.
    pub const STATS_FROM_MODS: u64 = 0x180;
    /// Size of one mod record.
    pub const MOD_RECORD_STRIDE: usize = 0x38;
    /// Mod record: pointer to the `Mods.dat` row.
    pub const MOD_RECORD_ROW_PTR: usize = 0x28;
    /// `Mods.dat` row: pointer to the wide mod id.
    pub const MOD_ROW_NAME_PTR: u64 = 0x00;
}

/// `Targetable`.
pub mod targetable {
    /// `u32` flag word; bit 0 is "targetable".
    pub const FLAGS: u64 = 0x48;
    /// `u32` hidden flag word.
    pub const HIDDEN: u64 = 0x50;
}

/// `NPC`.
pub mod npc {
    /// `u8` ignore-hidden flag.
    pub const IGNORE_HIDDEN: u64 = 0x20;
    /// `u8` minimap label visible.
    pub const MINIMAP_LABEL_VISIBLE: u64 = 0x21;
}

/// `Buffs`.
pub mod buffs {
    /// `std::vector<Buff*>`.
    pub const EFFECTS: u64 = 0x158;
    /// Buff: pointer to its definition row.
    pub const BUFF_DEFINITION_PTR: u64 = 0x08;
    /// Buff: `f32` seconds remaining.
    pub const BUFF_TIME_LEFT: u64 = 0x18;
    /// Buff: `u16` charges.
    pub const BUFF_CHARGES: u64 = 0x42;
    /// Definition row: pointer to the wide buff id.
    pub const DEFINITION_NAME_PTR: u64 = 0x00;
}

/// `Stats`.
pub mod stats {
    /// Pointer to the internal stats block.
    pub const DATA_PTR: u64 = 0x20;
    /// Internal block: `std::vector<(i32, i32)>`.
    pub const DATA_STATS: u64 = 0xF0;
    /// Size of one key/value pair.
    pub const PAIR_STRIDE: usize = 0x08;
}

/// `MinimapIcon`.
pub mod minimap_icon {
    /// Pointer to a row whose first field is the wide icon name pointer.
    pub const NAME_PTR: u64 = 0x20;
}

/// `Animated`.
pub mod animated {
    /// Pointer to the animation's own entity.
    pub const ENTITY_PTR: u64 = 0x260;
}

/// `Transitionable`.
pub mod transitionable {
    /// `i16` current transition state.
    pub const STATE: u64 = 0x120;
}
