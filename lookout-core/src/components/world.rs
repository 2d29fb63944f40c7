//! Interactive world objects: chests, shrines, doors, NPCs, icons.

use super::read_owner;
use crate::error::DecodeResult;
use crate::memory::Reader;
use crate::offsets::{chest, minimap_icon, npc, shrine, transitionable, triggerable_blockage};
use crate::types::Address;

/// `Chest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chest {
    /// Owning entity.
    pub owner: Address,
    /// Already opened.
    pub is_opened: bool,
    /// Shows a name label on the ground.
    pub is_label_visible: bool,
    /// Backed by a strongbox row.
    pub is_strongbox: bool,
}

impl Chest {
    pub(crate) fn read(reader: &Reader<'_>, address: Address) -> DecodeResult<Self> {
        let owner = read_owner(reader, address)?;
        let is_opened = reader.read_u8(address.offset(chest::IS_OPENED))? != 0;
        let data = reader.read_ptr(address.offset(chest::DATA_PTR))?;
        let (is_label_visible, is_strongbox) = if data.is_null() {
            (false, false)
        } else {
            (
                reader.read_u8(data.offset(chest::DATA_IS_LABEL_VISIBLE))? != 0,
                !reader.read_ptr(data.offset(chest::DATA_STRONGBOX_DAT))?.is_null(),
            )
        };
        Ok(Self {
            owner,
            is_opened,
            is_label_visible,
            is_strongbox,
        })
    }
}

/// `Shrine`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shrine {
    /// Owning entity.
    pub owner: Address,
    /// Already used. Some shrines become usable again.
    pub is_used: bool,
}

impl Shrine {
    pub(crate) fn read(reader: &Reader<'_>, address: Address) -> DecodeResult<Self> {
        Ok(Self {
            owner: read_owner(reader, address)?,
            is_used: reader.read_u8(address.offset(shrine::IS_USED))? != 0,
        })
    }
}

/// `TriggerableBlockage`: doors and walls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerableBlockage {
    /// Owning entity.
    pub owner: Address,
    /// Currently blocking movement.
    pub is_blocked: bool,
}

impl TriggerableBlockage {
    pub(crate) fn read(reader: &Reader<'_>, address: Address) -> DecodeResult<Self> {
        Ok(Self {
            owner: read_owner(reader, address)?,
            is_blocked: reader.read_u8(address.offset(triggerable_blockage::IS_BLOCKED))? != 0,
        })
    }
}

/// `Transitionable`: multi-state objects such as levers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transitionable {
    /// Owning entity.
    pub owner: Address,
    /// Current transition state.
    pub state: i16,
}

impl Transitionable {
    pub(crate) fn read(reader: &Reader<'_>, address: Address) -> DecodeResult<Self> {
        Ok(Self {
            owner: read_owner(reader, address)?,
            state: reader.read_i16(address.offset(transitionable::STATE))?,
        })
    }
}

/// `NPC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Npc {
    /// Owning entity.
    pub owner: Address,
    /// Drawn even when hidden.
    pub is_ignore_hidden: bool,
    /// Label shown on the minimap.
    pub is_minimap_label_visible: bool,
}

impl Npc {
    pub(crate) fn read(reader: &Reader<'_>, address: Address) -> DecodeResult<Self> {
        Ok(Self {
            owner: read_owner(reader, address)?,
            is_ignore_hidden: reader.read_u8(address.offset(npc::IGNORE_HIDDEN))? != 0,
            is_minimap_label_visible: reader.read_u8(address.offset(npc::MINIMAP_LABEL_VISIBLE))?
                != 0,
        })
    }
}

/// `MinimapIcon`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinimapIcon {
    /// Owning entity.
    pub owner: Address,
    /// Icon id; empty when the icon row is missing.
    pub name: String,
}

impl MinimapIcon {
    pub(crate) fn read(reader: &Reader<'_>, address: Address) -> DecodeResult<Self> {
        let owner = read_owner(reader, address)?;
        let row = reader.read_ptr(address.offset(minimap_icon::NAME_PTR))?;
        let name = if row.is_null() {
            String::new()
        } else {
            let name_ptr = reader.read_non_null(row, "minimap icon name")?;
            reader.read_wide_cstring(name_ptr)?
        };
        Ok(Self { owner, name })
    }
}
