//! Where an entity is and whether it can be interacted with.

use super::read_owner;
use crate::error::{DecodeError, DecodeResult};
use crate::memory::Reader;
use crate::offsets::{animated, details, entity, positioned, render, targetable};
use crate::types::{Address, GridPosition, WorldPosition};

/// `Render`: world placement.
#[derive(Debug, Clone, PartialEq)]
pub struct Render {
    /// Owning entity.
    pub owner: Address,
    /// World-space position.
    pub world_position: WorldPosition,
    /// Terrain height under the entity.
    pub terrain_height: f32,
}

impl Render {
    pub(crate) fn read(reader: &Reader<'_>, address: Address) -> DecodeResult<Self> {
        let owner = read_owner(reader, address)?;
        let at = address.offset(render::WORLD_POSITION);
        let world_position = WorldPosition {
            x: reader.read_f32(at)?,
            y: reader.read_f32(at.offset(4))?,
            z: reader.read_f32(at.offset(8))?,
        };
        if !(world_position.x.is_finite() && world_position.y.is_finite()) {
            return Err(DecodeError::Implausible {
                what: "render position",
                value: u64::from(world_position.x.to_bits()),
            });
        }
        Ok(Self {
            owner,
            world_position,
            terrain_height: reader.read_f32(address.offset(render::TERRAIN_HEIGHT))?,
        })
    }

    /// Position on the terrain grid.
    #[must_use]
    pub fn grid_position(&self) -> GridPosition {
        self.world_position.to_grid()
    }
}

/// `Positioned`: team affiliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Positioned {
    /// Owning entity.
    pub owner: Address,
    /// Raw reaction byte.
    pub reaction: u8,
}

impl Positioned {
    pub(crate) fn read(reader: &Reader<'_>, address: Address) -> DecodeResult<Self> {
        Ok(Self {
            owner: read_owner(reader, address)?,
            reaction: reader.read_u8(address.offset(positioned::REACTION))?,
        })
    }

    /// On the player's team.
    #[must_use]
    pub fn is_friendly(&self) -> bool {
        self.reaction & positioned::TEAM_MASK == positioned::FRIENDLY_TEAM
    }
}

/// `Targetable`: whether the player can target the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Targetable {
    /// Owning entity.
    pub owner: Address,
    /// Raw flag word.
    pub flags: u32,
    /// Raw hidden word.
    pub hidden_flags: u32,
}

impl Targetable {
    pub(crate) fn read(reader: &Reader<'_>, address: Address) -> DecodeResult<Self> {
        Ok(Self {
            owner: read_owner(reader, address)?,
            flags: reader.read_u32(address.offset(targetable::FLAGS))?,
            hidden_flags: reader.read_u32(address.offset(targetable::HIDDEN))?,
        })
    }

    /// Bit 0 of the flag word.
    #[must_use]
    pub fn is_targetable(&self) -> bool {
        self.flags & 1 != 0
    }
}

/// `Animated`: the entity driving this entity's animation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animated {
    /// Owning entity.
    pub owner: Address,
    /// The animation entity, possibly null.
    pub animated_entity: Address,
    /// Metadata path of the animation entity; empty when there is none.
    pub path: String,
}

impl Animated {
    pub(crate) fn read(reader: &Reader<'_>, address: Address) -> DecodeResult<Self> {
        let owner = read_owner(reader, address)?;
        let animated_entity = reader.read_ptr(address.offset(animated::ENTITY_PTR))?;
        let path = if animated_entity.is_null() {
            String::new()
        } else {
            let details_ptr =
                reader.read_non_null(animated_entity.offset(entity::DETAILS_PTR), "animated details")?;
            reader.read_std_wstring(details_ptr.offset(details::PATH))?
        };
        Ok(Self {
            owner,
            animated_entity,
            path,
        })
    }
}
