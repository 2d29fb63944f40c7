//! Living things: health, buffs, stats, players.

use std::collections::HashMap;

use super::read_owner;
use crate::error::DecodeResult;
use crate::memory::{le_i32, Reader};
use crate::offsets::{buffs, life, player, stats};
use crate::types::{Address, StatKey};

/// `Life`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Life {
    /// Owning entity.
    pub owner: Address,
    /// Current health.
    pub health_current: i32,
    /// Maximum health.
    pub health_max: i32,
}

impl Life {
    pub(crate) fn read(reader: &Reader<'_>, address: Address) -> DecodeResult<Self> {
        Ok(Self {
            owner: read_owner(reader, address)?,
            health_current: reader.read_i32(address.offset(life::HEALTH_CURRENT))?,
            health_max: reader.read_i32(address.offset(life::HEALTH_MAX))?,
        })
    }

    /// Any health left.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health_current > 0
    }
}

/// `DiesAfterTime`: marker for summoned, expiring monsters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiesAfterTime {
    /// Owning entity.
    pub owner: Address,
}

impl DiesAfterTime {
    pub(crate) fn read(reader: &Reader<'_>, address: Address) -> DecodeResult<Self> {
        Ok(Self {
            owner: read_owner(reader, address)?,
        })
    }
}

/// `Player`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Owning entity.
    pub owner: Address,
    /// Character name.
    pub name: String,
}

impl Player {
    pub(crate) fn read(reader: &Reader<'_>, address: Address) -> DecodeResult<Self> {
        Ok(Self {
            owner: read_owner(reader, address)?,
            name: reader.read_std_wstring(address.offset(player::NAME))?,
        })
    }
}

/// One active status effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusEffect {
    /// Seconds remaining; infinite effects report `f32::INFINITY`.
    pub time_left: f32,
    /// Stack count.
    pub charges: u16,
}

/// `Buffs`: active status effects by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffs {
    /// Owning entity.
    pub owner: Address,
    /// Status effects keyed by buff id. The first instance of an id wins.
    pub status_effects: HashMap<String, StatusEffect>,
}

impl Buffs {
    pub(crate) fn read(reader: &Reader<'_>, address: Address) -> DecodeResult<Self> {
        let owner = read_owner(reader, address)?;
        let effects = reader.read_std_vector(address.offset(buffs::EFFECTS))?;
        let mut status_effects = HashMap::new();
        for buff in reader.read_ptr_vec(effects)? {
            if buff.is_null() {
                continue;
            }
            let definition = reader.read_non_null(buff.offset(buffs::BUFF_DEFINITION_PTR), "buff definition")?;
            let name_ptr = reader.read_non_null(definition.offset(buffs::DEFINITION_NAME_PTR), "buff name")?;
            let name = reader.read_wide_cstring(name_ptr)?;
            let effect = StatusEffect {
                time_left: reader.read_f32(buff.offset(buffs::BUFF_TIME_LEFT))?,
                charges: reader.read_u16(buff.offset(buffs::BUFF_CHARGES))?,
            };
            status_effects.entry(name).or_insert(effect);
        }
        Ok(Self {
            owner,
            status_effects,
        })
    }

    /// Whether a status effect with this id is active.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.status_effects.contains_key(name)
    }
}

/// `Stats`: the entity's own stat table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    /// Owning entity.
    pub owner: Address,
    /// Stat values by key.
    pub values: HashMap<StatKey, i32>,
}

impl Stats {
    pub(crate) fn read(reader: &Reader<'_>, address: Address) -> DecodeResult<Self> {
        let owner = read_owner(reader, address)?;
        let data = reader.read_ptr(address.offset(stats::DATA_PTR))?;
        let values = if data.is_null() {
            HashMap::new()
        } else {
            read_stat_pairs(reader, data.offset(stats::DATA_STATS))?
        };
        Ok(Self { owner, values })
    }

    /// Value of `key`, if present.
    #[must_use]
    pub fn get(&self, key: StatKey) -> Option<i32> {
        self.values.get(&key).copied()
    }
}

/// Read a `std::vector<(i32, i32)>` of stat key/value pairs.
pub(crate) fn read_stat_pairs(reader: &Reader<'_>, vector_at: Address) -> DecodeResult<HashMap<StatKey, i32>> {
    let vector = reader.read_std_vector(vector_at)?;
    Ok(reader
        .read_records(vector, stats::PAIR_STRIDE)?
        .iter()
        .map(|pair| (StatKey(le_i32(pair, 0)), le_i32(pair, 4)))
        .collect())
}
