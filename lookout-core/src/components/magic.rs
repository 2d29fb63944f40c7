//! `ObjectMagicProperties`: rarity and mods of a monster or object.

use std::collections::{HashMap, HashSet};

use super::actor::read_stat_pairs;
use super::read_owner;
use crate::error::DecodeResult;
use crate::memory::{le_u64, Reader, StdVector};
use crate::offsets::omp;
use crate::types::{Address, Rarity, StatKey};

/// `ObjectMagicProperties`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMagicProperties {
    /// Owning entity.
    pub owner: Address,
    /// Rarity.
    pub rarity: Rarity,
    /// Ids of every mod across the implicit, explicit, enchant and league
    /// mod lists.
    pub mod_names: HashSet<String>,
    /// Stats granted by those mods.
    pub mod_stats: HashMap<StatKey, i32>,
}

impl ObjectMagicProperties {
    pub(crate) fn read(reader: &Reader<'_>, address: Address) -> DecodeResult<Self> {
        let owner = read_owner(reader, address)?;
        let block = address.offset(omp::DETAILS);
        let rarity = Rarity::from_raw(reader.read_i32(block.offset(omp::RARITY))?);

        let mut mod_names = HashSet::new();
        for i in 0..omp::MOD_VECTOR_COUNT {
            let vector = reader.read_std_vector(block.offset(omp::MOD_VECTORS + i * StdVector::SIZE))?;
            for record in reader.read_records(vector, omp::MOD_RECORD_STRIDE)? {
                let row = Address(le_u64(&record, omp::MOD_RECORD_ROW_PTR));
                if row.is_null() {
                    continue;
                }
                let name_ptr = reader.read_ptr(row.offset(omp::MOD_ROW_NAME_PTR))?;
                if name_ptr.is_null() {
                    continue;
                }
                let name = reader.read_wide_cstring(name_ptr)?;
                if !name.is_empty() {
                    mod_names.insert(name);
                }
            }
        }

        let mod_stats = read_stat_pairs(reader, block.offset(omp::STATS_FROM_MODS))?;
        Ok(Self {
            owner,
            rarity,
            mod_names,
            mod_stats,
        })
    }

    /// Whether a mod with this id is present.
    #[must_use]
    pub fn has_mod(&self, name: &str) -> bool {
        self.mod_names.contains(name)
    }

    /// Value of a mod-granted stat, if present.
    #[must_use]
    pub fn mod_stat(&self, key: StatKey) -> Option<i32> {
        self.mod_stats.get(&key).copied()
    }
}
