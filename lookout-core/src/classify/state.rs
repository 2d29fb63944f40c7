//! Per-tick state classification.
//!
//! Runs every tick after type and subtype are known. Whenever a capability
//! the decision needs is unreadable this tick, the previous state is kept.

use super::Probe;
use crate::category::{EntityState, EntitySubtype, EntityType};
use crate::components::{Buffs, Chest, Life, Player, Positioned};

/// Buff applied to beasts caught in a bestiary net.
pub const CAPTURED: &str = "capture_monster_trapped";
/// Buff shielding a betrayal target that has been dealt with.
pub const BETRAYAL_SAFE: &str = "betrayal_target_safety_aura";
/// Buff of monsters that exist but cannot be seen or attacked.
pub const HIDDEN: &str = "hidden_monster";
/// Buff of legion members frozen by the monolith.
pub const FROZEN_IN_TIME: &str = "frozen_in_time";

/// The entity's facts as seen by the state rules.
#[derive(Debug, Clone, Copy)]
pub struct StateInput {
    /// Current state.
    pub current: EntityState,
    /// Type.
    pub entity_type: EntityType,
    /// Subtype as displayed (may be `PoiMonster`).
    pub displayed: EntitySubtype,
    /// Subtype the rules originally resolved.
    pub original: EntitySubtype,
}

/// Next state of the entity.
#[must_use]
pub fn classify(input: StateInput, probe: &Probe<'_>) -> EntityState {
    let keep = input.current;
    match input.entity_type {
        EntityType::Chest => match probe.get::<Chest>() {
            Some(chest) if chest.is_opened => EntityState::Useless,
            _ => keep,
        },
        EntityType::DeliriumBomb | EntityType::DeliriumSpawner => match probe.get::<Life>() {
            Some(life) if !life.is_alive() => EntityState::Useless,
            _ => keep,
        },
        EntityType::Monster => monster(input, probe),
        _ if input.displayed == EntitySubtype::PlayerOther => match probe.get::<Player>() {
            Some(player) if is_leader(&player.name, &probe.config.classifier.leader_name) => {
                EntityState::PlayerLeader
            }
            Some(_) => EntityState::None,
            None => keep,
        },
        _ => keep,
    }
}

/// An unset leader name matches nobody, not even a player whose name read
/// back empty.
fn is_leader(name: &str, leader_name: &str) -> bool {
    !leader_name.is_empty() && name == leader_name
}

fn monster(input: StateInput, probe: &Probe<'_>) -> EntityState {
    let keep = input.current;
    let Some(life) = probe.get::<Life>() else {
        return keep;
    };
    if !life.is_alive() {
        return EntityState::Useless;
    }
    let Some(positioned) = probe.get::<Positioned>() else {
        return keep;
    };
    if positioned.is_friendly() {
        return EntityState::MonsterFriendly;
    }
    if keep == EntityState::MonsterFriendly {
        return EntityState::None;
    }

    let buffs = probe.get::<Buffs>();
    let has = |name: &str| buffs.as_ref().is_some_and(|b| b.has(name));
    let original = input.original;
    if original.is_bestiary() {
        if has(CAPTURED) { EntityState::Useless } else { keep }
    } else if original == EntitySubtype::BetrayalEnemyNpc {
        if has(BETRAYAL_SAFE) { EntityState::Useless } else { keep }
    } else if original == EntitySubtype::PinnacleBoss {
        if has(HIDDEN) { EntityState::PinnacleBossHidden } else { EntityState::None }
    } else if original.is_legion() {
        if buffs.is_none() {
            return keep;
        }
        match (has(FROZEN_IN_TIME), has(HIDDEN)) {
            (true, true) => EntityState::LegionStage0,
            (true, false) => EntityState::LegionStage1Alive,
            (false, true) => EntityState::LegionStage1Dead,
            (false, false) => EntityState::None,
        }
    } else {
        keep
    }
}
